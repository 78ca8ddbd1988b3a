//! Analyze command - extract the summary from a single credit report.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use cibil_core::models::report::{CreditReportSummary, ExtractionResult, FieldStatus};
use cibil_core::report::rules::format_indian_amount;
use cibil_core::{CibilReportParser, Insights};

use super::{load_config, read_report_text};

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input file (PDF, or text already extracted from one)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Include ratios and recommendations
    #[arg(long)]
    insights: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Analyzing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Reading report...");
    pb.set_position(10);
    let text = read_report_text(&args.input, &config)?;

    pb.set_message("Extracting fields...");
    pb.set_position(50);
    let parser = CibilReportParser::from_config(&config.extraction)?;
    let summary = parser.parse(&text).summary;

    pb.set_position(100);
    pb.finish_and_clear();

    let insights = args.insights.then(|| Insights::from_summary(&summary));
    let output = format_summary(&summary, insights.as_ref(), args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!("{} Output written to {}", style("✓").green(), output_path.display());
    } else {
        println!("{}", output);
    }

    for discrepancy in &summary.discrepancies {
        eprintln!("{} {}", style("⚠").yellow(), discrepancy.message);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_summary(
    summary: &CreditReportSummary,
    insights: Option<&Insights>,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let mut value = serde_json::to_value(summary)?;
            if let (Some(insights), Some(obj)) = (insights, value.as_object_mut()) {
                obj.insert("insights".to_string(), serde_json::to_value(insights)?);
            }
            Ok(serde_json::to_string_pretty(&value)?)
        }
        OutputFormat::Csv => format_csv(summary),
        OutputFormat::Text => Ok(format_text(summary, insights)),
    }
}

/// One row per account.
fn format_csv(summary: &CreditReportSummary) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "bank_name",
        "account_type",
        "status",
        "product",
        "credit_limit",
        "outstanding_balance",
        "close_date",
        "adverse",
    ])?;

    for account in &summary.accounts {
        wtr.write_record([
            account.bank_name.as_str(),
            account.account_type.label(),
            account.status.label(),
            account.product.as_deref().unwrap_or(""),
            &account.credit_limit.map(|a| a.to_string()).unwrap_or_default(),
            &account.outstanding_balance.map(|a| a.to_string()).unwrap_or_default(),
            &account.close_date.map(|d| d.to_string()).unwrap_or_default(),
            if account.adverse { "yes" } else { "no" },
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn field_text<T: ToString>(result: &ExtractionResult<T>) -> String {
    match (&result.value, result.status) {
        (Some(value), _) => value.to_string(),
        (None, FieldStatus::Implausible) => {
            format!("not found (implausible: {})", result.raw_match.as_deref().unwrap_or("?"))
        }
        (None, FieldStatus::MalformedInput) => "not found (unreadable input)".to_string(),
        (None, _) => "not found".to_string(),
    }
}

fn amount_text(result: &ExtractionResult<rust_decimal::Decimal>) -> String {
    match result.value {
        Some(amount) => format!("₹{}", format_indian_amount(amount)),
        None => field_text(result),
    }
}

fn format_text(summary: &CreditReportSummary, insights: Option<&Insights>) -> String {
    let counts = &summary.counts;
    let mut output = String::new();

    output.push_str(&format!("Score: {}\n", field_text(&summary.score)));
    output.push_str(&format!("Score date: {}\n", field_text(&summary.score_date)));
    output.push_str(&format!("Enquiries: {}\n", field_text(&summary.enquiry_count)));
    output.push_str(&format!("Credit limit: {}\n", amount_text(&summary.total_credit_limit)));
    output.push_str(&format!("Outstanding: {}\n", amount_text(&summary.total_outstanding_balance)));
    output.push('\n');

    output.push_str(&format!(
        "Accounts: {} total, {} active, {} closed\n",
        counts.total_accounts, counts.active_accounts, counts.closed_accounts
    ));
    output.push_str(&format!(
        "  {} cards, {} loans, {} unclassified\n",
        counts.card_count, counts.loan_count, counts.unknown_type_count
    ));

    for (i, account) in summary.accounts.iter().enumerate() {
        output.push_str(&format!(
            "  {}. {} - {} - {}\n",
            i + 1,
            account.bank_name,
            account.product.as_deref().unwrap_or(account.account_type.label()),
            account.status.label()
        ));
    }

    if !summary.discrepancies.is_empty() {
        output.push_str("\nDiscrepancies:\n");
        for discrepancy in &summary.discrepancies {
            output.push_str(&format!("  - {}\n", discrepancy.message));
        }
    }

    if let Some(insights) = insights {
        output.push_str("\nRatios:\n");
        for (name, value) in insights.ratios() {
            let rendered = value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string());
            output.push_str(&format!("  {}: {}\n", name, rendered));
        }
        if !insights.recommendations.is_empty() {
            output.push_str("\nRecommendations:\n");
            for recommendation in &insights.recommendations {
                output.push_str(&format!("  - {}\n", recommendation));
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> CreditReportSummary {
        CibilReportParser::new()
            .parse("CIBIL Score: 9999\nHDFC Bank Credit Card Active Credit Limit: 1,00,000\nAXIS BANK\n")
            .summary
    }

    #[test]
    fn test_csv_has_row_per_account() {
        let csv = format_summary(&summary(), None, OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "HDFC BANK,Card,Active,Credit Card,100000,,,no");
        assert_eq!(lines[2], "AXIS BANK,Unknown,Unknown,,,,,no");
    }

    #[test]
    fn test_text_explains_unfound_fields() {
        let text = format_summary(&summary(), None, OutputFormat::Text).unwrap();
        assert!(text.contains("Score: not found (implausible: 9999)"));
        assert!(text.contains("Credit limit: ₹1,00,000.00"));
        assert!(text.contains("1 cards, 0 loans, 1 unclassified"));
    }

    #[test]
    fn test_json_with_insights() {
        let s = summary();
        let insights = Insights::from_summary(&s);
        let json = format_summary(&s, Some(&insights), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["score"]["status"], "implausible");
        assert!(value["insights"].is_object());
    }
}
