//! Batch command for multiple credit reports.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use cibil_core::models::config::CibilConfig;
use cibil_core::models::report::CreditReportSummary;
use cibil_core::{CibilReportParser, Insights};

use super::analyze::{OutputFormat, format_summary};
use super::{is_supported, load_config, read_report_text};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Include ratios and recommendations in each output
    #[arg(long)]
    insights: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of analyzing a single file.
struct AnalyzeResult {
    path: PathBuf,
    summary: Option<CreditReportSummary>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!("{} Found {} files to analyze", style("ℹ").blue(), files.len());

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let parser = CibilReportParser::from_config(&config.extraction)?;
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = analyze_single_file(&path, &parser, &config);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(summary) => {
                results.push(AnalyzeResult {
                    path,
                    summary: Some(summary),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to analyze {}: {}", path.display(), error_msg);
                    results.push(AnalyzeResult {
                        path,
                        summary: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to analyze {}: {}", path.display(), error_msg);
                    anyhow::bail!("Analysis failed: {}", error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.summary.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            let Some(summary) = &result.summary else { continue };
            let output_name = result.path.file_stem().and_then(|s| s.to_str()).unwrap_or("report");
            let output_path = output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            let insights = args.insights.then(|| Insights::from_summary(summary));
            fs::write(&output_path, format_summary(summary, insights.as_ref(), args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!("{} Summary written to {}", style("✓").green(), summary_path.display());
    }

    println!();
    println!(
        "{} Analyzed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn analyze_single_file(
    path: &Path,
    parser: &CibilReportParser,
    config: &CibilConfig,
) -> anyhow::Result<CreditReportSummary> {
    let text = read_report_text(path, config)?;
    Ok(parser.parse(&text).summary)
}

fn write_summary(path: &Path, results: &[AnalyzeResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "score",
        "score_date",
        "total_accounts",
        "active_accounts",
        "closed_accounts",
        "card_count",
        "loan_count",
        "unclassified",
        "enquiries",
        "total_credit_limit",
        "total_outstanding_balance",
        "discrepancies",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        if let Some(summary) = &result.summary {
            let counts = &summary.counts;
            wtr.write_record([
                filename,
                "success",
                &summary.score.value.map(|v| v.to_string()).unwrap_or_default(),
                &summary.score_date.value.map(|v| v.to_string()).unwrap_or_default(),
                &counts.total_accounts.to_string(),
                &counts.active_accounts.to_string(),
                &counts.closed_accounts.to_string(),
                &counts.card_count.to_string(),
                &counts.loan_count.to_string(),
                &counts.unknown_type_count.to_string(),
                &summary.enquiry_count.value.map(|v| v.to_string()).unwrap_or_default(),
                &summary.total_credit_limit.value.map(|v| v.to_string()).unwrap_or_default(),
                &summary.total_outstanding_balance.value.map(|v| v.to_string()).unwrap_or_default(),
                &summary.discrepancies.len().to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
