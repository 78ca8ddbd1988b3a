//! Plain-text rendering of a summary for the advisory prompt.

use std::fmt::Display;
use std::fmt::Write;

use rust_decimal::Decimal;

use super::insights::Insights;
use super::rules::format_indian_amount;
use crate::models::report::{AccountStatus, CreditReportSummary, ExtractionResult};

const NOT_AVAILABLE: &str = "N/A";

impl CreditReportSummary {
    /// Key/value fragment describing this report.
    pub fn to_prompt_context(&self, insights: &Insights) -> String {
        prompt_context(self, insights)
    }
}

/// Render the summary, its accounts and ratios as "Key: value" lines.
pub fn prompt_context(summary: &CreditReportSummary, insights: &Insights) -> String {
    let counts = &summary.counts;
    let mut out = String::from("Key metrics & ratios (CIBIL):\n");

    line(&mut out, "Score", field(&summary.score));
    line(&mut out, "Score Date", field(&summary.score_date));
    line(&mut out, "Total Accounts", counts.total_accounts);
    line(&mut out, "Active Accounts", counts.active_accounts);
    line(&mut out, "Closed Accounts", counts.closed_accounts);
    line(&mut out, "Credit Cards", counts.card_count);
    line(&mut out, "Loans", counts.loan_count);
    if counts.unknown_type_count > 0 {
        line(&mut out, "Unclassified Accounts", counts.unknown_type_count);
    }
    line(&mut out, "Recent Enquiries", field(&summary.enquiry_count));
    line(&mut out, "Total Credit Limit", amount(&summary.total_credit_limit));
    line(&mut out, "Total Outstanding Balance", amount(&summary.total_outstanding_balance));
    line(&mut out, "Written-off/Settled Count", counts.adverse_count);

    if !summary.accounts.is_empty() {
        out.push_str("\nDetailed Account Information:\n");
        for (i, account) in summary.accounts.iter().enumerate() {
            let _ = write!(
                out,
                "  {}. {} - {} - Status: {}",
                i + 1,
                account.bank_name,
                account.product.as_deref().unwrap_or(account.account_type.label()),
                account.status.label()
            );
            if account.status == AccountStatus::Closed {
                let closed = account
                    .close_date
                    .map(|d| d.format("%d/%m/%Y").to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                let _ = write!(out, " (Closed: {})", closed);
            }
            out.push('\n');
        }
    }

    out.push_str("\nRatios:\n");
    for (name, value) in insights.ratios() {
        let rendered = match value {
            Some(v) if name != "Enquiry Intensity (12m)" => percent(v),
            Some(v) => v.normalize().to_string(),
            None => NOT_AVAILABLE.to_string(),
        };
        line(&mut out, name, rendered);
    }

    out
}

/// Prompt sent to the advisory API: report context followed by the question.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Use the following credit report context to answer.\n\n{}\nQuestion: {}",
        context.trim_end(),
        question.trim()
    )
}

fn line(out: &mut String, key: &str, value: impl Display) {
    let _ = writeln!(out, "{}: {}", key, value);
}

fn field<T: Display>(result: &ExtractionResult<T>) -> String {
    result
        .value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn amount(result: &ExtractionResult<Decimal>) -> String {
    result
        .value
        .map(format_indian_amount)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn percent(ratio: Decimal) -> String {
    format!("{}%", (ratio * Decimal::ONE_HUNDRED).round_dp(1).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CibilReportParser;

    #[test]
    fn test_context_lists_fields_and_accounts() {
        let text = "CIBIL Score: 742\nHDFC Bank Credit Card Active Credit Limit: 50,000 Current Balance: 20,000\n\
                    CREDILA Education Loan Closed Date Closed: 10/05/2022\n";
        let summary = CibilReportParser::new().parse(text).summary;
        let insights = Insights::from_summary(&summary);
        let context = summary.to_prompt_context(&insights);

        assert!(context.contains("Score: 742\n"));
        assert!(context.contains("Score Date: N/A\n"));
        assert!(context.contains("Total Credit Limit: 50,000.00\n"));
        assert!(context.contains("1. HDFC BANK - Credit Card - Status: Active\n"));
        assert!(context.contains("2. CREDILA - Education Loan - Status: Closed (Closed: 10/05/2022)\n"));
        assert!(context.contains("Utilization: 40%\n"));
        assert!(context.contains("Score/900: 82.4%\n"));
        assert!(context.contains("Enquiry Intensity (12m): N/A\n"));
    }

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt("Score: 700\n", "  How do I improve? ");
        assert!(prompt.ends_with("Score: 700\nQuestion: How do I improve?"));
    }
}
