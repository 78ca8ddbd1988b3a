//! Credit report parser assembling every field into one summary.

use std::time::Instant;

use tracing::{debug, info};

use crate::error::Result;
use crate::models::config::ExtractionConfig;
use crate::models::report::*;

use super::ReportExtractor;
use super::rules::{AccountExtractor, FieldExtractor, RuleSet, aggregate, extract_enquiry_count, normalize};

/// Share of unreadable characters above which input is not treated as text.
const MAX_GARBAGE_RATIO: f64 = 0.3;

/// Result of parsing one report.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    /// Extracted summary.
    pub summary: CreditReportSummary,
    /// Text after score normalization.
    pub normalized_text: String,
}

/// Rule-based parser for CIBIL credit reports.
#[derive(Debug, Clone, Default)]
pub struct CibilReportParser {
    rules: RuleSet,
}

impl CibilReportParser {
    /// Create a parser with the default label tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser from extraction settings.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self::with_rules(RuleSet::from_config(config)?))
    }

    pub fn with_rules(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Parse the text layer of a report.
    pub fn parse(&self, text: &str) -> ReportOutcome {
        // wasm32-unknown-unknown has no clock; time is reported as 0 there
        let start = (!cfg!(target_arch = "wasm32")).then(Instant::now);
        let input_chars = text.chars().count();

        info!("Parsing credit report from {} characters of text", input_chars);

        if is_malformed(text) {
            info!("Input is empty or unreadable, no fields extracted");
            let mut summary = CreditReportSummary::malformed();
            summary.metadata.input_chars = input_chars;
            summary.metadata.warnings.push("Input is empty or unreadable".to_string());
            summary.metadata.processing_time_ms = elapsed_ms(start);
            return ReportOutcome {
                summary,
                normalized_text: text.to_string(),
            };
        }

        let normalized = normalize(text, &self.rules);
        let normalized_changed = normalized != text;
        if normalized_changed {
            debug!("Normalization repaired the score slot");
        }

        let mut warnings = Vec::new();
        let table = &self.rules.table;

        // Plausibility gate
        let mut score = table.score.extract(&normalized);
        if let Some(value) = score.value {
            if !self.rules.score_range.contains(value) {
                debug!("Score {} outside {:?}", value, self.rules.score_range);
                warnings.push(format!(
                    "Score {} is outside the valid range {}-{}",
                    value, self.rules.score_range.min, self.rules.score_range.max
                ));
                score = score.into_implausible();
            }
        }

        let reported_total_accounts = table.total_accounts.extract(&normalized);
        let reported_active_accounts = table.active_accounts.extract(&normalized);
        let reported_closed_accounts = table.closed_accounts.extract(&normalized);

        let matches = AccountExtractor::new(&self.rules).extract_all(&normalized);
        let aggregated = aggregate(matches, self.rules.dedup_window);
        let mut counts = aggregated.counts;
        let discrepancies = reconcile(
            &mut counts,
            reported_total_accounts.value,
            reported_active_accounts.value,
            reported_closed_accounts.value,
        );

        let mut summary = CreditReportSummary {
            score,
            score_date: table.score_date.extract(&normalized),
            reported_total_accounts,
            reported_active_accounts,
            reported_closed_accounts,
            enquiry_count: extract_enquiry_count(&normalized, &self.rules),
            total_credit_limit: table.credit_limit.extract_sum(&normalized),
            total_outstanding_balance: table.outstanding_balance.extract_sum(&normalized),
            accounts: aggregated.records,
            counts,
            discrepancies,
            metadata: ExtractionMetadata::default(),
        };

        let missing_fields = summary.missing_fields();
        for field in &missing_fields {
            warnings.push(format!("Could not extract {}", field.label()));
        }

        summary.metadata = ExtractionMetadata {
            processing_time_ms: elapsed_ms(start),
            input_chars,
            normalized_changed,
            missing_fields,
            warnings,
        };

        info!(
            "Extracted {} accounts, {} fields missing, {} discrepancies",
            summary.accounts.len(),
            summary.metadata.missing_fields.len(),
            summary.discrepancies.len()
        );

        ReportOutcome {
            summary,
            normalized_text: normalized,
        }
    }
}

impl ReportExtractor for CibilReportParser {
    fn extract_from_text(&self, text: &str) -> CreditReportSummary {
        self.parse(text).summary
    }
}

fn elapsed_ms(start: Option<Instant>) -> u64 {
    start.map_or(0, |s| s.elapsed().as_millis() as u64)
}

/// Blank input, or input where more than 30% of the visible characters are
/// control characters or replacement characters.
pub fn is_malformed(text: &str) -> bool {
    let mut visible = 0usize;
    let mut garbage = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        visible += 1;
        if c.is_control() || c == char::REPLACEMENT_CHARACTER {
            garbage += 1;
        }
    }
    visible == 0 || garbage as f64 > visible as f64 * MAX_GARBAGE_RATIO
}

/// Resolve totals and record every disagreement between reported and
/// derived figures.
///
/// Reported totals take precedence over counts derived from records.
fn reconcile(
    counts: &mut AccountCounts,
    reported_total: Option<u32>,
    reported_active: Option<u32>,
    reported_closed: Option<u32>,
) -> Vec<Discrepancy> {
    let mut discrepancies = Vec::new();
    let extracted = counts.extracted_accounts;

    if let Some(total) = reported_total {
        counts.total_accounts = total;
        if total != extracted {
            discrepancies.push(Discrepancy {
                kind: DiscrepancyKind::TotalVsExtracted,
                reported: total,
                extracted,
                message: format!("Report lists {} accounts but {} were extracted", total, extracted),
            });
        }
    }
    if let Some(active) = reported_active {
        counts.active_accounts = active;
    }
    if let Some(closed) = reported_closed {
        counts.closed_accounts = closed;
    }

    let split = counts.active_accounts + counts.closed_accounts;
    if split != counts.total_accounts {
        discrepancies.push(Discrepancy {
            kind: DiscrepancyKind::ActiveClosedVsTotal,
            reported: counts.total_accounts,
            extracted: split,
            message: format!(
                "{} active + {} closed does not match {} total accounts",
                counts.active_accounts, counts.closed_accounts, counts.total_accounts
            ),
        });
    }

    if counts.unknown_type_count > 0 {
        discrepancies.push(Discrepancy {
            kind: DiscrepancyKind::UnclassifiedAccounts,
            reported: extracted,
            extracted: counts.card_count + counts.loan_count,
            message: format!(
                "{} of {} accounts are neither card nor loan",
                counts.unknown_type_count, extracted
            ),
        });
    }

    discrepancies
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_malformed_detection() {
        assert!(is_malformed(""));
        assert!(is_malformed(" \n\t "));
        assert!(is_malformed("\u{FFFD}\u{FFFD}\u{FFFD}ab"));
        assert!(!is_malformed("Score: 742"));
        assert!(!is_malformed("Score: 742 \u{FFFD}"));
    }

    #[test]
    fn test_parse_basic_report() {
        let text = "CIBIL Score: 742\nScore Date: 01/03/2024\nTotal Accounts: 2\n\
                    HDFC Bank Credit Card Active Credit Limit: 50,000 Current Balance: 5,000\n\
                    CREDILA Education Loan Closed\n";
        let outcome = CibilReportParser::new().parse(text);
        let summary = outcome.summary;

        assert_eq!(summary.score.value, Some(742));
        assert_eq!(summary.score_date.value, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(summary.reported_total_accounts.value, Some(2));
        assert_eq!(summary.accounts.len(), 2);
        assert_eq!(summary.counts.card_count, 1);
        assert_eq!(summary.counts.loan_count, 1);
        assert_eq!(summary.counts.active_accounts, 1);
        assert_eq!(summary.counts.closed_accounts, 1);
        assert!(summary.discrepancies.is_empty());
        assert!(!summary.metadata.normalized_changed);
        assert_eq!(outcome.normalized_text, text);
    }

    #[test]
    fn test_implausible_score_gated() {
        let summary = CibilReportParser::new().extract_from_text("CIBIL Score: 1200");
        assert_eq!(summary.score.status, FieldStatus::Implausible);
        assert!(!summary.score.found);
        assert_eq!(summary.score.value, None);
        assert_eq!(summary.score.raw_match.as_deref(), Some("1200"));
        assert!(summary.metadata.warnings.iter().any(|w| w.contains("1200")));
    }

    #[test]
    fn test_reported_total_wins_and_is_flagged() {
        let text = "Total Accounts: 3\nHDFC Bank Credit Card Active\n";
        let summary = CibilReportParser::new().extract_from_text(text);
        assert_eq!(summary.counts.total_accounts, 3);
        assert_eq!(summary.counts.extracted_accounts, 1);
        assert_eq!(summary.discrepancies[0].kind, DiscrepancyKind::TotalVsExtracted);
        assert_eq!(summary.discrepancies[0].reported, 3);
        assert_eq!(summary.discrepancies[0].extracted, 1);
    }

    #[test]
    fn test_reconcile_consistent_counts() {
        let mut counts = AccountCounts {
            total_accounts: 2,
            active_accounts: 1,
            closed_accounts: 1,
            extracted_accounts: 2,
            card_count: 2,
            ..AccountCounts::default()
        };
        assert!(reconcile(&mut counts, None, None, None).is_empty());
    }

    #[test]
    fn test_reconcile_unknown_status_flagged() {
        let mut counts = AccountCounts {
            total_accounts: 2,
            active_accounts: 1,
            extracted_accounts: 2,
            card_count: 2,
            unknown_status_count: 1,
            ..AccountCounts::default()
        };
        let discrepancies = reconcile(&mut counts, None, None, None);
        assert_eq!(discrepancies.len(), 1);
        assert_eq!(discrepancies[0].kind, DiscrepancyKind::ActiveClosedVsTotal);
    }

    #[test]
    fn test_custom_config() {
        let mut config = ExtractionConfig::default();
        config.score_label_patterns = vec![r"(?i)Bureau\s+Score".to_string()];
        let parser = CibilReportParser::from_config(&config).unwrap();
        assert_eq!(parser.extract_from_text("Bureau Score 688").score.value, Some(688));
        assert!(!parser.extract_from_text("CIBIL Score 688").score.found);
    }
}
