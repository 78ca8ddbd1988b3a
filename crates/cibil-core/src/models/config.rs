//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{CibilError, Result};

/// Main configuration for the cibil pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CibilConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Advisory API configuration (used by the CLI only).
    pub advisory: AdvisoryConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum text length to consider the text layer usable.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            min_text_length: 50,
        }
    }
}

/// Inclusive range of plausible credit scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: u16,
    pub max: u16,
}

impl ScoreRange {
    pub fn contains(&self, score: u16) -> bool {
        (self.min..=self.max).contains(&score)
    }
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self { min: 300, max: 900 }
    }
}

/// Label tables, keyword sets and window sizes for field extraction.
///
/// Every pattern is a regular expression in `regex` crate syntax. Keywords are
/// plain phrases matched case-insensitively on word boundaries, with any run
/// of whitespace accepted between words.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Labels preceding the credit score.
    pub score_label_patterns: Vec<String>,

    /// Score labels on lines containing one of these phrases are ignored.
    pub score_label_exclusions: Vec<String>,

    /// Labels preceding the score date.
    pub date_label_patterns: Vec<String>,

    /// Labels preceding the reported number of accounts.
    pub total_accounts_label_patterns: Vec<String>,

    /// Labels preceding the reported number of active accounts.
    pub active_accounts_label_patterns: Vec<String>,

    /// Labels preceding the reported number of closed accounts.
    pub closed_accounts_label_patterns: Vec<String>,

    /// Labels preceding an explicit enquiry count.
    pub enquiry_label_patterns: Vec<String>,

    /// Header of the enquiry table used when no explicit count is present.
    pub enquiry_section_pattern: String,

    /// Lines matching one of these end the enquiry table.
    pub enquiry_section_end_patterns: Vec<String>,

    /// Labels preceding a credit limit amount.
    pub credit_limit_label_patterns: Vec<String>,

    /// Labels preceding an outstanding balance amount.
    pub balance_label_patterns: Vec<String>,

    /// Pattern marking the start of an account record (the lender name).
    pub account_record_pattern: String,

    /// Vocabulary classifying an account as a card.
    pub card_keywords: Vec<String>,

    /// Vocabulary classifying an account as a loan.
    pub loan_keywords: Vec<String>,

    /// Vocabulary marking an account as active.
    pub active_status_keywords: Vec<String>,

    /// Vocabulary marking an account as closed.
    pub closed_status_keywords: Vec<String>,

    /// Closed-status keywords that also flag the account as adverse.
    pub adverse_status_keywords: Vec<String>,

    /// Product names recorded verbatim on the account.
    pub product_labels: Vec<String>,

    /// Lines matching one of these stop the search for a label's value.
    pub section_breaks: Vec<String>,

    /// How many lines after a label may hold its value.
    pub label_lookahead_lines: usize,

    /// Maximum bytes after a lender name that belong to its record.
    pub record_window: usize,

    /// Two matches of the same lender and type closer than this many bytes
    /// are one account.
    pub dedup_window: usize,

    /// Plausible credit score range.
    pub score_valid_range: ScoreRange,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            score_label_patterns: strings(&[r"(?i)CIBIL\s*Score", r"(?i)\bScore\b"]),
            score_label_exclusions: strings(&["Control Number"]),
            date_label_patterns: strings(&[
                r"(?i)Score\s*Date",
                r"(?i)\bas\s+(?:of|on)\b",
                r"(?i)\bDate\s*[:\-]",
            ]),
            total_accounts_label_patterns: strings(&[
                r"(?i)Total\s+Accounts?\b",
                r"(?i)\bAccounts?\s*:\s*Total\b",
            ]),
            active_accounts_label_patterns: strings(&[
                r"(?i)\bActive\s+Accounts?\b",
                r"(?i)\bOpen\s+Accounts?\b",
            ]),
            closed_accounts_label_patterns: strings(&[r"(?i)\bClosed\s+Accounts?\b"]),
            enquiry_label_patterns: strings(&[
                r"(?i)\b(?:Total|Number\s+of)\s+Enquir(?:y|ies)\b",
            ]),
            enquiry_section_pattern: r"(?i)Date\s+of\s+Enquiry".to_string(),
            enquiry_section_end_patterns: strings(&[
                r"(?i)Enquiry\s+Purpose",
                r"(?i)Credit\s+Report",
            ]),
            credit_limit_label_patterns: strings(&[
                r"(?i)Credit\s*Limit",
                r"(?i)Sanctioned\s*Amount",
            ]),
            balance_label_patterns: strings(&[
                r"(?i)Current\s*Balance",
                r"(?i)\bOutstanding(?:\s*Balance)?\b",
            ]),
            account_record_pattern: concat!(
                r"(?i)\b(?:CITIBANK|HDFC\s*BANK|CREDILA|KOTAK(?:\s+MAHINDRA)?\s*BANK|",
                r"ICICI\s*BANK|SBI|STATE\s+BANK\s+OF\s+INDIA|AXIS\s*BANK|STANDARD\s+CHARTERED|",
                r"AMERICAN\s+EXPRESS|YES\s*BANK|INDUSIND\s*BANK|BAJAJ(?:\s+FINANCE)?|",
                r"TATA\s+CAPITAL|HSBC)\b"
            )
            .to_string(),
            card_keywords: strings(&["credit card", "card"]),
            loan_keywords: strings(&["loan", "emi", "overdraft"]),
            active_status_keywords: strings(&["active", "open"]),
            closed_status_keywords: strings(&["closed", "settled", "written off", "written-off"]),
            adverse_status_keywords: strings(&["settled", "written off", "written-off"]),
            product_labels: strings(&[
                "Credit Card",
                "Education Loan",
                "Personal Loan",
                "Home Loan",
                "Auto Loan",
                "Two Wheeler Loan",
                "Business Loan",
                "Gold Loan",
                "Consumer Loan",
            ]),
            section_breaks: strings(&[r"(?i)Personal\s+Information"]),
            label_lookahead_lines: 15,
            record_window: 800,
            dedup_window: 250,
            score_valid_range: ScoreRange::default(),
        }
    }
}

impl ExtractionConfig {
    /// Reject settings that cannot produce a working rule set.
    pub fn validate(&self) -> Result<()> {
        if self.score_valid_range.min > self.score_valid_range.max {
            return Err(CibilError::Config(format!(
                "score_valid_range is empty: {}..={}",
                self.score_valid_range.min, self.score_valid_range.max
            )));
        }
        if self.account_record_pattern.trim().is_empty() {
            return Err(CibilError::Config(
                "account_record_pattern must not be empty".to_string(),
            ));
        }
        if self.record_window == 0 {
            return Err(CibilError::Config("record_window must be positive".to_string()));
        }
        Ok(())
    }
}

/// Settings for the external advisory API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// OpenAI-compatible chat completions endpoint.
    pub endpoint: String,

    /// Model name sent with each request.
    pub model: String,

    /// System instruction preceding the report context.
    pub system_prompt: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Upper bound on the answer length.
    pub max_tokens: u32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            system_prompt: "You are a credit analyst. Be concise, numeric where possible, and actionable."
                .to_string(),
            temperature: 0.2,
            max_tokens: 500,
            timeout_secs: 60,
        }
    }
}

impl CibilConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.extraction.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: CibilConfig =
            serde_json::from_str(r#"{"extraction": {"dedup_window": 40}}"#).unwrap();
        assert_eq!(config.extraction.dedup_window, 40);
        assert_eq!(config.extraction.score_valid_range, ScoreRange { min: 300, max: 900 });
        assert_eq!(config.advisory.model, "gpt-4o-mini");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = CibilConfig::default();
        config.extraction.label_lookahead_lines = 3;
        config.save(&path).unwrap();

        let loaded = CibilConfig::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.label_lookahead_lines, 3);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = ExtractionConfig::default();
        config.score_valid_range = ScoreRange { min: 900, max: 300 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_score_range_is_inclusive() {
        let range = ScoreRange::default();
        assert!(range.contains(300));
        assert!(range.contains(900));
        assert!(!range.contains(299));
        assert!(!range.contains(901));
    }
}
