//! Compiled form of [`ExtractionConfig`].

use regex::Regex;

use super::table::{FieldTable, compile_all};
use crate::error::Result;
use crate::models::config::{ExtractionConfig, ScoreRange};

/// Every pattern the extractors need, compiled once.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub table: FieldTable,
    pub score_range: ScoreRange,
    pub account_record: Regex,
    pub card: Option<Regex>,
    pub loan: Option<Regex>,
    pub active: Option<Regex>,
    pub closed: Option<Regex>,
    pub adverse: Option<Regex>,
    /// Product pattern paired with the name recorded on the account.
    pub products: Vec<(Regex, String)>,
    pub enquiry_section: Regex,
    pub enquiry_section_ends: Vec<Regex>,
    pub lookahead_lines: usize,
    pub record_window: usize,
    pub dedup_window: usize,
}

impl RuleSet {
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        config.validate()?;

        let products = config
            .product_labels
            .iter()
            .map(|label| -> Result<(Regex, String)> {
                Ok((Regex::new(&keyword_pattern(&[label.as_str()]))?, label.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            table: FieldTable::compile(config)?,
            score_range: config.score_valid_range,
            account_record: Regex::new(&config.account_record_pattern)?,
            card: keyword_regex(&config.card_keywords)?,
            loan: keyword_regex(&config.loan_keywords)?,
            active: keyword_regex(&config.active_status_keywords)?,
            closed: keyword_regex(&config.closed_status_keywords)?,
            adverse: keyword_regex(&config.adverse_status_keywords)?,
            products,
            enquiry_section: Regex::new(&config.enquiry_section_pattern)?,
            enquiry_section_ends: compile_all(&config.enquiry_section_end_patterns)?,
            lookahead_lines: config.label_lookahead_lines,
            record_window: config.record_window,
            dedup_window: config.dedup_window,
        })
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default()).expect("default extraction config compiles")
    }
}

/// Case-insensitive alternation of whole-word phrases, longest first so that
/// "credit card" wins over "card" at the same position.
fn keyword_pattern(keywords: &[&str]) -> String {
    let mut sorted: Vec<&str> = keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()).collect();
    sorted.sort_by_key(|k| std::cmp::Reverse(k.len()));

    let alternatives: Vec<String> = sorted
        .iter()
        .map(|k| {
            k.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect();

    format!(r"(?i)\b(?:{})\b", alternatives.join("|"))
}

fn keyword_regex(keywords: &[String]) -> Result<Option<Regex>> {
    let keywords: Vec<&str> = keywords.iter().map(String::as_str).filter(|k| !k.trim().is_empty()).collect();
    if keywords.is_empty() {
        return Ok(None);
    }
    Ok(Some(Regex::new(&keyword_pattern(&keywords))?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_pattern_prefers_longest() {
        let re = Regex::new(&keyword_pattern(&["card", "credit card"])).unwrap();
        assert_eq!(re.find("HDFC Credit  Card").unwrap().as_str(), "Credit  Card");
    }

    #[test]
    fn test_keyword_pattern_whole_words() {
        let re = Regex::new(&keyword_pattern(&["open"])).unwrap();
        assert!(re.is_match("Status: OPEN"));
        assert!(!re.is_match("reopened"));
    }

    #[test]
    fn test_empty_keywords_disable_rule() {
        let mut config = ExtractionConfig::default();
        config.adverse_status_keywords.clear();
        let rules = RuleSet::from_config(&config).unwrap();
        assert!(rules.adverse.is_none());
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        let mut config = ExtractionConfig::default();
        config.account_record_pattern = "(unclosed".to_string();
        assert!(RuleSet::from_config(&config).is_err());
    }
}
