//! Rule-based field extractors for CIBIL reports.

pub mod accounts;
pub mod aggregate;
pub mod amounts;
pub mod counts;
pub mod dates;
pub mod normalize;
pub mod patterns;
mod ruleset;
pub mod table;

pub use accounts::{AccountExtractor, AccountMatch};
pub use aggregate::{AggregatedAccounts, aggregate};
pub use amounts::{format_indian_amount, parse_amount, parse_indian_amount};
pub use counts::{extract_enquiry_count, parse_count};
pub use dates::{DateExtractor, parse_date};
pub use normalize::normalize;
pub use ruleset::RuleSet;
pub use table::{FieldRule, FieldTable, parse_score};

/// Trait for extractors that find every occurrence of something in text.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences, in document order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A value located in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte range in source text.
    pub position: (usize, usize),
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: (0, 0),
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = (start, end);
        self
    }
}

/// Largest char boundary at or below `index`.
pub(crate) fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Byte range of the line containing `pos`, without the newline.
pub(crate) fn line_bounds(text: &str, pos: usize) -> (usize, usize) {
    let start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[pos..].find('\n').map(|i| pos + i).unwrap_or(text.len());
    (start, end)
}

/// Drop the punctuation that separates a label from its value.
pub(crate) fn strip_separators(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '–' | '=' | '|'))
}
