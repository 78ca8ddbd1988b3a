//! Declarative field table: field name → label patterns → value parser.
//!
//! Each [`FieldRule`] locates its value with the same label-then-adjacent-token
//! heuristic. Rules share nothing and can be tested one field at a time.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use super::amounts::parse_amount;
use super::counts::parse_count;
use super::dates::parse_date;
use super::patterns::SCORE_VALUE;
use super::{line_bounds, strip_separators};
use crate::error::Result;
use crate::models::config::ExtractionConfig;
use crate::models::report::{ExtractionResult, FieldName};

/// Parses a value at the start of a string, returning it and the bytes consumed.
pub type ValueParser<T> = fn(&str) -> Option<(T, usize)>;

/// Parse a credit score candidate (3-4 digits, not yet range checked).
pub fn parse_score(s: &str) -> Option<(u16, usize)> {
    let caps = SCORE_VALUE.captures(s)?;
    let score = caps[1].parse().ok()?;
    Some((score, caps[0].len()))
}

/// A value found next to a label.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'t, T> {
    /// Byte offset of the label.
    pub label_start: usize,
    pub value: T,
    pub raw: &'t str,
}

/// How to find one field.
#[derive(Debug, Clone)]
pub struct FieldRule<T> {
    pub field: FieldName,
    /// Label patterns; occurrences of all of them are merged in document order.
    pub labels: Vec<Regex>,
    /// Label occurrences on lines containing one of these (case-insensitive) are skipped.
    pub exclusions: Vec<String>,
    pub parse: ValueParser<T>,
    /// Lines after the label line that may hold the value.
    pub lookahead_lines: usize,
    /// Lines matching one of these end the lookahead.
    pub section_breaks: Vec<Regex>,
    /// Labels of every field in the table, used to tell label lines from value lines.
    pub peer_labels: Vec<Regex>,
}

impl<T> FieldRule<T> {
    pub fn new(field: FieldName, labels: Vec<Regex>, parse: ValueParser<T>) -> Self {
        Self {
            field,
            labels,
            exclusions: Vec::new(),
            parse,
            lookahead_lines: 0,
            section_breaks: Vec::new(),
            peer_labels: Vec::new(),
        }
    }

    pub fn with_exclusions(mut self, exclusions: &[String]) -> Self {
        self.exclusions = exclusions.iter().map(|e| e.to_lowercase()).collect();
        self
    }

    pub fn with_lookahead(mut self, lines: usize) -> Self {
        self.lookahead_lines = lines;
        self
    }

    pub fn with_section_breaks(mut self, breaks: Vec<Regex>) -> Self {
        self.section_breaks = breaks;
        self
    }

    pub fn with_peer_labels(mut self, labels: Vec<Regex>) -> Self {
        self.peer_labels = labels;
        self
    }

    /// Label occurrences as byte spans, in document order.
    ///
    /// Overlapping occurrences that end at the same place ("CIBIL Score" and
    /// "Score") point at the same value and are reported once.
    pub fn label_spans(&self, text: &str) -> Vec<(usize, usize)> {
        let mut spans: Vec<(usize, usize)> = self
            .labels
            .iter()
            .flat_map(|re| re.find_iter(text).map(|m| (m.start(), m.end())))
            .filter(|&(start, _)| !self.is_excluded(text, start))
            .collect();
        spans.sort();

        let mut kept: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
        for span in spans {
            if kept.last().is_some_and(|last| span.1 <= last.1) {
                continue;
            }
            kept.push(span);
        }
        kept
    }

    fn is_excluded(&self, text: &str, pos: usize) -> bool {
        if self.exclusions.is_empty() {
            return false;
        }
        let (start, end) = line_bounds(text, pos);
        let line = text[start..end].to_lowercase();
        self.exclusions.iter().any(|e| line.contains(e.as_str()))
    }

    /// Every label occurrence whose adjacent token parses, in document order.
    pub fn candidates<'t>(&self, text: &'t str) -> Vec<Candidate<'t, T>> {
        self.label_spans(text)
            .into_iter()
            .filter_map(|(start, end)| {
                self.value_after(text, start, end).map(|(value, raw)| Candidate {
                    label_start: start,
                    value,
                    raw,
                })
            })
            .collect()
    }

    /// The value slot is the rest of the label line. When that is empty, the
    /// value sits on a following line of its own.
    ///
    /// Summaries laid out as a column of labels over a column of values are
    /// read positionally: the label's place among the label-only lines picks
    /// its place among the value lines.
    fn value_after<'t>(&self, text: &'t str, label_start: usize, label_end: usize) -> Option<(T, &'t str)> {
        let rest = &text[label_end..];
        let (line, following) = match rest.find('\n') {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => (rest, ""),
        };

        if is_placeholder(line) {
            return None;
        }
        let slot = strip_separators(line);
        if let Some((value, len)) = (self.parse)(slot) {
            return Some((value, &slot[..len]));
        }
        if !slot.trim().is_empty() {
            // Text after the label that is not a value; the value may still be below
            return self.first_value_below(following);
        }

        let (line_start, _) = line_bounds(text, label_start);
        let column = self.labels_above(&text[..line_start]);
        let mut values_seen = 0;

        for next in following
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(self.lookahead_lines)
        {
            if self.section_breaks.iter().any(|re| re.is_match(next)) {
                break;
            }
            if let Some(parsed) = self.whole_value(next) {
                if values_seen == column {
                    return parsed;
                }
                values_seen += 1;
                continue;
            }
            if values_seen > 0 {
                // The column of values ended before reaching this label's row
                break;
            }
            if self.is_label_only(next) {
                continue;
            }
            if self.starts_with_label(next) {
                // Another field with its own value; anything below belongs to it
                break;
            }
        }

        None
    }

    /// Lookahead for a label followed by unrelated text on its own line.
    fn first_value_below<'t>(&self, following: &'t str) -> Option<(T, &'t str)> {
        for next in following
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(self.lookahead_lines)
        {
            if self.section_breaks.iter().any(|re| re.is_match(next)) || self.starts_with_label(next) {
                break;
            }
            if let Some(parsed) = self.whole_value(next) {
                return parsed;
            }
        }
        None
    }

    /// A line holding nothing but a value: `Some(Some(..))` when it parses,
    /// `Some(None)` for a "-" or "NA" placeholder.
    fn whole_value<'t>(&self, line: &'t str) -> Option<Option<(T, &'t str)>> {
        if is_placeholder(line) {
            return Some(None);
        }
        let slot = strip_separators(line.trim());
        let (value, len) = (self.parse)(slot)?;
        slot[len..].trim().is_empty().then_some(Some((value, &slot[..len])))
    }

    fn starts_with_label(&self, line: &str) -> bool {
        self.label_at_start(line).is_some()
    }

    fn is_label_only(&self, line: &str) -> bool {
        self.label_at_start(line)
            .is_some_and(|rest| strip_separators(rest).trim().is_empty())
    }

    /// Text after a table label that opens `line`.
    fn label_at_start<'l>(&self, line: &'l str) -> Option<&'l str> {
        let trimmed = line.trim();
        self.peer_labels
            .iter()
            .filter_map(|re| re.find(trimmed).filter(|m| m.start() == 0))
            .max_by_key(|m| m.end())
            .map(|m| &trimmed[m.end()..])
    }

    /// Number of label-only lines directly above the label line.
    fn labels_above(&self, before: &str) -> usize {
        before
            .lines()
            .rev()
            .filter(|l| !l.trim().is_empty())
            .take_while(|l| self.is_label_only(l))
            .count()
    }

    /// First candidate in document order.
    pub fn extract(&self, text: &str) -> ExtractionResult<T> {
        match self.candidates(text).into_iter().next() {
            Some(candidate) => {
                debug!("{:?}: matched {:?} at {}", self.field, candidate.raw, candidate.label_start);
                ExtractionResult::found(self.field, candidate.value, candidate.raw)
            }
            None => {
                debug!("{:?}: no candidate", self.field);
                ExtractionResult::missing(self.field)
            }
        }
    }
}

impl<T: Copy + std::iter::Sum<T>> FieldRule<T> {
    /// Sum of every candidate, for amounts listed once per account.
    pub fn extract_sum(&self, text: &str) -> ExtractionResult<T> {
        let candidates = self.candidates(text);
        if candidates.is_empty() {
            debug!("{:?}: no candidate", self.field);
            return ExtractionResult::missing(self.field);
        }

        let total: T = candidates.iter().map(|c| c.value).sum();
        let raw = candidates.iter().map(|c| c.raw).collect::<Vec<_>>().join(" + ");
        debug!("{:?}: summed {} candidates", self.field, candidates.len());
        ExtractionResult::found(self.field, total, raw)
    }
}

/// One rule per summary field.
#[derive(Debug, Clone)]
pub struct FieldTable {
    pub score: FieldRule<u16>,
    pub score_date: FieldRule<NaiveDate>,
    pub total_accounts: FieldRule<u32>,
    pub active_accounts: FieldRule<u32>,
    pub closed_accounts: FieldRule<u32>,
    pub enquiries: FieldRule<u32>,
    pub credit_limit: FieldRule<Decimal>,
    pub outstanding_balance: FieldRule<Decimal>,
}

impl FieldTable {
    /// Compile the label tables of `config`.
    pub fn compile(config: &ExtractionConfig) -> Result<Self> {
        let breaks = compile_all(&config.section_breaks)?;
        let lookahead = config.label_lookahead_lines;
        let peers = compile_all(
            &[
                config.score_label_patterns.as_slice(),
                config.date_label_patterns.as_slice(),
                config.total_accounts_label_patterns.as_slice(),
                config.active_accounts_label_patterns.as_slice(),
                config.closed_accounts_label_patterns.as_slice(),
                config.enquiry_label_patterns.as_slice(),
                config.credit_limit_label_patterns.as_slice(),
                config.balance_label_patterns.as_slice(),
            ]
            .concat(),
        )?;

        let rule = |field, patterns: &[String]| -> Result<FieldRule<u32>> {
            Ok(FieldRule::new(field, compile_all(patterns)?, parse_count)
                .with_lookahead(lookahead)
                .with_section_breaks(breaks.clone())
                .with_peer_labels(peers.clone()))
        };

        Ok(Self {
            score: FieldRule::new(FieldName::Score, compile_all(&config.score_label_patterns)?, parse_score)
                .with_exclusions(&config.score_label_exclusions)
                .with_lookahead(lookahead)
                .with_section_breaks(breaks.clone()),
            score_date: FieldRule::new(FieldName::ScoreDate, compile_all(&config.date_label_patterns)?, parse_date)
                .with_lookahead(lookahead)
                .with_section_breaks(breaks.clone()),
            total_accounts: rule(FieldName::ReportedTotalAccounts, &config.total_accounts_label_patterns)?,
            active_accounts: rule(FieldName::ReportedActiveAccounts, &config.active_accounts_label_patterns)?,
            closed_accounts: rule(FieldName::ReportedClosedAccounts, &config.closed_accounts_label_patterns)?,
            enquiries: rule(FieldName::EnquiryCount, &config.enquiry_label_patterns)?,
            // An amount sits on the label line or the one line below it; a "-"
            // there means no value and must not pull in the next label's amount
            credit_limit: FieldRule::new(
                FieldName::TotalCreditLimit,
                compile_all(&config.credit_limit_label_patterns)?,
                parse_amount,
            )
            .with_lookahead(1),
            outstanding_balance: FieldRule::new(
                FieldName::TotalOutstandingBalance,
                compile_all(&config.balance_label_patterns)?,
                parse_amount,
            )
            .with_lookahead(1),
        })
    }
}

/// "-", "NA" and similar fillers printed where a value is absent.
fn is_placeholder(slot: &str) -> bool {
    let slot = slot.trim().trim_start_matches(':').trim();
    matches!(slot, "-" | "--" | "–") || slot.eq_ignore_ascii_case("na") || slot.eq_ignore_ascii_case("n/a")
}

pub(crate) fn compile_all(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::FieldStatus;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn table() -> FieldTable {
        FieldTable::compile(&ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn test_same_line_value() {
        let result = table().score.extract("CIBIL Score: 742 (as on today)");
        assert_eq!(result.value, Some(742));
        assert_eq!(result.raw_match.as_deref(), Some("742"));
    }

    #[test]
    fn test_value_on_following_short_line() {
        let text = "CIBIL Score\nYour score ranges from 300 to 900 and reflects history\n\n  781  \nPersonal Information";
        assert_eq!(table().score.extract(text).value, Some(781));
    }

    #[test]
    fn test_section_break_stops_lookahead() {
        let text = "CIBIL Score\nPersonal Information\n781";
        let result = table().score.extract(text);
        assert_eq!(result.status, FieldStatus::Missing);
    }

    #[test]
    fn test_excluded_label_line_is_ignored() {
        let text = "CIBIL Score Control Number: 4743\nCIBIL Score: 701";
        assert_eq!(table().score.extract(text).value, Some(701));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let text = "Total Accounts: 7\nsummary again\nTotal Accounts: 9";
        let result = table().total_accounts.extract(text);
        assert_eq!(result.value, Some(7));
    }

    #[test]
    fn test_overlapping_labels_counted_once() {
        let text = "CIBIL Score: 701";
        let spans = table().score.label_spans(text);
        assert_eq!(spans, vec![(0, 11)]);
    }

    #[test]
    fn test_missing_label() {
        let result = table().enquiries.extract("nothing to see here");
        assert!(!result.found);
        assert_eq!(result.status, FieldStatus::Missing);
        assert_eq!(result.value, None);
    }

    #[test]
    fn test_sum_over_occurrences() {
        let text = "Credit Limit\n1,50,000\nCurrent Balance 20,000\nCredit Limit: 50,000\nCredit Limit\n-\nCurrent Balance\n5,000\n";
        let t = table();
        let limit = t.credit_limit.extract_sum(text);
        assert_eq!(limit.value, Some(Decimal::from_str("200000").unwrap()));
        assert_eq!(limit.raw_match.as_deref(), Some("1,50,000 + 50,000"));
        assert_eq!(
            t.outstanding_balance.extract_sum(text).value,
            Some(Decimal::from_str("25000").unwrap())
        );
    }

    #[test]
    fn test_date_field() {
        let result = table().score_date.extract("Score: 654 as of 12/01/2024");
        assert_eq!(result.value, NaiveDate::from_ymd_opt(2024, 1, 12));
    }

    #[test]
    fn test_label_column_over_value_column() {
        let text = "Total Accounts\nActive Accounts\nClosed Accounts\n4\n3\n1\n";
        let t = table();
        assert_eq!(t.total_accounts.extract(text).value, Some(4));
        assert_eq!(t.active_accounts.extract(text).value, Some(3));
        assert_eq!(t.closed_accounts.extract(text).value, Some(1));
    }

    #[test]
    fn test_placeholder_slot_is_missing() {
        let text = "Closed Accounts: -\nAccount Information\nSr No\n1\nHDFC Bank Credit Card Active\n";
        let result = table().closed_accounts.extract(text);
        assert_eq!(result.status, FieldStatus::Missing);
        assert_eq!(result.value, None);

        let below = "Active Accounts\nNA\n2\n";
        assert!(!table().active_accounts.extract(below).found);
    }

    #[test]
    fn test_lookahead_stops_at_next_labelled_value() {
        let text = "Total Accounts\nActive Accounts: 2\n7\n";
        let t = table();
        assert!(!t.total_accounts.extract(text).found);
        assert_eq!(t.active_accounts.extract(text).value, Some(2));
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("654 as of"), Some((654, 3)));
        assert_eq!(parse_score("65"), None);
        assert_eq!(parse_score("65432"), None);
    }
}
