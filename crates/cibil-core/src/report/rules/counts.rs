//! Summary counts: accounts and enquiries.

use tracing::debug;

use super::patterns::COUNT_VALUE;
use super::{DateExtractor, FieldExtractor, RuleSet};
use crate::models::report::{ExtractionResult, FieldName};

/// Parse a count (1-4 digits) at the start of `s`.
pub fn parse_count(s: &str) -> Option<(u32, usize)> {
    let caps = COUNT_VALUE.captures(s)?;
    let count = caps[1].parse().ok()?;
    Some((count, caps[0].len()))
}

/// Byte ranges of the enquiry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnquiryTable {
    /// Start of the header line match.
    pub header_start: usize,
    /// First byte after the header line.
    pub body_start: usize,
    /// Start of the line that ends the table, or the end of the text.
    pub body_end: usize,
}

/// Locate the enquiry table below its "Date of Enquiry" header.
pub fn enquiry_table(text: &str, rules: &RuleSet) -> Option<EnquiryTable> {
    let header = rules.enquiry_section.find(text)?;

    // The header line may carry other column titles; rows start below it
    let body_start = text[header.end()..]
        .find('\n')
        .map(|i| header.end() + i + 1)
        .unwrap_or(text.len());

    let mut body_end = text.len();
    let mut offset = body_start;
    for line in text[body_start..].split_inclusive('\n') {
        let ends_table = rules
            .enquiry_section_ends
            .iter()
            .chain(rules.table.enquiries.section_breaks.iter())
            .any(|re| re.is_match(line));
        if ends_table {
            body_end = offset;
            break;
        }
        offset += line.len();
    }

    Some(EnquiryTable {
        header_start: header.start(),
        body_start,
        body_end,
    })
}

/// Number of credit enquiries.
///
/// Uses an explicit "Total Enquiries" style label when the report has one,
/// otherwise counts the dates listed under the enquiry table header.
pub fn extract_enquiry_count(text: &str, rules: &RuleSet) -> ExtractionResult<u32> {
    let explicit = rules.table.enquiries.extract(text);
    if explicit.found {
        return explicit;
    }

    let Some(table) = enquiry_table(text, rules) else {
        return explicit;
    };

    let dates = DateExtractor::new().extract_all(&text[table.body_start..table.body_end]);
    debug!("EnquiryCount: {} dated rows under the enquiry header", dates.len());

    if dates.is_empty() {
        return explicit;
    }

    let raw = dates
        .iter()
        .map(|d| d.source.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    ExtractionResult::found(FieldName::EnquiryCount, dates.len() as u32, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::FieldStatus;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12 accounts"), Some((12, 2)));
        assert_eq!(parse_count("x12"), None);
        assert_eq!(parse_count("123456"), None);
    }

    #[test]
    fn test_explicit_enquiry_count() {
        let rules = RuleSet::default();
        let result = extract_enquiry_count("Total Enquiries: 3\nDate of Enquiry\n01/01/2024", &rules);
        assert_eq!(result.value, Some(3));
    }

    #[test]
    fn test_enquiry_dates_counted_under_header() {
        let rules = RuleSet::default();
        let text = "Enquiry Information\nDate of Enquiry   Member\n03/02/2024\nHDFC BANK\n14/11/2023\n01/08/2023\nEnquiry Purpose\n01/01/2020";
        let result = extract_enquiry_count(text, &rules);
        assert_eq!(result.value, Some(3));
        assert_eq!(result.raw_match.as_deref(), Some("03/02/2024, 14/11/2023, 01/08/2023"));
    }

    #[test]
    fn test_enquiry_table_bounds() {
        let rules = RuleSet::default();
        let text = "intro\nDate of Enquiry\n03/02/2024\nEnquiry Purpose\n";
        let table = enquiry_table(text, &rules).unwrap();
        assert_eq!(table.header_start, 6);
        assert_eq!(&text[table.body_start..table.body_end], "03/02/2024\n");
    }

    #[test]
    fn test_enquiry_table_stops_at_section_break() {
        let rules = RuleSet::default();
        let text = "Date of Enquiry\n03/02/2024\nPersonal Information\n01/01/1990\n";
        assert_eq!(extract_enquiry_count(text, &rules).value, Some(1));
    }

    #[test]
    fn test_no_enquiry_section() {
        let rules = RuleSet::default();
        let result = extract_enquiry_count("no enquiries listed", &rules);
        assert_eq!(result.status, FieldStatus::Missing);
    }

    #[test]
    fn test_enquiry_header_without_dates() {
        let rules = RuleSet::default();
        let result = extract_enquiry_count("Date of Enquiry\nnone\n", &rules);
        assert!(!result.found);
    }
}
