//! Date parsing for credit reports.
//!
//! Bureau reports print dates day-first (`12/01/2024` is 12 January).

use chrono::NaiveDate;

use super::patterns::{DATE_DAY_MONTH_NAME, DATE_DMY, DATE_YMD};
use super::{ExtractionMatch, FieldExtractor};

/// Parse a date at the start of `s`, returning it with the bytes consumed.
pub fn parse_date(s: &str) -> Option<(NaiveDate, usize)> {
    if let Some(caps) = DATE_YMD.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day).map(|d| (d, caps[0].len()));
    }

    if let Some(caps) = DATE_DMY.captures(s) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = parse_year(&caps[3]);
        return NaiveDate::from_ymd_opt(year, month, day).map(|d| (d, caps[0].len()));
    }

    if let Some(caps) = DATE_DAY_MONTH_NAME.captures(s) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_to_number(&caps[2]);
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day).map(|d| (d, caps[0].len()));
    }

    None
}

/// Finds dates that open a line, as in the enquiry table.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            let trimmed = line.trim_start();
            let start = offset + (line.len() - trimmed.len());
            if let Some((date, len)) = parse_date(trimmed) {
                results.push(ExtractionMatch::new(date, &trimmed[..len]).with_position(start, start + len));
            }
            offset += line.len();
        }

        results
    }
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: 00-50 are 2000s, 51-99 are 1900s
        if year <= 50 {
            2000 + year
        } else {
            1900 + year
        }
    } else {
        year
    }
}

fn month_to_number(month: &str) -> u32 {
    match month.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => 0,
    }
}
