//! Fixed value patterns shared by the field parsers.
//!
//! Label patterns are configurable and live in [`RuleSet`](super::RuleSet);
//! the shapes of the values themselves are not.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Credit score: 3-4 digits, range checked later
    pub static ref SCORE_VALUE: Regex = Regex::new(r"^(\d{3,4})\b").unwrap();

    // Account and enquiry counts
    pub static ref COUNT_VALUE: Regex = Regex::new(r"^(\d{1,4})\b").unwrap();

    // Day-first dates: 12/01/2024, 12-01-2024, 12.01.24
    pub static ref DATE_DMY: Regex = Regex::new(
        r"^(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"^(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    // 12 Jan 2024, 12-Jan-2024, 12 January, 2024
    pub static ref DATE_DAY_MONTH_NAME: Regex = Regex::new(
        r"(?i)^(\d{1,2})[\s\-]+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?[\s\-,]+(\d{4})\b"
    ).unwrap();

    // Indian (1,50,000) or international (150,000.50) grouping, optional currency prefix
    pub static ref AMOUNT_VALUE: Regex = Regex::new(
        r"(?i)^(?:(?:rs\.?|inr|₹)\s*)?(\d{1,3}(?:,\d{2,3})+(?:\.\d+)?|\d+(?:\.\d+)?)\b"
    ).unwrap();
}
