//! Per-account record extraction.
//!
//! A record starts at a lender name and runs until the next lender name or
//! the end of the record window, whichever comes first. Type, status and
//! product are found by keyword anywhere inside that span.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use super::counts::enquiry_table;
use super::amounts::parse_amount;
use super::dates::parse_date;
use super::{ExtractionMatch, FieldExtractor, RuleSet, floor_char_boundary, strip_separators};
use crate::models::report::{AccountStatus, AccountType};

/// One account as found in the text, before deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountMatch {
    pub bank_name: String,
    pub account_type: AccountType,
    pub status: AccountStatus,
    pub product: Option<String>,
    pub credit_limit: Option<Decimal>,
    pub outstanding_balance: Option<Decimal>,
    pub close_date: Option<NaiveDate>,
    pub adverse: bool,
}

/// Extractor for account records.
pub struct AccountExtractor<'r> {
    rules: &'r RuleSet,
}

impl<'r> AccountExtractor<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    fn classify(&self, window: &str) -> AccountType {
        let card = first_start(self.rules.card.as_ref(), window);
        let loan = first_start(self.rules.loan.as_ref(), window);
        match (card, loan) {
            (Some(c), Some(l)) if l < c => AccountType::Loan,
            (Some(_), _) => AccountType::Card,
            (None, Some(_)) => AccountType::Loan,
            (None, None) => AccountType::Unknown,
        }
    }

    /// Earliest status keyword, plus the closing date when the record prints one.
    fn status(&self, window: &str) -> (AccountStatus, Option<NaiveDate>) {
        let active = first_start(self.rules.active.as_ref(), window);

        let stated = stated_keywords(self.rules.closed.as_ref(), window);
        let closed = stated.first().map(|(start, _)| *start);
        let close_date = stated.iter().find_map(|(_, date)| *date);

        let status = match (active, closed) {
            (Some(a), Some(c)) if c < a => AccountStatus::Closed,
            (Some(_), _) => AccountStatus::Active,
            (None, Some(_)) => AccountStatus::Closed,
            (None, None) => AccountStatus::Unknown,
        };
        (status, close_date)
    }

    fn product(&self, window: &str) -> Option<String> {
        self.rules
            .products
            .iter()
            .filter_map(|(re, name)| re.find(window).map(|m| (m.start(), name)))
            .min_by_key(|(start, _)| *start)
            .map(|(_, name)| name.clone())
    }
}

impl FieldExtractor for AccountExtractor<'_> {
    type Output = ExtractionMatch<AccountMatch>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        // Lender names in the enquiry table are enquiring members, not accounts
        let enquiries = enquiry_table(text, self.rules);
        let in_enquiries = |pos: usize| enquiries.is_some_and(|t| (t.header_start..t.body_end).contains(&pos));

        let starts: Vec<_> = self
            .rules
            .account_record
            .find_iter(text)
            .filter(|m| !in_enquiries(m.start()))
            .collect();
        let mut results = Vec::with_capacity(starts.len());

        for (i, m) in starts.iter().enumerate() {
            let mut limit = floor_char_boundary(text, m.end().saturating_add(self.rules.record_window));
            if let Some(table) = enquiries.filter(|t| t.header_start >= m.end()) {
                limit = limit.min(table.header_start);
            }
            let window_end = starts.get(i + 1).map_or(limit, |next| next.start().min(limit));
            let window = &text[m.end()..window_end.max(m.end())];

            let (status, close_date) = self.status(window);
            let record = AccountMatch {
                bank_name: canonical_bank_name(m.as_str()),
                account_type: self.classify(window),
                status,
                product: self.product(window),
                credit_limit: self.rules.table.credit_limit.extract(window).value,
                outstanding_balance: self.rules.table.outstanding_balance.extract(window).value,
                close_date,
                adverse: !stated_keywords(self.rules.adverse.as_ref(), window).is_empty(),
            };

            debug!(
                "Account at {}: {} {} {}",
                m.start(),
                record.bank_name,
                record.account_type.label(),
                record.status.label()
            );
            results.push(ExtractionMatch::new(record, m.as_str()).with_position(m.start(), window_end));
        }

        results
    }
}

/// Status keyword matches that state a status rather than title a column.
///
/// "Date Closed" counts only with a date after it, which is returned too.
/// "Written-off Amount" and the like count only with a non-zero amount after them.
fn stated_keywords(re: Option<&Regex>, window: &str) -> Vec<(usize, Option<NaiveDate>)> {
    let Some(re) = re else {
        return Vec::new();
    };

    re.find_iter(window)
        .filter_map(|m| {
            let after = &window[m.end()..];
            if window[..m.start()].trim_end().to_lowercase().ends_with("date") {
                return parse_date(strip_separators(after)).map(|(date, _)| (m.start(), Some(date)));
            }
            if let Some(slot) = amount_column(after) {
                return parse_amount(slot)
                    .filter(|(amount, _)| !amount.is_zero())
                    .map(|_| (m.start(), None));
            }
            Some((m.start(), None))
        })
        .collect()
}

/// Value slot of an "Amount" column header directly after a keyword.
fn amount_column(after: &str) -> Option<&str> {
    let rest = after.trim_start();
    if !rest.get(..6).is_some_and(|w| w.eq_ignore_ascii_case("amount")) {
        return None;
    }
    let line = rest[6..].split('\n').next().unwrap_or_default();
    // "(Total)" and similar qualifiers sit between the header and its value
    let line = match line.trim_start().strip_prefix('(') {
        Some(inner) => inner.split_once(')').map_or("", |(_, value)| value),
        None => line,
    };
    Some(strip_separators(line))
}

fn first_start(re: Option<&Regex>, text: &str) -> Option<usize> {
    re.and_then(|re| re.find(text)).map(|m| m.start())
}

/// Uppercase with single spaces: "Hdfc  Bank" becomes "HDFC BANK".
pub fn canonical_bank_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}
