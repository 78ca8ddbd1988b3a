//! Credit report data model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Every field the extractors can report on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Score,
    ScoreDate,
    ReportedTotalAccounts,
    ReportedActiveAccounts,
    ReportedClosedAccounts,
    EnquiryCount,
    TotalCreditLimit,
    TotalOutstandingBalance,
}

impl FieldName {
    pub const ALL: [FieldName; 8] = [
        FieldName::Score,
        FieldName::ScoreDate,
        FieldName::ReportedTotalAccounts,
        FieldName::ReportedActiveAccounts,
        FieldName::ReportedClosedAccounts,
        FieldName::EnquiryCount,
        FieldName::TotalCreditLimit,
        FieldName::TotalOutstandingBalance,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FieldName::Score => "Score",
            FieldName::ScoreDate => "Score Date",
            FieldName::ReportedTotalAccounts => "Total Accounts",
            FieldName::ReportedActiveAccounts => "Active Accounts",
            FieldName::ReportedClosedAccounts => "Closed Accounts",
            FieldName::EnquiryCount => "Recent Enquiries",
            FieldName::TotalCreditLimit => "Total Credit Limit",
            FieldName::TotalOutstandingBalance => "Total Outstanding Balance",
        }
    }
}

/// Why a field does or does not carry a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    /// Label located and value parsed.
    Found,
    /// Label absent or the adjacent token did not parse.
    Missing,
    /// Value parsed but failed the plausibility gate.
    Implausible,
    /// The whole input was empty or not text.
    MalformedInput,
}

/// Outcome of looking up one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult<T> {
    /// Which field this is.
    pub field: FieldName,

    /// Source text the value was parsed from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_match: Option<String>,

    /// Parsed value; present only when `found`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,

    /// Whether a usable value was extracted.
    pub found: bool,

    /// Detailed status.
    pub status: FieldStatus,
}

impl<T> ExtractionResult<T> {
    pub fn found(field: FieldName, value: T, raw_match: impl Into<String>) -> Self {
        Self {
            field,
            raw_match: Some(raw_match.into()),
            value: Some(value),
            found: true,
            status: FieldStatus::Found,
        }
    }

    pub fn missing(field: FieldName) -> Self {
        Self::not_found(field, FieldStatus::Missing, None)
    }

    pub fn malformed(field: FieldName) -> Self {
        Self::not_found(field, FieldStatus::MalformedInput, None)
    }

    /// Demote a parsed value that failed a sanity check, keeping the raw text.
    pub fn into_implausible(self) -> Self {
        let raw_match = self.raw_match;
        Self::not_found(self.field, FieldStatus::Implausible, raw_match)
    }

    fn not_found(field: FieldName, status: FieldStatus, raw_match: Option<String>) -> Self {
        Self {
            field,
            raw_match,
            value: None,
            found: false,
            status,
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

/// Kind of credit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Card,
    Loan,
    Unknown,
}

impl AccountType {
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Card => "Card",
            AccountType::Loan => "Loan",
            AccountType::Unknown => "Unknown",
        }
    }
}

/// Whether a credit line is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Closed,
    Unknown,
}

impl AccountStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AccountStatus::Active => "Active",
            AccountStatus::Closed => "Closed",
            AccountStatus::Unknown => "Unknown",
        }
    }
}

/// One credit line listed in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Lender name, uppercased with single spaces.
    pub bank_name: String,

    pub account_type: AccountType,

    pub status: AccountStatus,

    /// Product phrase as printed, e.g. "Education Loan".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_limit: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub outstanding_balance: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_date: Option<NaiveDate>,

    /// Settled or written off.
    #[serde(default)]
    pub adverse: bool,

    /// Byte offset of the lender name in the normalized text.
    pub position: usize,
}

/// Account totals after deduplication and reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCounts {
    /// Reported total when present, otherwise `extracted_accounts`.
    pub total_accounts: u32,
    /// Reported active count when present, otherwise counted from records.
    pub active_accounts: u32,
    /// Reported closed count when present, otherwise counted from records.
    pub closed_accounts: u32,
    /// Number of deduplicated account records.
    pub extracted_accounts: u32,
    pub card_count: u32,
    pub loan_count: u32,
    /// Records matching neither card nor loan vocabulary.
    pub unknown_type_count: u32,
    pub unknown_status_count: u32,
    pub adverse_count: u32,
}

/// What kind of disagreement was found between reported and derived totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    /// Reported total differs from the number of extracted records.
    TotalVsExtracted,
    /// Reported active + closed differs from the reported total.
    ActiveClosedVsTotal,
    /// Some records are neither card nor loan.
    UnclassifiedAccounts,
}

/// A disagreement surfaced instead of silently resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    pub reported: u32,
    pub extracted: u32,
    pub message: String,
}

/// Metadata about the extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Length of the raw input in characters.
    pub input_chars: usize,

    /// Whether normalization changed the text.
    pub normalized_changed: bool,

    /// Fields that carry no value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<FieldName>,

    /// Warnings or issues encountered during extraction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Everything extracted from one report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditReportSummary {
    pub score: ExtractionResult<u16>,
    pub score_date: ExtractionResult<NaiveDate>,
    pub reported_total_accounts: ExtractionResult<u32>,
    pub reported_active_accounts: ExtractionResult<u32>,
    pub reported_closed_accounts: ExtractionResult<u32>,
    pub enquiry_count: ExtractionResult<u32>,
    pub total_credit_limit: ExtractionResult<Decimal>,
    pub total_outstanding_balance: ExtractionResult<Decimal>,
    pub accounts: Vec<AccountRecord>,
    pub counts: AccountCounts,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discrepancies: Vec<Discrepancy>,
    pub metadata: ExtractionMetadata,
}

impl CreditReportSummary {
    /// Summary for input that could not be read at all.
    pub fn malformed() -> Self {
        Self {
            score: ExtractionResult::malformed(FieldName::Score),
            score_date: ExtractionResult::malformed(FieldName::ScoreDate),
            reported_total_accounts: ExtractionResult::malformed(FieldName::ReportedTotalAccounts),
            reported_active_accounts: ExtractionResult::malformed(FieldName::ReportedActiveAccounts),
            reported_closed_accounts: ExtractionResult::malformed(FieldName::ReportedClosedAccounts),
            enquiry_count: ExtractionResult::malformed(FieldName::EnquiryCount),
            total_credit_limit: ExtractionResult::malformed(FieldName::TotalCreditLimit),
            total_outstanding_balance: ExtractionResult::malformed(FieldName::TotalOutstandingBalance),
            accounts: Vec::new(),
            counts: AccountCounts::default(),
            discrepancies: Vec::new(),
            metadata: ExtractionMetadata {
                missing_fields: FieldName::ALL.to_vec(),
                ..ExtractionMetadata::default()
            },
        }
    }

    /// Status of each field, in [`FieldName::ALL`] order.
    pub fn field_statuses(&self) -> Vec<(FieldName, FieldStatus)> {
        vec![
            (self.score.field, self.score.status),
            (self.score_date.field, self.score_date.status),
            (self.reported_total_accounts.field, self.reported_total_accounts.status),
            (self.reported_active_accounts.field, self.reported_active_accounts.status),
            (self.reported_closed_accounts.field, self.reported_closed_accounts.status),
            (self.enquiry_count.field, self.enquiry_count.status),
            (self.total_credit_limit.field, self.total_credit_limit.status),
            (self.total_outstanding_balance.field, self.total_outstanding_balance.status),
        ]
    }

    /// Fields that carry no value.
    pub fn missing_fields(&self) -> Vec<FieldName> {
        self.field_statuses()
            .into_iter()
            .filter(|(_, status)| *status != FieldStatus::Found)
            .map(|(field, _)| field)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implausible_keeps_raw_match() {
        let result = ExtractionResult::found(FieldName::Score, 990u16, "990").into_implausible();
        assert!(!result.found);
        assert_eq!(result.status, FieldStatus::Implausible);
        assert_eq!(result.value, None);
        assert_eq!(result.raw_match.as_deref(), Some("990"));
    }

    #[test]
    fn test_malformed_summary_marks_every_field() {
        let summary = CreditReportSummary::malformed();
        assert!(summary
            .field_statuses()
            .iter()
            .all(|(_, status)| *status == FieldStatus::MalformedInput));
        assert_eq!(summary.missing_fields().len(), FieldName::ALL.len());
        assert!(summary.accounts.is_empty());
    }

    #[test]
    fn test_serialized_field_carries_found_marker() {
        let result: ExtractionResult<u32> = ExtractionResult::missing(FieldName::EnquiryCount);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["found"], serde_json::Value::Bool(false));
        assert_eq!(json["status"], "missing");
        assert_eq!(json["field"], "enquiry_count");
    }
}
