//! Core library for CIBIL credit report extraction.
//!
//! This crate provides:
//! - OCR score repair on the report text
//! - Field extraction (score, score date, reported totals, enquiries, amounts)
//! - Account record extraction, deduplication and counts
//! - Summary assembly with plausibility checks and discrepancy reporting
//! - Ratios, recommendations and a prompt context for advisory services
//! - PDF text extraction (feature `native`)

pub mod error;
pub mod models;
#[cfg(feature = "native")]
pub mod pdf;
pub mod report;

pub use error::{CibilError, PdfError, Result};
pub use models::config::{CibilConfig, ExtractionConfig, ScoreRange};
pub use models::report::{
    AccountCounts, AccountRecord, AccountStatus, AccountType, CreditReportSummary, Discrepancy,
    DiscrepancyKind, ExtractionResult, FieldName, FieldStatus,
};
#[cfg(feature = "native")]
pub use pdf::{PdfExtractor, PdfProcessor, extract_text_lossy};
pub use report::rules::{RuleSet, normalize};
pub use report::{CibilReportParser, Insights, ReportExtractor, ReportOutcome, build_prompt, prompt_context};
