//! Credit report field extraction module.

pub mod context;
pub mod insights;
mod parser;
pub mod rules;

pub use context::{build_prompt, prompt_context};
pub use insights::Insights;
pub use parser::{CibilReportParser, ReportOutcome, is_malformed};

use crate::models::report::CreditReportSummary;

/// Trait for credit report extractors.
///
/// Extraction never fails: fields that cannot be found are reported as such
/// in the summary.
pub trait ReportExtractor {
    /// Extract the summary from the text layer of a report.
    fn extract_from_text(&self, text: &str) -> CreditReportSummary;

    /// Extract the summary from PDF bytes.
    ///
    /// A PDF whose text cannot be read is treated like empty text.
    #[cfg(feature = "native")]
    fn extract_from_pdf(&self, data: &[u8]) -> CreditReportSummary {
        self.extract_from_text(&crate::pdf::extract_text_lossy(data))
    }
}
