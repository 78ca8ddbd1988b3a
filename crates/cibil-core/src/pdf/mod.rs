//! PDF text layer access.
//!
//! The extraction core only ever sees decoded text. This module is the
//! collaborator that turns report bytes into that text.

mod extractor;

pub use extractor::{PdfExtractor, extract_text_lossy};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;
}
