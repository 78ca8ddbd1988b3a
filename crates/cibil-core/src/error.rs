//! Error types for the cibil-core library.
//!
//! Field extraction itself never fails: a missing or implausible field is
//! reported through [`FieldStatus`](crate::models::report::FieldStatus).
//! The errors below cover the fallible edges around it.

use thiserror::Error;

/// Main error type for the cibil library.
#[derive(Error, Debug)]
pub enum CibilError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// A configured label or record pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Result type for the cibil library.
pub type Result<T> = std::result::Result<T, CibilError>;
