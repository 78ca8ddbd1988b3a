//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::{debug, warn};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF text extractor.
///
/// lopdf validates the document and removes empty-password encryption;
/// pdf-extract reads the text layer from the (possibly re-saved) bytes.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Bureau reports are commonly "encrypted" with an empty user password
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        if self.document.is_none() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }

        let text = pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        debug!("Extracted {} characters of text", text.len());
        Ok(text)
    }
}

/// Best-effort text layer of a PDF.
///
/// Returns an empty string for anything that cannot be read; the caller then
/// gets a summary in which every field is marked as malformed input.
pub fn extract_text_lossy(data: &[u8]) -> String {
    let mut extractor = PdfExtractor::new();
    let result = extractor.load(data).and_then(|_| extractor.extract_text());

    match result {
        Ok(text) => text,
        Err(e) => {
            warn!("PDF text extraction failed: {}", e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
    }

    #[test]
    fn test_extract_text_requires_document() {
        let extractor = PdfExtractor::new();
        assert!(matches!(extractor.extract_text(), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        assert!(extractor.load(b"not a pdf at all").is_err());
    }

    #[test]
    fn test_lossy_extraction_never_fails() {
        assert_eq!(extract_text_lossy(b""), "");
        assert_eq!(extract_text_lossy(b"%PDF-1.4 truncated"), "");
    }
}
