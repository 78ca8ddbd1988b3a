//! Subcommands.

pub mod analyze;
pub mod ask;
pub mod batch;
pub mod config;

use std::fs;
use std::path::Path;

use cibil_core::models::config::CibilConfig;
use cibil_core::pdf::{PdfExtractor, PdfProcessor};
use tracing::{debug, warn};

/// Load the configuration from `config_path`, falling back to the default
/// file and then to built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<CibilConfig> {
    if let Some(path) = config_path {
        return Ok(CibilConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using configuration from {}", default_path.display());
        return Ok(CibilConfig::from_file(&default_path)?);
    }

    Ok(CibilConfig::default())
}

/// Text layer of a report: PDFs go through the PDF extractor, `.txt` files
/// are read as already-extracted text.
pub fn read_report_text(path: &Path, config: &CibilConfig) -> anyhow::Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            let mut extractor = PdfExtractor::new();
            extractor.load(&data)?;
            debug!("PDF has {} pages", extractor.page_count());

            let text = extractor.extract_text()?;
            if text.trim().len() < config.pdf.min_text_length {
                warn!(
                    "{} has little or no text layer ({} chars); scanned reports need OCR first",
                    path.display(),
                    text.trim().len()
                );
            }
            Ok(text)
        }
        "txt" | "text" => Ok(fs::read_to_string(path)?),
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

/// Whether `path` looks like a report this tool can read.
pub fn is_supported(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext.to_lowercase().as_str(), "pdf" | "txt" | "text")
}
