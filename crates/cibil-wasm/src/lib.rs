//! WASM bindings for CIBIL credit report extraction.
//!
//! The browser side is responsible for getting text out of the report (for
//! example with pdf.js); everything from score repair onwards runs here.

use wasm_bindgen::prelude::*;

use cibil_core::models::config::ExtractionConfig;
use cibil_core::models::report::CreditReportSummary;
use cibil_core::report::rules::{format_indian_amount, parse_indian_amount};
use cibil_core::{CibilReportParser, Insights, build_prompt, normalize};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Extract a credit report summary from report text.
#[wasm_bindgen]
pub fn extract_report_from_text(text: &str) -> Result<JsValue, JsValue> {
    let summary = CibilReportParser::new().parse(text).summary;
    to_js(&summary)
}

/// Repair OCR damage in the score slot and return the resulting text.
#[wasm_bindgen]
pub fn normalize_text(text: &str) -> String {
    normalize(text, CibilReportParser::new().rules())
}

/// Build the plain-text context block handed to an advisory model.
#[wasm_bindgen]
pub fn prompt_context(text: &str) -> String {
    let summary = CibilReportParser::new().parse(text).summary;
    summary.to_prompt_context(&Insights::from_summary(&summary))
}

/// Build a complete prompt from report text and a question.
#[wasm_bindgen]
pub fn build_question_prompt(text: &str, question: &str) -> String {
    build_prompt(&prompt_context(text), question)
}

/// Parse an Indian-formatted amount (e.g., "1,05,000.50").
#[wasm_bindgen]
pub fn parse_amount(amount: &str) -> Option<f64> {
    parse_indian_amount(amount).and_then(|d| d.to_string().parse().ok())
}

/// Re-format an amount with Indian digit grouping ("105000" -> "1,05,000.00").
#[wasm_bindgen]
pub fn format_amount(amount: &str) -> Option<String> {
    parse_indian_amount(amount).map(format_indian_amount)
}

/// Credit report analyzer class for browser use.
#[wasm_bindgen]
pub struct ReportAnalyzer {
    parser: CibilReportParser,
}

#[wasm_bindgen]
impl ReportAnalyzer {
    /// Create an analyzer with the default label tables.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            parser: CibilReportParser::new(),
        }
    }

    /// Create an analyzer from an extraction config in JSON form.
    ///
    /// Keys that are absent keep their default values.
    #[wasm_bindgen]
    pub fn from_config_json(json: &str) -> Result<ReportAnalyzer, JsValue> {
        let config: ExtractionConfig = serde_json::from_str(json).map_err(js_error)?;
        let parser = CibilReportParser::from_config(&config).map_err(js_error)?;
        Ok(Self { parser })
    }

    /// Extract a summary from text.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.parser.parse(text).summary)
    }

    /// Extract a summary along with the normalized text and insights.
    #[wasm_bindgen]
    pub fn extract_with_metadata(&self, text: &str) -> Result<JsValue, JsValue> {
        let outcome = self.parser.parse(text);

        #[derive(serde::Serialize)]
        struct ExtractResult {
            summary: CreditReportSummary,
            insights: Insights,
            normalized_text: String,
        }

        let output = ExtractResult {
            insights: Insights::from_summary(&outcome.summary),
            summary: outcome.summary,
            normalized_text: outcome.normalized_text,
        };

        to_js(&output)
    }

    /// Summary as a JSON string, for callers that store it as is.
    #[wasm_bindgen]
    pub fn extract_json(&self, text: &str) -> Result<String, JsValue> {
        serde_json::to_string(&self.parser.parse(text).summary).map_err(js_error)
    }
}

impl Default for ReportAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}
