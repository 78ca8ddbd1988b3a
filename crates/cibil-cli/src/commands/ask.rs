//! Ask command - send a report summary and a question to the advisory API.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use console::style;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use cibil_core::models::config::AdvisoryConfig;
use cibil_core::{CibilReportParser, Insights, build_prompt};

use super::{load_config, read_report_text};

/// Environment variable holding the advisory API key.
pub const API_KEY_ENV: &str = "CIBIL_ADVISORY_API_KEY";

/// Arguments for the ask command.
#[derive(Args)]
pub struct AskArgs {
    /// Report to use as context (PDF or extracted text)
    #[arg(required = true)]
    input: PathBuf,

    /// Question to ask
    #[arg(short, long)]
    prompt: String,

    /// API key (default: $CIBIL_ADVISORY_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Print the prompt instead of sending it
    #[arg(long)]
    dry_run: bool,
}

/// Errors from the advisory API.
#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("no API key: pass --api-key or set CIBIL_ADVISORY_API_KEY")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("advisory API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("advisory API returned no answer")]
    EmptyResponse,
}

pub async fn run(args: AskArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let text = read_report_text(&args.input, &config)?;
    let parser = CibilReportParser::from_config(&config.extraction)?;
    let summary = parser.parse(&text).summary;
    let insights = Insights::from_summary(&summary);

    let prompt = build_prompt(&summary.to_prompt_context(&insights), &args.prompt);

    if args.dry_run {
        println!("{}", prompt);
        return Ok(());
    }

    let api_key = resolve_api_key(args.api_key, std::env::var(API_KEY_ENV).ok())?;

    info!("Sending {} characters of context to {}", prompt.len(), config.advisory.endpoint);
    let answer = ask(&config.advisory, &api_key, &prompt).await?;

    println!("{}", style("Advice:").bold());
    println!("{}", answer.trim());

    Ok(())
}

fn resolve_api_key(flag: Option<String>, env: Option<String>) -> Result<String, AdvisoryError> {
    flag.or(env)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or(AdvisoryError::MissingApiKey)
}

/// POST one chat-completions request and return the first answer.
pub async fn ask(config: &AdvisoryConfig, api_key: &str, prompt: &str) -> Result<String, AdvisoryError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = json!({
        "model": config.model,
        "messages": [
            { "role": "system", "content": config.system_prompt },
            { "role": "user", "content": prompt },
        ],
        "temperature": config.temperature,
        "max_tokens": config.max_tokens,
    });

    let response = client
        .post(&config.endpoint)
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AdvisoryError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let json: serde_json::Value = response.json().await?;
    debug!("Advisory response: {}", json);
    parse_answer(&json)
}

fn parse_answer(json: &serde_json::Value) -> Result<String, AdvisoryError> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .ok_or(AdvisoryError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins_over_env() {
        let key = resolve_api_key(Some("flag".into()), Some("env".into())).unwrap();
        assert_eq!(key, "flag");
        assert_eq!(resolve_api_key(None, Some(" env ".into())).unwrap(), "env");
    }

    #[test]
    fn test_missing_key() {
        assert!(matches!(resolve_api_key(None, None), Err(AdvisoryError::MissingApiKey)));
        assert!(matches!(resolve_api_key(Some("  ".into()), None), Err(AdvisoryError::MissingApiKey)));
    }

    #[test]
    fn test_parse_answer() {
        let json = json!({ "choices": [{ "message": { "role": "assistant", "content": "Pay down cards." } }] });
        assert_eq!(parse_answer(&json).unwrap(), "Pay down cards.");
        assert!(matches!(parse_answer(&json!({ "choices": [] })), Err(AdvisoryError::EmptyResponse)));
    }
}
