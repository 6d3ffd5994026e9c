//! Turn a snapshot into a perspective-gap analysis via the LLM.
//!
//! The model is asked for a single JSON object, which it may wrap in a
//! Markdown code fence. The response is unwrapped, parsed, and checked
//! against the gap-score bands. Every failure along the way is logged and
//! collapses to `None`; nothing here aborts the process.

use crate::api::{AskAsync, GeminiClient, RetryAsk};
use crate::models::{AnalysisResult, NewsSnapshot};
use crate::prompt::build_prompt;
use crate::utils::{looks_truncated, truncate_for_log};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Characters of the model response shown when it fails to parse.
pub const RESPONSE_PREVIEW_CHARS: usize = 500;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Why an analysis produced no result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("GEMINI_API_KEY environment variable not set")]
    MissingApiKey,
    #[error("model call failed: {0}")]
    Transport(String),
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("could not parse model response as JSON: {source}")]
    MalformedJson {
        #[source]
        source: serde_json::Error,
        preview: String,
    },
    #[error("model response is JSON but not an object (found {found})")]
    NotAnObject { found: &'static str, preview: String },
}

/// Settings for the model call.
#[derive(Clone)]
pub struct AnalyzerSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Option<Duration>,
    pub max_retries: usize,
}

impl std::fmt::Debug for AnalyzerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerSettings")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Something that can turn a snapshot into a gap analysis.
///
/// `None` means no usable analysis was produced; the reason has already been
/// logged.
pub trait Analyst {
    async fn analyze(&self, snapshot: &NewsSnapshot) -> Option<AnalysisResult>;
}

/// [`Analyst`] backed by the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiAnalyst {
    pub settings: AnalyzerSettings,
}

impl Analyst for GeminiAnalyst {
    async fn analyze(&self, snapshot: &NewsSnapshot) -> Option<AnalysisResult> {
        analyze_with_gemini(&self.settings, snapshot).await
    }
}

/// Return the part of a model response that should hold the JSON document.
///
/// If the text contains a ```` ```json ```` fence, the candidate is what lies
/// between it and the next ```` ``` ````; otherwise the same applies to the
/// first bare ```` ``` ````. An unclosed fence runs to the end of the text.
/// Fenced candidates are trimmed; unfenced text is returned as-is.
pub fn extract_json_block(text: &str) -> &str {
    let start = if let Some(pos) = text.find(JSON_FENCE) {
        pos + JSON_FENCE.len()
    } else if let Some(pos) = text.find(FENCE) {
        pos + FENCE.len()
    } else {
        return text;
    };
    let rest = &text[start..];
    let end = rest.find(FENCE).unwrap_or(rest.len());
    rest[..end].trim()
}

/// Parse a raw model response into an [`AnalysisResult`].
///
/// Any JSON object is accepted as-is; its fields are not checked.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    if raw.trim().is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    let candidate = extract_json_block(raw);
    let preview = || truncate_for_log(candidate, RESPONSE_PREVIEW_CHARS);
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(payload)) => Ok(AnalysisResult::new(payload)),
        Ok(other) => Err(AnalysisError::NotAnObject {
            found: json_kind(&other),
            preview: preview(),
        }),
        Err(source) => Err(AnalysisError::MalformedJson {
            source,
            preview: preview(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Log every topic whose score and label disagree with the band table.
///
/// The analysis is never altered.
pub fn warn_on_band_mismatches(analysis: &AnalysisResult) {
    for topic in analysis.topics() {
        let problems = topic.band_inconsistencies();
        if problems.is_empty() {
            continue;
        }
        let name = topic.topic_name().unwrap_or_else(|| "Unknown Topic".to_string());
        for problem in problems {
            warn!(
                topic = %name,
                %problem,
                "Model output is inconsistent with the gap-score bands; keeping it as-is"
            );
        }
    }
}

/// Ask `api` to analyze `snapshot`.
#[instrument(level = "info", skip_all, fields(articles = snapshot.total_articles()))]
pub async fn try_analyze<A>(api: &A, snapshot: &NewsSnapshot) -> Result<AnalysisResult, AnalysisError>
where
    A: AskAsync<Response = String>,
{
    let prompt = build_prompt(snapshot);
    info!(prompt_chars = prompt.chars().count(), "Sending analysis prompt");

    let raw = api
        .ask(&prompt)
        .await
        .map_err(|e| AnalysisError::Transport(e.to_string()))?;

    let analysis = parse_analysis(&raw)?;
    warn_on_band_mismatches(&analysis);
    info!(topics = analysis.topics().len(), "Parsed gap analysis");
    Ok(analysis)
}

/// Ask `api` to analyze `snapshot`, logging and swallowing any failure.
pub async fn analyze<A>(api: &A, snapshot: &NewsSnapshot) -> Option<AnalysisResult>
where
    A: AskAsync<Response = String>,
{
    match try_analyze(api, snapshot).await {
        Ok(analysis) => Some(analysis),
        Err(e) => {
            report_failure(&e);
            None
        }
    }
}

/// Analyze `snapshot` with Gemini using `settings`.
///
/// A missing API key is reported and yields `None` without touching the
/// network.
pub async fn analyze_with_gemini(settings: &AnalyzerSettings, snapshot: &NewsSnapshot) -> Option<AnalysisResult> {
    let Some(api_key) = settings.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        report_failure(&AnalysisError::MissingApiKey);
        return None;
    };

    let client = match GeminiClient::new(api_key, settings.model.clone(), settings.timeout) {
        Ok(client) => client,
        Err(e) => {
            report_failure(&AnalysisError::Transport(e.to_string()));
            return None;
        }
    };

    println!("\nAnalyzing news with Gemini API...");
    let api = RetryAsk::new(client, settings.max_retries, Duration::from_secs(1));
    analyze(&api, snapshot).await
}

fn report_failure(e: &AnalysisError) {
    match e {
        AnalysisError::MalformedJson { source, preview } => {
            error!(
                error = %source,
                truncated = looks_truncated(source),
                response_preview = %preview,
                "Error parsing Gemini response as JSON"
            );
        }
        AnalysisError::NotAnObject { preview, .. } => {
            error!(error = %e, response_preview = %preview, "Gemini response has the wrong shape");
        }
        other => error!(error = %other, "Gemini analysis failed"),
    }
}
