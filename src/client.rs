//! Generation client: one backend call per request, strict reply validation.

use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::GenerativeBackend;
use crate::prompt::{build_prompt, response_schema};
use crate::request::RepoRequest;

/// Message shown to the user for every generation failure.
pub const GENERATION_FAILED_MESSAGE: &str =
    "Failed to generate content. Please check your API key and try again.";

/// The single error kind surfaced by generation.
///
/// Variants carry diagnostic detail for the logs; the UI only ever shows
/// [`BackendError::user_message`].
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no API key set (expected in ${0})")]
    MissingApiKey(String),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("backend reply contained no text")]
    EmptyResponse,
    #[error("reply is not valid JSON: {0}")]
    MalformedJson(serde_json::Error),
    #[error("reply does not match the expected shape: {0}")]
    Schema(serde_json::Error),
}

impl BackendError {
    pub fn user_message(&self) -> &'static str {
        GENERATION_FAILED_MESSAGE
    }
}

/// A single git command with its explanation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitCommandStep {
    pub command: String,
    pub explanation: String,
}

/// Validated output of one generation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationResult {
    pub steps: Vec<GitCommandStep>,
    #[serde(rename = "readmeMarkdown")]
    pub readme_markdown: String,
}

impl GenerationResult {
    /// All commands in order, one per line.
    pub fn commands_script(&self) -> String {
        self.steps
            .iter()
            .map(|step| step.command.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse a backend reply into a [`GenerationResult`].
///
/// Boundary whitespace around the document is ignored. Anything else that does not
/// match the schema exactly is rejected as a whole.
pub fn parse_generation(raw: &str) -> Result<GenerationResult, BackendError> {
    let value: serde_json::Value =
        serde_json::from_str(raw.trim()).map_err(BackendError::MalformedJson)?;
    serde_json::from_value(value).map_err(BackendError::Schema)
}

/// Turns a [`RepoRequest`] into a [`GenerationResult`] through a backend.
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn GenerativeBackend>,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    /// Generate setup steps and a README. Performs exactly one backend call.
    pub async fn generate(&self, request: &RepoRequest) -> Result<GenerationResult, BackendError> {
        let started = Instant::now();
        let prompt = build_prompt(request);
        let schema = response_schema();
        info!(
            repo = %request.name(),
            visibility = %request.visibility,
            gitignore = request.gitignore_template.identifier(),
            license = request.license_template.identifier(),
            prompt_len = prompt.len(),
            "generation_start"
        );

        let outcome = match self.backend.generate_json(&prompt, &schema).await {
            Ok(raw) => {
                debug!(reply_len = raw.len(), "generation_reply_received");
                parse_generation(&raw)
            }
            Err(e) => Err(e),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(result) => info!(
                repo = %request.name(),
                steps = result.steps.len(),
                readme_len = result.readme_markdown.len(),
                elapsed_ms,
                "generation_complete"
            ),
            Err(e) => warn!(repo = %request.name(), error = %e, elapsed_ms, "generation_failed"),
        }
        outcome
    }
}
