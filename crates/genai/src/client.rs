//! REST client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use glacier_core::qa::{TextGenError, TextGenerator};

use crate::config::GenAiConfig;

/// Message reported when no API key is configured.
pub const MISSING_KEY_MESSAGE: &str = "GOOGLE_API_KEY not found in .env file. Please set it.";

/// Header carrying the API key; keeps it out of request URLs.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Errors from the generative language API layer.
#[derive(Debug, thiserror::Error)]
pub enum GenAiError {
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    #[error("Gemini API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The model returned no text, e.g. because the prompt was blocked.
    #[error("Gemini returned no text: {0}")]
    EmptyResponse(String),
}

// Error text must never carry the request URL.
impl From<reqwest::Error> for GenAiError {
    fn from(err: reqwest::Error) -> Self {
        GenAiError::Request(err.without_url())
    }
}

impl From<GenAiError> for TextGenError {
    fn from(err: GenAiError) -> Self {
        TextGenError::new(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

impl GenerateContentRequest {
    fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Result<String, GenAiError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(GenAiError::EmptyResponse(
                block_reason.unwrap_or_else(|| "no candidates".into()),
            ));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(GenAiError::EmptyResponse(
                candidate
                    .finish_reason
                    .unwrap_or_else(|| "empty candidate".into()),
            ));
        }
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

/// Gemini model client.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    config: GenAiConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: GenAiConfig, api_key: String) -> Result<Self, GenAiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub async fn generate_content(&self, prompt: &str) -> Result<String, GenAiError> {
        let response = self
            .client
            .post(self.config.generate_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GenAiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed.into_text()?;
        tracing::debug!(model = %self.config.model, chars = text.len(), "Generated answer");
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, TextGenError> {
        Ok(self.generate_content(prompt).await?)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("config", &self.config)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Stand-in used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, TextGenError> {
        Err(TextGenError::new(MISSING_KEY_MESSAGE))
    }
}
