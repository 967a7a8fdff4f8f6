//! Question answering over the analysis context.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Failure reported by a text-generation service.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TextGenError(pub String);

impl TextGenError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A hosted language model: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    async fn generate(&self, prompt: &str) -> Result<String, TextGenError>;
}

/// Prefix of every answer produced from a failed generation.
pub const ERROR_ANSWER_PREFIX: &str = "Error generating response:";

pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question.";

/// Filename offered for downloading an exchange.
pub const DOWNLOAD_FILENAME: &str = "glacier_analysis.txt";

const SYSTEM_PROMPT: &str = "You are an expert in glaciology and remote sensing. \
Your role is to analyze the provided data context and answer the user's question.
- Be concise and clear.
- Directly use the data from the context (e.g., temperature values, velocity).
- Explain the scientific reasoning behind your answer.
- If data is missing, state what is missing and how it would improve the analysis.
- Keep your response to 2-3 paragraphs.";

/// Reject empty or whitespace-only questions.
pub fn validate_question(question: &str) -> Result<&str, CoreError> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(EMPTY_QUESTION_MESSAGE.into()));
    }
    Ok(trimmed)
}

/// Starter questions for the current selection.
pub fn suggest_questions(location_name: &str, variable_label: &str, has_velocity: bool) -> Vec<String> {
    let mut questions = vec![
        format!("How might current {variable_label} conditions affect {location_name}?"),
        format!("What does this {variable_label} data tell us about the glacier's health?"),
    ];
    if has_velocity {
        questions.push("How does the measured velocity relate to the climate conditions?".into());
        questions.push("Is this velocity typical for a glacier in this region?".into());
    }
    questions
}

/// One question and the answer it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaExchange {
    pub question: String,
    pub answer: String,
}

impl QaExchange {
    /// Plain-text export of the exchange.
    pub fn download_text(&self) -> String {
        format!("Question: {}\n\nAnswer:\n{}", self.question, self.answer)
    }
}

/// Answers questions about a context with a [`TextGenerator`].
#[derive(Clone)]
pub struct GlacierQa {
    generator: Arc<dyn TextGenerator>,
}

impl GlacierQa {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn compose_prompt(question: &str, context: &str) -> String {
        format!("{SYSTEM_PROMPT}\n\n{context}\n\n**User Question:** {question}")
    }

    /// Ask the model. Never fails: generation errors come back as an
    /// answer starting with [`ERROR_ANSWER_PREFIX`].
    pub async fn answer(&self, question: &str, context: &str) -> String {
        let prompt = Self::compose_prompt(question, context);
        match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Text generation failed");
                format!("{ERROR_ANSWER_PREFIX} {e}")
            }
        }
    }
}

impl std::fmt::Debug for GlacierQa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlacierQa").finish_non_exhaustive()
    }
}
