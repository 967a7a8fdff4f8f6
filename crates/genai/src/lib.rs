//! Gemini text generation for the glacier Q&A.

pub mod client;
pub mod config;

pub use client::{GeminiClient, GenAiError, UnconfiguredGenerator};
pub use config::GenAiConfig;

use std::sync::Arc;

use glacier_core::qa::TextGenerator;

/// Generator for `config`: the Gemini client when an API key is set,
/// otherwise one that reports the missing key on every call.
pub fn generator_from_config(config: GenAiConfig) -> Result<Arc<dyn TextGenerator>, GenAiError> {
    match config.api_key.clone() {
        Some(api_key) => {
            let client = GeminiClient::new(config, api_key)?;
            tracing::info!(model = %client.model(), "Gemini client ready");
            Ok(Arc::new(client))
        }
        None => {
            tracing::warn!("GOOGLE_API_KEY not set, Q&A answers will report the missing key");
            Ok(Arc::new(UnconfiguredGenerator))
        }
    }
}
