pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Generative language API settings.
#[derive(Clone)]
pub struct GenAiConfig {
    /// `None` leaves the Q&A running but every answer reports the missing key.
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL, without a trailing slash.
    pub api_url: String,
    pub timeout_secs: u64,
}

impl GenAiConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var              | Default                                      |
    /// |----------------------|----------------------------------------------|
    /// | `GOOGLE_API_KEY`     | unset                                        |
    /// | `GENAI_MODEL`        | `gemini-1.5-flash`                           |
    /// | `GENAI_API_URL`      | `https://generativelanguage.googleapis.com`  |
    /// | `GENAI_TIMEOUT_SECS` | `60`                                         |
    pub fn from_env() -> Self {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let model = std::env::var("GENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());

        let api_url = std::env::var("GENAI_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.into())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs: u64 = std::env::var("GENAI_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("GENAI_TIMEOUT_SECS must be a valid u64");

        Self {
            api_key,
            model,
            api_url,
            timeout_secs,
        }
    }

    pub fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        )
    }
}

impl std::fmt::Debug for GenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
