/// Default Cloud project billed for Earth Engine requests.
pub const DEFAULT_PROJECT: &str = "glacier-470302";
pub const DEFAULT_API_URL: &str = "https://earthengine.googleapis.com/v1";
/// Glacier outline inventory.
pub const DEFAULT_GLACIER_TABLE: &str = "GLIMS/20230607";

/// Earth Engine connection settings.
#[derive(Clone)]
pub struct EarthEngineConfig {
    pub project: String,
    /// OAuth2 bearer token with the Earth Engine scope. Tokens minted by
    /// `gcloud auth print-access-token` expire after about an hour; the
    /// server must then be restarted with a fresh one.
    pub access_token: String,
    /// REST base URL, without a trailing slash.
    pub api_url: String,
    pub glacier_table: String,
    pub timeout_secs: u64,
}

impl EarthEngineConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var             | Default                                  |
    /// |---------------------|------------------------------------------|
    /// | `EE_PROJECT`        | `glacier-470302`                         |
    /// | `EE_ACCESS_TOKEN`   | required                                 |
    /// | `EE_API_URL`        | `https://earthengine.googleapis.com/v1`  |
    /// | `EE_GLACIER_TABLE`  | `GLIMS/20230607`                         |
    /// | `EE_TIMEOUT_SECS`   | `120`                                    |
    ///
    /// `EE_ACCESS_TOKEN` is a short-lived OAuth2 access token (about one
    /// hour). Once it expires every call fails with
    /// [`EarthEngineError::Unauthorized`](crate::EarthEngineError::Unauthorized).
    pub fn from_env() -> Self {
        let project = std::env::var("EE_PROJECT").unwrap_or_else(|_| DEFAULT_PROJECT.into());

        let access_token =
            std::env::var("EE_ACCESS_TOKEN").expect("EE_ACCESS_TOKEN must be set");

        let api_url = std::env::var("EE_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.into())
            .trim_end_matches('/')
            .to_string();

        let glacier_table =
            std::env::var("EE_GLACIER_TABLE").unwrap_or_else(|_| DEFAULT_GLACIER_TABLE.into());

        let timeout_secs: u64 = std::env::var("EE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("EE_TIMEOUT_SECS must be a valid u64");

        Self {
            project,
            access_token,
            api_url,
            glacier_table,
            timeout_secs,
        }
    }

    /// `{api_url}/projects/{project}`, the parent of every call.
    pub fn project_url(&self) -> String {
        format!("{}/projects/{}", self.api_url, self.project)
    }
}

impl std::fmt::Debug for EarthEngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EarthEngineConfig")
            .field("project", &self.project)
            .field("access_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("glacier_table", &self.glacier_table)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
