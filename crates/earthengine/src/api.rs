//! REST client for the Earth Engine `value:compute` and `maps` endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use glacier_core::geo::{GeoError, VisParams};

use crate::config::EarthEngineConfig;
use crate::expr::{Expr, Expression};

/// HTTP client bound to one Earth Engine project.
#[derive(Debug, Clone)]
pub struct EarthEngineApi {
    client: reqwest::Client,
    config: EarthEngineConfig,
}

/// Errors from the Earth Engine REST layer.
#[derive(Debug, thiserror::Error)]
pub enum EarthEngineError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The access token was rejected, usually because it has expired.
    #[error(
        "Earth Engine rejected the access token ({status}); EE_ACCESS_TOKEN may have expired, refresh it and restart"
    )]
    Unauthorized { status: u16 },

    /// Earth Engine returned a non-2xx status code.
    #[error("Earth Engine API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The response parsed but did not have the expected shape.
    #[error("Unexpected Earth Engine response: {0}")]
    UnexpectedResponse(String),
}

impl From<EarthEngineError> for GeoError {
    fn from(err: EarthEngineError) -> Self {
        GeoError::new(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ComputeValueRequest<'a> {
    expression: &'a Expression,
}

#[derive(Debug, Deserialize)]
struct ComputeValueResponse {
    result: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateMapRequest<'a> {
    pub expression: &'a Expression,
    pub file_format: &'static str,
    pub visualization_options: VisualizationOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VisualizationOptions {
    pub ranges: Vec<DoubleRange>,
    pub palette_colors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DoubleRange {
    pub min: f64,
    pub max: f64,
}

impl From<&VisParams> for VisualizationOptions {
    fn from(vis: &VisParams) -> Self {
        Self {
            ranges: vec![DoubleRange {
                min: vis.min,
                max: vis.max,
            }],
            palette_colors: vis
                .palette
                .iter()
                .map(|c| c.trim_start_matches('#').to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EarthEngineMap {
    /// Resource name, `projects/{project}/maps/{id}`.
    name: String,
}

impl EarthEngineApi {
    pub fn new(config: EarthEngineConfig) -> Result<Self, EarthEngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EarthEngineConfig {
        &self.config
    }

    /// Evaluate `node` and return its JSON result.
    pub async fn compute_value(&self, node: Expr) -> Result<serde_json::Value, EarthEngineError> {
        let expression = Expression::from(node);
        let response = self
            .client
            .post(format!("{}/value:compute", self.config.project_url()))
            .bearer_auth(&self.config.access_token)
            .json(&ComputeValueRequest {
                expression: &expression,
            })
            .send()
            .await?;

        let parsed: ComputeValueResponse = Self::parse_response(response).await?;
        Ok(parsed.result)
    }

    /// Evaluate `node` and deserialize the result as `T`.
    pub async fn compute<T: serde::de::DeserializeOwned>(
        &self,
        node: Expr,
    ) -> Result<T, EarthEngineError> {
        let value = self.compute_value(node).await?;
        serde_json::from_value(value)
            .map_err(|e| EarthEngineError::UnexpectedResponse(e.to_string()))
    }

    /// Register `node` as a PNG map and return its XYZ tile URL template.
    pub async fn create_map(&self, node: Expr, vis: &VisParams) -> Result<String, EarthEngineError> {
        let expression = Expression::from(node);
        let body = CreateMapRequest {
            expression: &expression,
            file_format: "PNG",
            visualization_options: vis.into(),
        };

        let response = self
            .client
            .post(format!("{}/maps", self.config.project_url()))
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await?;

        let map: EarthEngineMap = Self::parse_response(response).await?;
        Ok(tile_url_template(&self.config.api_url, &map.name))
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, EarthEngineError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(api_error(status.as_u16(), body));
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, EarthEngineError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Classify a non-2xx response. A 401 means the bearer token is no longer
/// accepted.
pub(crate) fn api_error(status: u16, body: String) -> EarthEngineError {
    if status == 401 {
        tracing::error!(status, "Earth Engine access token rejected");
        return EarthEngineError::Unauthorized { status };
    }
    EarthEngineError::ApiError { status, body }
}

pub(crate) fn tile_url_template(api_url: &str, map_name: &str) -> String {
    format!("{api_url}/{map_name}/tiles/{{z}}/{{x}}/{{y}}")
}
