use axum::extract::State;
use axum::{routing::get, Json, Router};
use glacier_core::geo::GeoBackend;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Geo backend serving analyses (`earthengine` or `memory`).
    pub geo_backend: &'static str,
}

/// GET /health -- liveness, version and backend kind.
async fn health_check<B: GeoBackend>(State(state): State<AppState<B>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        geo_backend: state.backend.kind(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router<B: GeoBackend>() -> Router<AppState<B>> {
    Router::new().route("/health", get(health_check::<B>))
}
