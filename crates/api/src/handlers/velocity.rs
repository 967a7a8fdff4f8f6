//! Handlers for glacier velocity calculations.
//!
//! A finished calculation is stored as the session's latest result whether
//! it succeeded or not; failures are reported in the body with
//! `success: false` rather than as HTTP errors.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use glacier_core::error::CoreError;
use glacier_core::geo::GeoBackend;
use glacier_core::legend::Legend;
use glacier_core::types::{parse_date, AnalysisWindow};
use glacier_core::velocity::{
    velocity_vis_params, SpeedStats, VelocityMetrics, VelocityOutcome,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::climate::LayerResponse;
use crate::handlers::params::LocationParams;
use crate::response::DataResponse;
use crate::session::SessionId;
use crate::state::AppState;

/// Layer name of the speed raster.
pub const VELOCITY_LAYER_NAME: &str = "Glacier Velocity (m/day)";

#[derive(Debug, Deserialize)]
pub struct VelocityRequest {
    #[serde(flatten)]
    pub location: LocationParams,
    pub start_date: String,
    pub end_date: String,
}

/// Metrics as displayed: two decimals per day, one per year.
#[derive(Debug, Serialize)]
pub struct MetricsDisplay {
    pub mean: String,
    pub max: String,
    pub annual: String,
}

/// A stored velocity outcome as returned to clients.
#[derive(Debug, Serialize)]
pub struct VelocityView {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SpeedStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_dates: Option<(NaiveDate, NaiveDate)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<VelocityMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<MetricsDisplay>,
}

impl<R, F> From<&VelocityOutcome<R, F>> for VelocityView {
    fn from(outcome: &VelocityOutcome<R, F>) -> Self {
        match outcome {
            Ok(estimate) => {
                let metrics = estimate.metrics();
                let (mean, max, annual) = metrics.display();
                Self {
                    success: true,
                    error: None,
                    elapsed_days: Some(estimate.elapsed_days),
                    stats: Some(estimate.stats),
                    analysis_dates: Some(estimate.analysis_dates),
                    metrics: Some(metrics),
                    display: Some(MetricsDisplay { mean, max, annual }),
                }
            }
            Err(e) => Self {
                success: false,
                error: Some(e.to_string()),
                elapsed_days: None,
                stats: None,
                analysis_dates: None,
                metrics: None,
                display: None,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// POST /velocity
// ---------------------------------------------------------------------------

/// Validate the window, run the calculation and store its outcome.
///
/// Invalid input is rejected with 400 before the backend is touched.
pub async fn calculate<B: GeoBackend>(
    State(state): State<AppState<B>>,
    session: SessionId,
    Json(body): Json<VelocityRequest>,
) -> AppResult<impl IntoResponse> {
    let start = parse_date(&body.start_date, "start_date")?;
    let end = parse_date(&body.end_date, "end_date")?;
    let window = AnalysisWindow::new(start, end)?;
    let (info, location) = body.location.resolve()?;

    tracing::info!(
        session = %session.as_str(),
        glacier = %info.name,
        %start,
        %end,
        "Starting velocity calculation",
    );

    let outcome = state
        .estimator
        .estimate(state.backend.as_ref(), &location, &window)
        .await;

    if let Err(e) = &outcome {
        tracing::warn!(session = %session.as_str(), error = %e, "Velocity calculation failed");
    }

    let view = VelocityView::from(&outcome);
    state.sessions.set_velocity(session.as_str(), outcome).await;

    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// GET /velocity/latest
// ---------------------------------------------------------------------------

pub async fn latest<B: GeoBackend>(
    State(state): State<AppState<B>>,
    session: SessionId,
) -> AppResult<impl IntoResponse> {
    let outcome = state
        .sessions
        .latest_velocity(session.as_str())
        .await
        .ok_or_else(|| CoreError::NotFound("Velocity result".into()))?;

    Ok(Json(DataResponse {
        data: VelocityView::from(&outcome),
    }))
}

// ---------------------------------------------------------------------------
// POST /velocity/latest/layer
// ---------------------------------------------------------------------------

/// Tile layer of the latest successful speed field.
pub async fn latest_layer<B: GeoBackend>(
    State(state): State<AppState<B>>,
    session: SessionId,
) -> AppResult<impl IntoResponse> {
    let estimate = state
        .sessions
        .latest_estimate(session.as_str())
        .await
        .ok_or_else(|| CoreError::NotFound("Successful velocity result".into()))?;

    let vis = velocity_vis_params();
    let layer = state
        .backend
        .tile_layer(&estimate.speed_field, VELOCITY_LAYER_NAME, &vis)
        .await?;

    Ok(Json(DataResponse {
        data: LayerResponse {
            layer,
            legend: Legend::new("Glacier Velocity", &vis),
        },
    }))
}
