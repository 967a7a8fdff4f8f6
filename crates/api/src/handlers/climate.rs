//! Handlers for climate variables, statistics and map layers.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use glacier_core::climate::{sample_climate, ClimateVariable};
use glacier_core::context::LocationInfo;
use glacier_core::error::CoreError;
use glacier_core::geo::{GeoBackend, RegionStats, TileLayer, VisParams};
use glacier_core::legend::Legend;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::params::ClimateParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct VariableInfo {
    pub id: ClimateVariable,
    pub label: &'static str,
    pub band: &'static str,
    pub unit: &'static str,
    pub vis: VisParams,
}

#[derive(Debug, Serialize)]
pub struct ClimateStats {
    pub location: LocationInfo,
    pub variable: ClimateVariable,
    pub label: &'static str,
    pub band: &'static str,
    pub unit: &'static str,
    pub month_start: NaiveDate,
    pub image_count: u64,
    /// Absent when the month has no images.
    pub stats: Option<RegionStats>,
    pub mean: Option<f64>,
}

/// A rendered layer with its legend.
#[derive(Debug, Serialize)]
pub struct LayerResponse {
    pub layer: TileLayer,
    pub legend: Legend,
}

#[derive(Debug, Deserialize)]
pub struct LegendQuery {
    pub variable: String,
}

// ---------------------------------------------------------------------------
// GET /climate/variables
// ---------------------------------------------------------------------------

pub async fn list_variables() -> impl IntoResponse {
    let variables: Vec<VariableInfo> = ClimateVariable::ALL
        .into_iter()
        .map(|v| VariableInfo {
            id: v,
            label: v.label(),
            band: v.band(),
            unit: v.unit(),
            vis: v.vis_params(),
        })
        .collect();
    Json(DataResponse { data: variables })
}

// ---------------------------------------------------------------------------
// GET /climate/legend?variable=
// ---------------------------------------------------------------------------

pub async fn legend(Query(query): Query<LegendQuery>) -> AppResult<impl IntoResponse> {
    let variable = ClimateVariable::parse(&query.variable)?;
    let legend = Legend::new(variable.label(), &variable.vis_params());
    Ok(Json(DataResponse { data: legend }))
}

// ---------------------------------------------------------------------------
// POST /climate/stats
// ---------------------------------------------------------------------------

/// Monthly median of the variable over the area, masked to glaciers.
pub async fn climate_stats<B: GeoBackend>(
    State(state): State<AppState<B>>,
    Json(params): Json<ClimateParams>,
) -> AppResult<impl IntoResponse> {
    let variable = params.variable()?;
    let date = params.date()?;
    let (info, location) = params.location.resolve()?;

    let sample = sample_climate(state.backend.as_ref(), &location, date, variable).await?;
    let mean = sample
        .stats
        .as_ref()
        .and_then(|s| s.mean(variable.band()));

    tracing::debug!(
        glacier = %info.name,
        band = variable.band(),
        image_count = sample.image_count,
        mean = ?mean,
        "Climate sampled",
    );

    Ok(Json(DataResponse {
        data: ClimateStats {
            location: info,
            variable,
            label: variable.label(),
            band: variable.band(),
            unit: variable.unit(),
            month_start: sample.month.start,
            image_count: sample.image_count,
            stats: sample.stats,
            mean,
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /climate/layer
// ---------------------------------------------------------------------------

/// Tile layer of the monthly composite; 404 when the month has no images.
pub async fn climate_layer<B: GeoBackend>(
    State(state): State<AppState<B>>,
    Json(params): Json<ClimateParams>,
) -> AppResult<impl IntoResponse> {
    let variable = params.variable()?;
    let date = params.date()?;
    let (_, location) = params.location.resolve()?;

    let sample = sample_climate(state.backend.as_ref(), &location, date, variable).await?;
    let Some(composite) = sample.composite else {
        return Err(CoreError::NotFound(format!(
            "{} imagery for {}",
            variable.label(),
            sample.month.start.format("%Y-%m")
        ))
        .into());
    };

    let vis = variable.vis_params();
    let layer = state
        .backend
        .tile_layer(&composite, variable.label(), &vis)
        .await?;

    Ok(Json(DataResponse {
        data: LayerResponse {
            layer,
            legend: Legend::new(variable.label(), &vis),
        },
    }))
}
