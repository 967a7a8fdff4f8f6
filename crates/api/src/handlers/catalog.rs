//! Handlers for the glacier catalog and location summaries.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use glacier_core::climate::summarize_location;
use glacier_core::geo::GeoBackend;
use glacier_core::sites::{
    default_analysis_date, GlacierSite, CUSTOM_LOCATION, DEFAULT_RADIUS_KM, GLACIER_SITES,
};
use serde::Serialize;

use crate::error::AppResult;
use crate::handlers::params::LocationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Glacier catalog with the form defaults.
#[derive(Debug, Serialize)]
pub struct Catalog {
    pub glaciers: &'static [GlacierSite],
    pub custom_location: &'static str,
    pub default_radius_km: f64,
    pub default_date: NaiveDate,
    /// Default velocity window, summer 2023.
    pub default_velocity_dates: (NaiveDate, NaiveDate),
}

// ---------------------------------------------------------------------------
// GET /glaciers
// ---------------------------------------------------------------------------

pub async fn list_glaciers() -> impl IntoResponse {
    let summer = (
        NaiveDate::from_ymd_opt(2023, 6, 1).unwrap_or(NaiveDate::MIN),
        NaiveDate::from_ymd_opt(2023, 8, 31).unwrap_or(NaiveDate::MIN),
    );
    Json(DataResponse {
        data: Catalog {
            glaciers: &GLACIER_SITES,
            custom_location: CUSTOM_LOCATION,
            default_radius_km: DEFAULT_RADIUS_KM,
            default_date: default_analysis_date(),
            default_velocity_dates: summer,
        },
    })
}

// ---------------------------------------------------------------------------
// POST /location/summary
// ---------------------------------------------------------------------------

/// Count the glacier outlines inside the analysis area.
pub async fn location_summary<B: GeoBackend>(
    State(state): State<AppState<B>>,
    Json(params): Json<LocationParams>,
) -> AppResult<impl IntoResponse> {
    let (info, location) = params.resolve()?;
    let summary = summarize_location(state.backend.as_ref(), &info.name, &location).await?;

    tracing::debug!(
        glacier = %summary.name,
        glacier_count = summary.glacier_count,
        "Location summarized",
    );

    Ok(Json(DataResponse { data: summary }))
}
