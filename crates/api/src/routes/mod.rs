pub mod catalog;
pub mod climate;
pub mod health;
pub mod qa;
pub mod velocity;

use axum::Router;
use glacier_core::geo::GeoBackend;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /glaciers                        predefined glacier catalog (GET)
/// /location/summary                glacier count for a location (POST)
///
/// /climate/variables               variables with band, unit, palette (GET)
/// /climate/legend?variable=        legend for a variable (GET)
/// /climate/stats                   monthly statistics (POST)
/// /climate/layer                   monthly composite tile layer (POST)
///
/// /velocity                        calculate and store (POST)
/// /velocity/latest                 latest stored result (GET)
/// /velocity/latest/layer           tile layer of the latest speed field (POST)
///
/// /qa/ask                          answer a question (POST)
/// /qa/suggestions                  suggested questions (GET)
/// /qa/latest                       latest exchange (GET)
/// /qa/latest/download              latest exchange as text (GET)
/// ```
///
/// Session-scoped endpoints read the `x-session-id` header.
pub fn api_routes<B: GeoBackend>() -> Router<AppState<B>> {
    Router::new()
        .merge(catalog::catalog_router::<B>())
        .nest("/climate", climate::climate_router::<B>())
        .nest("/velocity", velocity::velocity_router::<B>())
        .nest("/qa", qa::qa_router::<B>())
}
