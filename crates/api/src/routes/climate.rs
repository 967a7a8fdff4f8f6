use axum::routing::{get, post};
use axum::Router;
use glacier_core::geo::GeoBackend;

use crate::handlers::climate;
use crate::state::AppState;

/// Climate routes mounted at `/climate`.
///
/// ```text
/// GET  /variables          -> list_variables
/// GET  /legend?variable=   -> legend
/// POST /stats              -> climate_stats
/// POST /layer              -> climate_layer
/// ```
pub fn climate_router<B: GeoBackend>() -> Router<AppState<B>> {
    Router::new()
        .route("/variables", get(climate::list_variables))
        .route("/legend", get(climate::legend))
        .route("/stats", post(climate::climate_stats::<B>))
        .route("/layer", post(climate::climate_layer::<B>))
}
