use axum::routing::{get, post};
use axum::Router;
use glacier_core::geo::GeoBackend;

use crate::handlers::catalog;
use crate::state::AppState;

/// Catalog routes.
///
/// ```text
/// GET  /glaciers           -> list_glaciers
/// POST /location/summary   -> location_summary
/// ```
pub fn catalog_router<B: GeoBackend>() -> Router<AppState<B>> {
    Router::new()
        .route("/glaciers", get(catalog::list_glaciers))
        .route("/location/summary", post(catalog::location_summary::<B>))
}
