use axum::routing::{get, post};
use axum::Router;
use glacier_core::geo::GeoBackend;

use crate::handlers::velocity;
use crate::state::AppState;

/// Velocity routes mounted at `/velocity`.
///
/// ```text
/// POST /                   -> calculate
/// GET  /latest             -> latest
/// POST /latest/layer       -> latest_layer
/// ```
pub fn velocity_router<B: GeoBackend>() -> Router<AppState<B>> {
    Router::new()
        .route("/", post(velocity::calculate::<B>))
        .route("/latest", get(velocity::latest::<B>))
        .route("/latest/layer", post(velocity::latest_layer::<B>))
}
