use axum::routing::{get, post};
use axum::Router;
use glacier_core::geo::GeoBackend;

use crate::handlers::qa;
use crate::state::AppState;

/// Q&A routes mounted at `/qa`.
///
/// ```text
/// POST /ask                -> ask
/// GET  /suggestions        -> suggestions
/// GET  /latest             -> latest
/// GET  /latest/download    -> download
/// ```
pub fn qa_router<B: GeoBackend>() -> Router<AppState<B>> {
    Router::new()
        .route("/ask", post(qa::ask::<B>))
        .route("/suggestions", get(qa::suggestions::<B>))
        .route("/latest", get(qa::latest::<B>))
        .route("/latest/download", get(qa::download::<B>))
}
