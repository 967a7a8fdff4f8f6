use std::sync::Arc;

use glacier_core::geo::GeoBackend;
use glacier_core::qa::GlacierQa;
use glacier_core::velocity::VelocityEstimator;

use crate::config::ServerConfig;
use crate::session::SessionStore;

/// Session storage holding the raster handles of backend `B`.
pub type BackendSessions<B> =
    SessionStore<<B as GeoBackend>::Raster, <B as GeoBackend>::Features>;

/// Shared application state available to all Axum handlers via
/// `State<AppState<B>>`, generic over the geo backend in use.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
pub struct AppState<B: GeoBackend> {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Geo backend serving every analysis.
    pub backend: Arc<B>,
    pub estimator: Arc<VelocityEstimator>,
    /// Q&A over the hosted language model.
    pub qa: Arc<GlacierQa>,
    /// Latest results per browser session.
    pub sessions: Arc<BackendSessions<B>>,
}

impl<B: GeoBackend> AppState<B> {
    pub fn new(
        config: ServerConfig,
        backend: B,
        estimator: VelocityEstimator,
        qa: GlacierQa,
    ) -> Self {
        let sessions = SessionStore::with_capacity(config.max_sessions);
        Self {
            config: Arc::new(config),
            backend: Arc::new(backend),
            estimator: Arc::new(estimator),
            qa: Arc::new(qa),
            sessions: Arc::new(sessions),
        }
    }
}

// Manual impl: a derive would require `B: Clone`.
impl<B: GeoBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            backend: Arc::clone(&self.backend),
            estimator: Arc::clone(&self.estimator),
            qa: Arc::clone(&self.qa),
            sessions: Arc::clone(&self.sessions),
        }
    }
}
