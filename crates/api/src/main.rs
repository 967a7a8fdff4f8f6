use std::net::SocketAddr;

use glacier_core::geo::GeoBackend;
use glacier_core::memory::InMemoryBackend;
use glacier_core::qa::GlacierQa;
use glacier_core::velocity::VelocityEstimator;
use glacier_earthengine::{EarthEngineBackend, EarthEngineConfig};
use glacier_genai::{generator_from_config, GenAiConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use glacier_api::config::{velocity_config_from_env, GeoBackendKind, LogFormat, ServerConfig};
use glacier_api::router::build_app_router;
use glacier_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let json = config.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "glacier_api=debug,tower_http=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!(
        host = %config.host,
        port = %config.port,
        geo_backend = ?config.geo_backend,
        max_sessions = config.max_sessions,
        "Loaded server configuration",
    );

    // --- Analyses ---
    let estimator = VelocityEstimator::new(velocity_config_from_env());
    let generator = generator_from_config(GenAiConfig::from_env())
        .expect("Failed to build text generation client");
    let qa = GlacierQa::new(generator);

    // --- Geo backend ---
    match config.geo_backend {
        GeoBackendKind::EarthEngine => {
            let backend = EarthEngineBackend::new(EarthEngineConfig::from_env())
                .expect("Failed to build Earth Engine client");
            tracing::info!(project = %backend.api().config().project, "Earth Engine backend ready");
            serve(config, backend, estimator, qa).await;
        }
        GeoBackendKind::Memory => {
            tracing::warn!("Serving the in-memory demo world, not real imagery");
            serve(config, InMemoryBackend::demo(), estimator, qa).await;
        }
    }
}

async fn serve<B: GeoBackend>(
    config: ServerConfig,
    backend: B,
    estimator: VelocityEstimator,
    qa: GlacierQa,
) {
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState::new(config, backend, estimator, qa);
    let sessions = std::sync::Arc::clone(&state.sessions);
    let app = build_app_router(state);

    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    let session_count = sessions.session_count().await;
    tracing::info!(session_count, "Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
