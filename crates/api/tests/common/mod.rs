#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use glacier_core::memory::InMemoryBackend;
use glacier_core::qa::{GlacierQa, TextGenError, TextGenerator};
use glacier_core::velocity::VelocityEstimator;
use http_body_util::BodyExt;
use tower::ServiceExt;

use glacier_api::config::{GeoBackendKind, LogFormat, ServerConfig};
use glacier_api::router::build_app_router;
use glacier_api::session::{DEFAULT_MAX_SESSIONS, SESSION_HEADER};
use glacier_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        geo_backend: GeoBackendKind::Memory,
        max_sessions: DEFAULT_MAX_SESSIONS,
        log_format: LogFormat::Text,
    }
}

/// Text generator returning a canned answer, or failing, and recording
/// every prompt it receives.
#[derive(Default)]
pub struct ScriptedGenerator {
    failure: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub const ANSWER: &'static str = "The glacier is retreating.";

    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(message.to_string()),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, TextGenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.failure {
            Some(message) => Err(TextGenError::new(message.clone())),
            None => Ok(Self::ANSWER.to_string()),
        }
    }
}

/// Build the full application router over `backend`, using the same
/// middleware stack as production.
pub fn build_test_app(backend: InMemoryBackend, generator: Arc<ScriptedGenerator>) -> Router {
    build_test_app_with_config(test_config(), backend, generator)
}

pub fn build_test_app_with_config(
    config: ServerConfig,
    backend: InMemoryBackend,
    generator: Arc<ScriptedGenerator>,
) -> Router {
    let state = AppState::new(
        config,
        backend,
        VelocityEstimator::default(),
        GlacierQa::new(generator),
    );
    build_app_router(state)
}

/// The demo world with a generator that always answers.
pub fn build_demo_app() -> Router {
    build_test_app(InMemoryBackend::demo(), ScriptedGenerator::new())
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    get_in_session(app, uri, None).await
}

pub async fn get_in_session(app: Router, uri: &str, session: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(session) = session {
        builder = builder.header(SESSION_HEADER, session);
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_json_in_session(app, uri, body, None).await
}

pub async fn post_json_in_session(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    session: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(session) = session {
        builder = builder.header(SESSION_HEADER, session);
    }
    app.oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
