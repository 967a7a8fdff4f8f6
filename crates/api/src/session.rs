//! Per-session results of the latest user actions.
//!
//! Each browser session keeps at most one velocity outcome and one Q&A
//! exchange. Slots are replaced whole, only after an action has finished,
//! so readers never see a half-written result.

use std::collections::HashMap;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use glacier_core::qa::QaExchange;
use glacier_core::velocity::{VelocityEstimate, VelocityOutcome};
use tokio::sync::RwLock;

use crate::error::AppError;

/// Header carrying the client's session id.
pub const SESSION_HEADER: &str = "x-session-id";
/// Session used when the header is absent.
pub const DEFAULT_SESSION: &str = "default";

const MAX_SESSION_ID_LEN: usize = 128;

/// Sessions kept before the least recently updated one is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// The latest results of one session.
pub struct Session<R, F> {
    pub velocity: Option<VelocityOutcome<R, F>>,
    pub qa: Option<QaExchange>,
    /// Write sequence number of the last update.
    updated: u64,
}

impl<R, F> Default for Session<R, F> {
    fn default() -> Self {
        Self {
            velocity: None,
            qa: None,
            updated: 0,
        }
    }
}

struct Sessions<R, F> {
    by_id: HashMap<String, Session<R, F>>,
    writes: u64,
}

impl<R, F> Sessions<R, F> {
    /// The session's slots, creating them and evicting the least recently
    /// updated session when `capacity` is reached.
    fn touch(&mut self, session_id: &str, capacity: usize) -> &mut Session<R, F> {
        if !self.by_id.contains_key(session_id) && self.by_id.len() >= capacity {
            let oldest = self
                .by_id
                .iter()
                .min_by_key(|(_, s)| s.updated)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                self.by_id.remove(&oldest);
                tracing::debug!(session = %oldest, "Evicted least recently updated session");
            }
        }

        self.writes += 1;
        let session = self.by_id.entry(session_id.to_string()).or_default();
        session.updated = self.writes;
        session
    }
}

/// All sessions, keyed by session id, holding at most `capacity` of them.
///
/// Lives in an `Arc` inside the app state.
pub struct SessionStore<R, F> {
    sessions: RwLock<Sessions<R, F>>,
    capacity: usize,
}

impl<R: Clone, F: Clone> SessionStore<R, F> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(Sessions {
                by_id: HashMap::new(),
                writes: 0,
            }),
            capacity: capacity.max(1),
        }
    }

    /// Replace the session's velocity slot, success or failure alike.
    pub async fn set_velocity(&self, session_id: &str, outcome: VelocityOutcome<R, F>) {
        let mut sessions = self.sessions.write().await;
        sessions.touch(session_id, self.capacity).velocity = Some(outcome);
    }

    pub async fn latest_velocity(&self, session_id: &str) -> Option<VelocityOutcome<R, F>> {
        self.sessions
            .read()
            .await
            .by_id
            .get(session_id)
            .and_then(|s| s.velocity.clone())
    }

    /// The latest velocity outcome if it succeeded.
    pub async fn latest_estimate(&self, session_id: &str) -> Option<VelocityEstimate<R, F>> {
        self.latest_velocity(session_id).await.and_then(Result::ok)
    }

    pub async fn set_qa(&self, session_id: &str, exchange: QaExchange) {
        let mut sessions = self.sessions.write().await;
        sessions.touch(session_id, self.capacity).qa = Some(exchange);
    }

    pub async fn latest_qa(&self, session_id: &str) -> Option<QaExchange> {
        self.sessions
            .read()
            .await
            .by_id
            .get(session_id)
            .and_then(|s| s.qa.clone())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.by_id.len()
    }
}

impl<R: Clone, F: Clone> Default for SessionStore<R, F> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Session id taken from the `x-session-id` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(SESSION_HEADER) else {
            return Ok(Self(DEFAULT_SESSION.to_string()));
        };

        let id = value
            .to_str()
            .map_err(|_| AppError::BadRequest(format!("{SESSION_HEADER} must be ASCII")))?
            .trim();
        if id.is_empty() || id.len() > MAX_SESSION_ID_LEN {
            return Err(AppError::BadRequest(format!(
                "{SESSION_HEADER} must be 1-{MAX_SESSION_ID_LEN} characters"
            )));
        }
        Ok(Self(id.to_string()))
    }
}
