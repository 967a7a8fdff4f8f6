//! Handlers for the glacier Q&A.

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::Json;
use glacier_core::climate::{sample_climate, ClimateVariable};
use glacier_core::context::build_context;
use glacier_core::error::CoreError;
use glacier_core::geo::GeoBackend;
use glacier_core::qa::{suggest_questions, validate_question, QaExchange, DOWNLOAD_FILENAME};
use glacier_core::sites::CUSTOM_LOCATION;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::params::ClimateParams;
use crate::response::DataResponse;
use crate::session::SessionId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(flatten)]
    pub selection: ClimateParams,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    /// The context the model was given.
    pub context: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    pub glacier: Option<String>,
    pub variable: Option<String>,
}

// ---------------------------------------------------------------------------
// POST /qa/ask
// ---------------------------------------------------------------------------

/// Answer a question about the current selection.
///
/// The context includes the climate statistic for the selected month (left
/// out if sampling fails) and the session's latest successful velocity
/// result. Generation failures come back as an answer text, not an error.
pub async fn ask<B: GeoBackend>(
    State(state): State<AppState<B>>,
    session: SessionId,
    Json(body): Json<AskRequest>,
) -> AppResult<impl IntoResponse> {
    let question = validate_question(&body.question)?.to_string();
    let variable = body.selection.variable()?;
    let date = body.selection.date()?;
    let (info, location) = body.selection.location.resolve()?;

    let stats = match sample_climate(state.backend.as_ref(), &location, date, variable).await {
        Ok(sample) => sample.stats,
        Err(e) => {
            tracing::warn!(error = %e, "Climate sampling failed, answering without statistics");
            None
        }
    };
    let velocity = state
        .sessions
        .latest_estimate(session.as_str())
        .await
        .map(|estimate| estimate.summary());

    let context = build_context(&info, variable, date, stats.as_ref(), velocity.as_ref());
    let answer = state.qa.answer(&question, &context).await;

    tracing::info!(
        session = %session.as_str(),
        glacier = %info.name,
        has_velocity = velocity.is_some(),
        answer_chars = answer.len(),
        "Question answered",
    );

    let exchange = QaExchange {
        question: question.clone(),
        answer: answer.clone(),
    };
    state.sessions.set_qa(session.as_str(), exchange).await;

    Ok(Json(DataResponse {
        data: AskResponse {
            question,
            answer,
            context,
        },
    }))
}

// ---------------------------------------------------------------------------
// GET /qa/suggestions
// ---------------------------------------------------------------------------

pub async fn suggestions<B: GeoBackend>(
    State(state): State<AppState<B>>,
    session: SessionId,
    Query(query): Query<SuggestionQuery>,
) -> AppResult<impl IntoResponse> {
    let variable = match query.variable.as_deref() {
        Some(raw) => ClimateVariable::parse(raw)?,
        None => ClimateVariable::AirTemperature,
    };
    let name = query
        .glacier
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(CUSTOM_LOCATION);
    let has_velocity = state
        .sessions
        .latest_estimate(session.as_str())
        .await
        .is_some();

    Ok(Json(DataResponse {
        data: suggest_questions(name, variable.label(), has_velocity),
    }))
}

// ---------------------------------------------------------------------------
// GET /qa/latest
// ---------------------------------------------------------------------------

pub async fn latest<B: GeoBackend>(
    State(state): State<AppState<B>>,
    session: SessionId,
) -> AppResult<impl IntoResponse> {
    let exchange = latest_exchange(&state, &session).await?;
    Ok(Json(DataResponse { data: exchange }))
}

// ---------------------------------------------------------------------------
// GET /qa/latest/download
// ---------------------------------------------------------------------------

/// The latest exchange as a plain-text attachment.
pub async fn download<B: GeoBackend>(
    State(state): State<AppState<B>>,
    session: SessionId,
) -> AppResult<impl IntoResponse> {
    let exchange = latest_exchange(&state, &session).await?;
    let disposition = format!("attachment; filename=\"{DOWNLOAD_FILENAME}\"");

    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        exchange.download_text(),
    ))
}

async fn latest_exchange<B: GeoBackend>(
    state: &AppState<B>,
    session: &SessionId,
) -> Result<QaExchange, CoreError> {
    state
        .sessions
        .latest_qa(session.as_str())
        .await
        .ok_or_else(|| CoreError::NotFound("Q&A exchange".into()))
}
