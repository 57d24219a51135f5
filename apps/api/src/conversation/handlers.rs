//! Axum route handlers for the Sessions API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::engine::{AnswerRow, Phase, SessionState, TurnResponse};
use crate::errors::AppError;
use crate::intake::profile::CandidateProfile;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    #[serde(default)]
    pub consent: bool,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub response_text: String,
    pub phase: Phase,
    pub backend: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AnswersResponse {
    pub session_id: Uuid,
    pub answers: Vec<AnswerRow>,
}

#[derive(Debug, Deserialize)]
pub struct ConsentRequest {
    pub consent: bool,
}

#[derive(Debug, Serialize)]
pub struct ConsentResponse {
    pub session_id: Uuid,
    pub consent: bool,
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Starts a session. The body is optional; consent defaults to false.
pub async fn handle_start_session(
    State(state): State<AppState>,
    request: Option<Json<StartSessionRequest>>,
) -> Result<(StatusCode, Json<StartSessionResponse>), AppError> {
    let consent = request.map(|Json(r)| r.consent).unwrap_or(false);
    let (session_id, response_text) = state.registry.start_session(consent).await;

    Ok((
        StatusCode::CREATED,
        Json(StartSessionResponse {
            session_id,
            response_text,
            phase: Phase::Collecting { field_index: 0 },
            backend: state.registry.backend_kind(),
        }),
    ))
}

/// POST /api/v1/sessions/:id/turns
///
/// Feeds one candidate message to the session and returns the reply.
/// Over-long messages get a re-prompt from the engine, not an error.
pub async fn handle_turn(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    state
        .registry
        .handle_turn(id, &request.text)
        .await
        .map(Json)
        .ok_or_else(|| session_not_found(id))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionState>, AppError> {
    state
        .registry
        .snapshot(id)
        .await
        .map(Json)
        .ok_or_else(|| session_not_found(id))
}

/// GET /api/v1/sessions/:id/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidateProfile>, AppError> {
    state
        .registry
        .profile(id)
        .await
        .map(Json)
        .ok_or_else(|| session_not_found(id))
}

/// GET /api/v1/sessions/:id/answers
///
/// Q&A export: one row per recorded answer with its question and sentiment.
pub async fn handle_get_answers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnswersResponse>, AppError> {
    let answers = state
        .registry
        .answers(id)
        .await
        .ok_or_else(|| session_not_found(id))?;

    Ok(Json(AnswersResponse {
        session_id: id,
        answers,
    }))
}

/// PATCH /api/v1/sessions/:id/consent
pub async fn handle_set_consent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ConsentRequest>,
) -> Result<Json<ConsentResponse>, AppError> {
    if !state.registry.set_consent(id, request.consent).await {
        return Err(session_not_found(id));
    }
    Ok(Json(ConsentResponse {
        session_id: id,
        consent: request.consent,
    }))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.registry.remove(id).await {
        return Err(session_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
