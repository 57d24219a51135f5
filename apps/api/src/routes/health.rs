use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, the configured question backend and the
/// number of live sessions.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "talentscout-api",
        "backend": state.registry.backend_kind(),
        "max_questions": state.config.question_count,
        "sessions": state.registry.session_count().await
    }))
}
