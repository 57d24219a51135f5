pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::conversation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions API
        .route("/api/v1/sessions", post(handlers::handle_start_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route("/api/v1/sessions/:id/turns", post(handlers::handle_turn))
        .route(
            "/api/v1/sessions/:id/profile",
            get(handlers::handle_get_profile),
        )
        .route(
            "/api/v1/sessions/:id/answers",
            get(handlers::handle_get_answers),
        )
        .route(
            "/api/v1/sessions/:id/consent",
            patch(handlers::handle_set_consent),
        )
        .with_state(state)
}
