// HTTP surface
//
// GET  /          - endpoint index
// GET  /health    - liveness
// GET  /users     - member table (HTML)
// POST /webhooks  - directory change events
//
// Handlers only translate between HTTP and roster-core. Webhook senders
// always get 200 so they never redeliver; rejected events are logged by
// the processor.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use roster_core::{ChangeEventProcessor, ChangeOutcome, MemberStore};
use std::sync::Arc;
use tracing::error;

use crate::view::render_members;

const INDEX: &str = "rosterd directory membership sync\n\n\
GET  /health   - liveness\n\
GET  /users    - member table\n\
POST /webhooks - directory change events\n";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MemberStore>,
    pub processor: Arc<ChangeEventProcessor>,
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { INDEX }))
        .route("/health", get(health))
        .route("/users", get(list_users))
        .route("/webhooks", post(receive_webhook))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn list_users(State(state): State<AppState>) -> Response {
    match state.store.list_all().await {
        Ok(members) => Html(render_members(&members)).into_response(),
        Err(e) => {
            error!("Failed to list members: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list members").into_response()
        }
    }
}

async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    match state.processor.handle(&body).await {
        Ok(ChangeOutcome::Challenge(challenge)) => (
            StatusCode::OK,
            [("content-type", "text/plain; charset=utf-8")],
            challenge,
        )
            .into_response(),
        // Outcome already logged by the processor
        _ => StatusCode::OK.into_response(),
    }
}
