//! Webhook update source

use super::types::Update;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tokio::sync::mpsc;

/// Header Telegram uses to echo the secret given to `setWebhook`
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct WebhookState {
    tx: mpsc::Sender<Update>,
    secret: Option<String>,
}

impl WebhookState {
    pub fn new(tx: mpsc::Sender<Update>, secret: Option<String>) -> Self {
        Self { tx, secret }
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.secret else {
            return true;
        };
        headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|given| given == expected)
    }
}

pub fn webhook_router(state: WebhookState) -> Router {
    Router::new()
        .route("/telegram/webhook", post(receive_update))
        .route("/health", get(health))
        .with_state(state)
}

async fn receive_update(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    if !state.authorized(&headers) {
        tracing::warn!(update_id = update.update_id, "Rejected webhook call with bad secret");
        return StatusCode::UNAUTHORIZED;
    }

    if state.tx.send(update).await.is_err() {
        tracing::error!("Update channel closed, refusing webhook call");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

async fn health() -> &'static str {
    "ok"
}
