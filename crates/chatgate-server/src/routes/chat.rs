//! Chat routes — the uniform generate contract over HTTP.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;
use chatgate_core::{ConversationTurn, Error};
use chatgate_providers::config::ProviderConfigUpdate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/status", get(get_status))
        .route("/chat/config", get(get_config).put(update_config))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    /// Logical model key; unknown or absent keys resolve to the default.
    model: Option<String>,
    #[serde(default, rename = "conversationHistory")]
    conversation_history: Vec<ConversationTurn>,
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let start = Instant::now();
    let logical_key = req.model.as_deref().unwrap_or("");

    match state
        .dispatcher
        .generate(logical_key, &req.message, &req.conversation_history)
        .await
    {
        Ok(result) => {
            let duration = start.elapsed().as_millis() as u64;
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "message": result.reply_text,
                    "model": result.resolved_model_id,
                    "degraded": result.degraded,
                    "duration": duration,
                })),
            )
        }
        Err(e) => {
            let status = match &e {
                Error::ConfigurationMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
                Error::Backend { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(serde_json::json!({ "error": e.to_string() })))
        }
    }
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let providers = state.provider_config.read().to_response();
    let default = chatgate_core::default_descriptor();

    Json(serde_json::json!({
        "providers": providers,
        "browserSessionPresent": state.dispatcher.browser().session_present(),
        "defaultModel": default.logical_key,
    }))
}

async fn get_config(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let config = state.provider_config.read();
    Json(serde_json::to_value(config.to_response()).unwrap_or_default())
}

async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ProviderConfigUpdate>,
) -> impl IntoResponse {
    let mut config = state.provider_config.write();
    config.apply_update(&update);

    if let Err(e) = config.save() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": format!("Failed to save config: {}", e) })),
        );
    }

    (
        StatusCode::OK,
        Json(serde_json::to_value(config.to_response()).unwrap_or_default()),
    )
}
