//! Model picker listing.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;
use chatgate_core::registry;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/models", get(list_models))
}

async fn list_models() -> Json<serde_json::Value> {
    let models: Vec<serde_json::Value> = registry::all_descriptors()
        .into_iter()
        .map(|d| {
            serde_json::json!({
                "key": d.logical_key,
                "vendor": d.vendor.to_string(),
                "model": d.model_id,
                "light": d.is_light(),
            })
        })
        .collect();

    Json(serde_json::json!({
        "models": models,
        "default": registry::default_descriptor().logical_key,
    }))
}
