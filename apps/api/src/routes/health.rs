use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Reports service version, which generator and draft backends are active, and
/// how many wizards are open.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "smartcareer",
        "generator": state.generator.backend_name(),
        "drafts": if state.config.redis_url.is_some() { "redis" } else { "memory" },
        "open_wizards": state.sessions.open_count().await,
    }))
}
