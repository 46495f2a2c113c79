/// Health check endpoint

use axum::Json;
use serde_json::{json, Value};

/// Liveness probe; always 200 while the process is up
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
