use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

#[derive(Clone, Debug)]
pub struct SystemInfo {
    pub version: String,
    pub started_at: DateTime<Utc>,
}

impl SystemInfo {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            started_at: Utc::now(),
        }
    }
}

pub fn routes(info: SystemInfo) -> Router {
    Router::new()
        .route("/alive", get(is_alive))
        .route("/version", get(version))
        .with_state(info)
}

/// GET /system/alive
async fn is_alive() -> &'static str {
    "OK"
}

/// GET /system/version
async fn version(State(info): State<SystemInfo>) -> Json<Value> {
    Json(json!({
        "version": info.version,
        "started_at": info.started_at.to_rfc3339(),
    }))
}
