use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde_json::json;

#[derive(Clone)]
struct SystemInfo {
    version: String,
    storage_enabled: bool,
}

pub fn routes(version: String, storage_enabled: bool) -> Router {
    Router::new()
        .route("/alive", get(is_alive))
        .route("/version", get(version_info))
        .with_state(SystemInfo {
            version,
            storage_enabled,
        })
}

/// GET /system/alive
async fn is_alive() -> &'static str {
    "OK"
}

/// GET /system/version
async fn version_info(State(info): State<SystemInfo>) -> Json<serde_json::Value> {
    Json(json!({
        "version": info.version,
        "storage": if info.storage_enabled { "enabled" } else { "disabled" },
    }))
}
