use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::server::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Changes API",
            "version": version,
            "description": "Browse recorded changes and roll records back",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "index": "GET /changes?type=&id=&page=&per_page=",
                "show": "GET /changes/:id",
                "revert": "PUT|PATCH /changes/:id",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.versions.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "store": "ok" }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "version store unavailable",
                    "data": { "status": "degraded", "timestamp": now, "store_error": e.to_string() }
                })),
            )
        }
    }
}
