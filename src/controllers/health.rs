use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::infrastructure::storage::FileStore;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(storage): State<Arc<FileStore>>) -> impl IntoResponse {
    match tokio::fs::metadata(storage.root()).await {
        Ok(metadata) if metadata.is_dir() => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "storage": "available"
            })),
        ),
        _ => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "storage": "unavailable"
            })),
        ),
    }
}
