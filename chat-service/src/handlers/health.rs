use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Health check endpoint for container liveness checks.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.chat_model.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "chat-service",
                "model": state.chat_model.model_name(),
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "chat-service",
                "error": e.to_string()
            })),
        ),
    }
}

/// Readiness check endpoint.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.chat_model.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
