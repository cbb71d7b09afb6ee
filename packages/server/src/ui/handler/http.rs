//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{infrastructure::dto::http::GatewayStatusDto, ui::state::AppState};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current connections of the gateway
pub async fn ws_status(State(state): State<Arc<AppState>>) -> Json<GatewayStatusDto> {
    let connections = state.get_status_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(GatewayStatusDto::from(connections))
}
