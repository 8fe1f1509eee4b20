use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::utils::logging::*;
use crate::AppState;

pub async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "message": "Certobot API - Sistema de Cobrança Conversacional",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.settings.app.environment.as_str(),
        "language": state.settings.localization.language,
        "status": "running"
    }))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "environment": state.settings.app.environment.as_str(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
