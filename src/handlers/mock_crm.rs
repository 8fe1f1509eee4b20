//! Mock CRM: simula o CRM para testes do Certobot
//!
//! Por enquanto só expõe raiz e health check.

use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::cors_layer;
use crate::config::Settings;
use crate::utils::logging::log_health_check;

/// Quantidade de devedores fictícios anunciada pelo mock
pub const MOCK_DEBTORS_AVAILABLE: u32 = 100;

pub fn router(settings: Arc<Settings>) -> Router {
    let cors = cors_layer(&settings);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(settings)
}

async fn root(State(settings): State<Arc<Settings>>) -> Json<Value> {
    Json(json!({
        "message": "Mock CRM API - Sistema de CRM Simulado",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": settings.app.environment.as_str(),
        "language": settings.localization.language,
        "status": "running",
        "mock_debtors_available": MOCK_DEBTORS_AVAILABLE
    }))
}

async fn health_check(State(settings): State<Arc<Settings>>) -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "environment": settings.app.environment.as_str(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "mock-crm"
    }))
}
