// Handlers HTTP da API Certobot e do Mock CRM
pub mod health;
pub mod mock_crm;
pub mod validation;

pub use health::*;
pub use validation::*;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::AppState;

pub const CPF_VALIDATION_PATH: &str = "/api/v1/validation/cpf";

/// Rotas da API Certobot
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.settings);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route(CPF_VALIDATION_PATH, post(validate_cpf))
        // TODO: routers de whatsapp, negotiation, payment e crm quando houver lógica
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS aberto em desenvolvimento, fechado nos outros ambientes
pub fn cors_layer(settings: &Settings) -> CorsLayer {
    if settings.is_development() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::response::Response;
    use http_body_util::BodyExt;
    use serde_json::Value;

    use crate::config::Settings;

    pub fn settings(environment: &str) -> Settings {
        let builder = Settings::defaults()
            .unwrap()
            .set_override("app.environment", environment)
            .unwrap()
            .set_override("app.secret_key", "segredo")
            .unwrap()
            .set_override("database.url", "postgresql://user:senha@db:5432/certobot")
            .unwrap()
            .set_override("redis.url", "redis://redis:6379/0")
            .unwrap()
            .set_override("security.jwt_secret_key", "jwt-segredo")
            .unwrap();
        Settings::from_builder(builder).unwrap()
    }

    pub async fn json_body(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }
}
