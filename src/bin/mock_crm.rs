/// Mock CRM API
///
/// Simula o CRM com dados de devedores brasileiros para testes do Certobot.

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;

use certobot::config::Settings;
use certobot::handlers::mock_crm;
use certobot::utils::logging::*;
use certobot::utils::{shutdown_signal, AppError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()
        .map_err(|e| AppError::ConfigError(format!("Failed to load settings: {}", e)))?;

    if let Err(e) = init_tracing(&settings.logging) {
        eprintln!("⚠️ Falha ao inicializar tracing: {}", e);
    }

    log_info(&format!("🏢 Starting Mock CRM API in {} mode", settings.app.environment.as_str()));
    log_info(&format!("📊 Database: {}", settings.database_display()));
    log_info(&format!("🌍 Language: {}", settings.localization.language));

    let port = settings.server.mock_crm_port;
    let address = format!("{}:{}", settings.server.host, port);
    let app = mock_crm::router(Arc::new(settings));

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;

    log_server_startup("Mock CRM API", port);
    log_server_ready(port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info("🛑 Shutting down Mock CRM API");
    Ok(())
}
