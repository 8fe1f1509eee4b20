/// Certobot API
///
/// Sistema conversacional de cobrança via WhatsApp em português do Brasil.
/// Nesta fase a API expõe health checks e a validação de CPF; os módulos de
/// WhatsApp, negociação, pagamento e CRM ainda não existem.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use certobot::config::Settings;
use certobot::services::cache::CLEANUP_INTERVAL_SECONDS;
use certobot::utils::logging::*;
use certobot::utils::{shutdown_signal, AppError};
use certobot::{handlers, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 🔧 Carregar variáveis de ambiente do arquivo .env (se existir)
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let settings = Settings::new()
        .map_err(|e| AppError::ConfigError(format!("Failed to load settings: {}", e)))?;

    if let Err(e) = init_tracing(&settings.logging) {
        eprintln!("⚠️ Falha ao inicializar tracing: {}", e);
    }

    if dotenv_loaded {
        log_info("✅ Arquivo .env carregado com sucesso");
    } else {
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    }

    log_config_loaded(settings.app.environment.as_str());
    log_info(&format!("🚀 Starting Certobot API in {} mode", settings.app.environment.as_str()));
    log_info(&format!("📊 Database: {}", settings.database_display()));
    log_info(&format!("🔄 Redis: {}", settings.redis.url));
    log_info(&format!("🌍 Language: {}", settings.localization.language));

    let port = settings.server.port;
    let address = format!("{}:{}", settings.server.host, port);

    let app_state = Arc::new(AppState::new(settings));
    app_state
        .cache
        .clone()
        .start_cleanup(Duration::from_secs(CLEANUP_INTERVAL_SECONDS));
    let app = handlers::router(app_state);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;

    log_server_startup("Certobot API", port);
    log_server_ready(port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info("🛑 Shutting down Certobot API");
    Ok(())
}
