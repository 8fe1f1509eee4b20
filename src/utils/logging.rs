use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingSettings};
use crate::validation::cpf::mask;

/// Mensagens de log em português por evento de conversa
pub static LOG_MESSAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("conversation_started", "Conversa iniciada com devedor"),
        ("cpf_validation_requested", "Validação de CPF solicitada"),
        ("cpf_validation_failed", "Falha na validação do CPF"),
        ("cpf_validation_success", "CPF validado com sucesso"),
        ("negotiation_started", "Negociação iniciada"),
        ("negotiation_completed", "Negociação concluída"),
        ("payment_agreement_reached", "Acordo de pagamento estabelecido"),
        ("boleto_generated", "Boleto gerado com sucesso"),
        ("conversation_timeout", "Conversa expirou por timeout"),
        ("system_error", "Erro do sistema"),
        ("whatsapp_message_sent", "Mensagem WhatsApp enviada"),
        ("whatsapp_message_received", "Mensagem WhatsApp recebida"),
        ("crm_update_success", "CRM atualizado com sucesso"),
        ("crm_update_failed", "Falha ao atualizar CRM"),
    ])
});

/// Mensagem em português do evento, ou a própria chave se não houver
pub fn event_message(event: &str) -> &str {
    LOG_MESSAGES.get(event).copied().unwrap_or(event)
}

/// Converte níveis como "INFO" ou "WARNING" em diretivas do EnvFilter
fn filter_directive(level: &str) -> String {
    match level.to_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    }
}

/// Instala o subscriber global
///
/// `RUST_LOG` tem prioridade sobre o nível configurado. Falha se já houver
/// um subscriber instalado.
pub fn init_tracing(
    settings: &LoggingSettings,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(&settings.level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match settings.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    }
}

/// Registra um evento de conversa no formato padrão
///
/// O CPF do devedor nunca sai em claro. Devolve o registro emitido.
pub fn log_conversation_event(
    event: &str,
    session_id: &str,
    debtor_cpf: Option<&str>,
    language: &str,
    context: Map<String, Value>,
) -> Value {
    let mut record = Map::new();
    record.insert("event".into(), json!(event));
    record.insert("session_id".into(), json!(session_id));
    record.insert("language".into(), json!(language));
    record.extend(context);

    if let Some(cpf) = debtor_cpf.filter(|c| !c.is_empty()) {
        record.insert("debtor_cpf".into(), json!(mask(cpf)));
    }

    let record = Value::Object(record);
    info!(
        target: "conversation",
        event = event,
        session_id = session_id,
        context = %record,
        "{}",
        event_message(event)
    );
    record
}

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_request_processed(endpoint: &str, status: u16, duration_ms: u64) {
    info!("Request processed: {} - Status: {} - Duration: {}ms",
          endpoint, status, duration_ms);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(service: &str, port: u16) {
    info!("🚀 Starting {} on port {}", service, port);
}

pub fn log_server_ready(port: u16) {
    info!("✅ Server ready and listening on http://0.0.0.0:{}", port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_validation_error(field: &str, message: &str) {
    warn!("Validation error: {} - {}", field, message);
}

pub fn log_info(message: &str) {
    info!("{}", message);
}
