use axum::{body::Bytes, extract::State, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use std::sync::Arc;
use tokio::time::Instant;

use super::CPF_VALIDATION_PATH;
use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};
use crate::validation::mask;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CpfValidationRequest {
    #[serde(default)]
    pub cpf: Option<String>,
    /// Sessão de conversa; quando presente, as tentativas são contadas
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CpfValidationResponse {
    pub valid: bool,
    pub formatted: Option<String>,
    pub cpf_masked: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub attempts_remaining: Option<u32>,
}

fn attempts_key(session_id: &str) -> String {
    format!("cpf_attempts:{}", session_id)
}

/// Handler de `POST /api/v1/validation/cpf`
///
/// CPF inválido não é erro HTTP: volta 200 com `valid = false` para que a
/// conversa possa pedir o CPF de novo. Só o limite de tentativas por sessão
/// (`session.max_cpf_validation_attempts`) gera 429.
pub async fn validate_cpf(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<CpfValidationResponse>> {
    let start_time = Instant::now();
    log_request_received(CPF_VALIDATION_PATH, "POST");

    let request: CpfValidationRequest = serde_json::from_slice(&body).map_err(|e| {
        log_validation_error("body", &e.to_string());
        AppError::from(e)
    })?;

    let cpf = request.cpf.as_deref();
    let session_id = request.session_id.as_deref().filter(|s| !s.is_empty());
    let language = state.settings.localization.language.as_str();

    log_conversation_event(
        "cpf_validation_requested",
        session_id.unwrap_or("anonymous"),
        cpf,
        language,
        Map::new(),
    );

    let attempts = match session_id {
        Some(id) => Some(register_attempt(&state, id).await?),
        None => None,
    };

    let parsed = state.cpf_validator.parse(cpf);
    let valid = parsed.is_some();

    let mut context = Map::new();
    if let Some(n) = attempts {
        context.insert("attempt".into(), json!(n));
    }
    log_conversation_event(
        if valid { "cpf_validation_success" } else { "cpf_validation_failed" },
        session_id.unwrap_or("anonymous"),
        cpf,
        language,
        context,
    );

    // CPF confirmado encerra a contagem da sessão
    if valid {
        if let Some(id) = session_id {
            state.cache.delete(&attempts_key(id)).await;
        }
    }

    let max_attempts = state.settings.session.max_cpf_validation_attempts;
    let response = CpfValidationResponse {
        valid,
        formatted: parsed.map(|c| c.to_string()),
        cpf_masked: mask(cpf.unwrap_or_default()),
        attempts_remaining: attempts.map(|n| max_attempts.saturating_sub(n)),
    };

    log_request_processed(
        CPF_VALIDATION_PATH,
        200,
        start_time.elapsed().as_millis() as u64,
    );
    Ok(Json(response))
}

/// Conta mais uma tentativa da sessão; erro se passou do limite
async fn register_attempt(state: &AppState, session_id: &str) -> AppResult<u32> {
    let max_attempts = state.settings.session.max_cpf_validation_attempts;
    let ttl_seconds = u64::from(state.settings.session.timeout_minutes) * 60;

    let attempts = state
        .cache
        .increment(&attempts_key(session_id), Some(ttl_seconds))
        .await;

    if attempts > i64::from(max_attempts) {
        let mut context = Map::new();
        context.insert("reason".into(), json!("max_attempts_exceeded"));
        context.insert("attempt".into(), json!(attempts));
        log_conversation_event(
            "cpf_validation_failed",
            session_id,
            None,
            &state.settings.localization.language,
            context,
        );
        return Err(AppError::TooManyAttempts(format!(
            "Limite de {} tentativas de validação de CPF excedido",
            max_attempts
        )));
    }

    Ok(u32::try_from(attempts).unwrap_or(max_attempts))
}
