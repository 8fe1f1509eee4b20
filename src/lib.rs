// Biblioteca do Certobot
// Expõe módulos para uso em testes e nos binários (API e Mock CRM)

pub mod config;
pub mod handlers;
pub mod services;
pub mod utils;
pub mod validation;

/// Estado compartilhado, construído uma vez no entry point
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub cache: services::CacheService,
    pub cpf_validator: validation::CpfValidator,
}

impl AppState {
    pub fn new(settings: config::Settings) -> Self {
        Self {
            settings,
            cache: services::CacheService::new(),
            cpf_validator: validation::CpfValidator::new(),
        }
    }
}
