use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub whatsapp: WhatsAppSettings,
    pub groq: GroqSettings,
    pub mock_crm: MockCrmSettings,
    pub logging: LoggingSettings,
    pub localization: LocalizationSettings,
    pub security: SecuritySettings,
    pub session: SessionSettings,
    pub payment: PaymentSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunEnvironment {
    Development,
    Staging,
    Production,
}

impl RunEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunEnvironment::Development => "development",
            RunEnvironment::Staging => "staging",
            RunEnvironment::Production => "production",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppSettings {
    pub environment: RunEnvironment,
    pub debug: bool,
    pub secret_key: String,  // Chave para JWT e criptografia
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub mock_crm_port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,  // PostgreSQL (ainda sem conexão)
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RedisSettings {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WhatsAppSettings {
    pub api_url: String,
    pub access_token: Option<String>,
    pub phone_number_id: Option<String>,
    pub webhook_verify_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroqSettings {
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MockCrmSettings {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LocalizationSettings {
    pub language: String,
    pub timezone: String,
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecuritySettings {
    pub jwt_secret_key: String,
    pub jwt_algorithm: String,
    pub jwt_expire_minutes: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionSettings {
    pub timeout_minutes: u32,
    pub max_cpf_validation_attempts: u32,
    pub max_conversation_duration_minutes: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaymentSettings {
    pub boleto_expiration_days: u32,
    pub max_discount_percentage: f64,
    pub min_payment_amount: f64,  // Em BRL
}

/// Variáveis de ambiente sem prefixo e a chave que cada uma sobrescreve
const FLAT_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("ENVIRONMENT", "app.environment"),
    ("SECRET_KEY", "app.secret_key"),
    ("DATABASE_URL", "database.url"),
    ("REDIS_URL", "redis.url"),
    ("WHATSAPP_ACCESS_TOKEN", "whatsapp.access_token"),
    ("WHATSAPP_PHONE_NUMBER_ID", "whatsapp.phone_number_id"),
    ("WHATSAPP_WEBHOOK_VERIFY_TOKEN", "whatsapp.webhook_verify_token"),
    ("GROQ_API_KEY", "groq.api_key"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
    ("JWT_SECRET_KEY", "security.jwt_secret_key"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Self::defaults()?
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(
                Environment::with_prefix("CERTOBOT")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in FLAT_ENV_OVERRIDES {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(*key, value)?;
            }
        }

        Self::from_builder(builder)
    }

    /// Valores padrão de todos os campos opcionais
    ///
    /// `app.secret_key`, `database.url`, `redis.url` e
    /// `security.jwt_secret_key` não têm padrão e precisam vir de alguma fonte.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app.environment", "development")?
            .set_default("app.debug", true)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.mock_crm_port", 8001)?
            .set_default("whatsapp.api_url", "https://graph.facebook.com/v18.0")?
            .set_default("groq.model", "llama-3.1-70b-versatile")?
            .set_default("mock_crm.url", "http://localhost:8001")?
            .set_default("mock_crm.api_key", "mock-api-key-for-testing")?
            .set_default("logging.level", "INFO")?
            .set_default("logging.format", "json")?
            .set_default("localization.language", "pt-BR")?
            .set_default("localization.timezone", "America/Sao_Paulo")?
            .set_default("localization.currency", "BRL")?
            .set_default("security.jwt_algorithm", "HS256")?
            .set_default("security.jwt_expire_minutes", 30)?
            .set_default("session.timeout_minutes", 3)?
            .set_default("session.max_cpf_validation_attempts", 3)?
            .set_default("session.max_conversation_duration_minutes", 3)?
            .set_default("payment.boleto_expiration_days", 7)?
            .set_default("payment.max_discount_percentage", 50.0)?
            .set_default("payment.min_payment_amount", 10.0)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.app.environment == RunEnvironment::Development
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == RunEnvironment::Production
    }

    /// Host/banco da URL do PostgreSQL, sem credenciais
    pub fn database_display(&self) -> String {
        match self.database.url.rsplit_once('@') {
            Some((_, host)) => host.to_string(),
            None => "Not configured".to_string(),
        }
    }
}
