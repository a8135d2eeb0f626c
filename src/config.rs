use config::{Config, Environment};
use log::{info, warn};
use serde::{Serialize, Deserialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("JWT_SECRET must be set")]
    MissingJwtSecret,
    #[error("Unknown AI provider: {0}")]
    UnknownProvider(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub storage_backend: StorageBackend,

    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub anthropic_base_url: String,
    pub default_ai_provider: String,
    pub ai_timeout_secs: u64,

    pub jwt_secret: String,
    pub admin_email: Option<String>,
    pub fallback_cache_path: Option<String>,
    pub session_idle_minutes: i64,
}

const DEFAULTS: &[(&str, &str)] = &[
    ("host", "0.0.0.0"),
    ("port", "8000"),
    ("db_host", "localhost"),
    ("db_port", "5432"),
    ("db_name", "leadership4dx"),
    ("db_user", "leadership4dx"),
    ("db_password", ""),
    ("storage_backend", "postgres"),
    ("openai_model", "gpt-4.1-mini"),
    ("openai_base_url", "https://api.openai.com/v1"),
    ("anthropic_model", "claude-sonnet-4-20250514"),
    ("anthropic_base_url", "https://api.anthropic.com/v1"),
    ("default_ai_provider", "openai"),
    ("ai_timeout_secs", "60"),
    ("jwt_secret", ""),
    ("session_idle_minutes", "120"),
];

impl Settings {
    /// Load from process environment on top of the built-in defaults.
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();
        for (key, value) in DEFAULTS {
            builder = builder.set_default(*key, *value)?;
        }

        let settings: Settings = builder
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.checked()
    }

    /// Build settings from explicit key/value pairs only. Used by tests and tools.
    pub fn from_overrides(overrides: &[(&str, &str)]) -> Result<Self> {
        let mut builder = Config::builder();
        for (key, value) in DEFAULTS {
            builder = builder.set_default(*key, *value)?;
        }
        for (key, value) in overrides {
            builder = builder.set_override(key.to_lowercase(), *value)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.checked()
    }

    fn checked(mut self) -> Result<Self> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }

        // empty env vars count as unset
        for key in [
            &mut self.openai_api_key,
            &mut self.anthropic_api_key,
            &mut self.admin_email,
            &mut self.fallback_cache_path,
        ] {
            if key.as_deref().map_or(false, |v| v.trim().is_empty()) {
                *key = None;
            }
        }

        self.default_ai_provider = self.default_ai_provider.to_lowercase();
        if !matches!(self.default_ai_provider.as_str(), "openai" | "anthropic") {
            return Err(ConfigError::UnknownProvider(self.default_ai_provider));
        }

        if self.openai_api_key.is_none() && self.anthropic_api_key.is_none() {
            warn!("⚠️ No AI provider keys configured - AI insights are disabled");
        }

        info!(
            "Configuration loaded (storage: {:?}, default AI provider: {})",
            self.storage_backend, self.default_ai_provider
        );

        Ok(self)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_the_secret_is_set() {
        let settings = Settings::from_overrides(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.storage_backend, StorageBackend::Postgres);
        assert_eq!(settings.default_ai_provider, "openai");
        assert!(settings.openai_api_key.is_none());
        assert_eq!(settings.bind_address(), "0.0.0.0:8000");
        assert_eq!(settings.session_idle_minutes, 120);
    }

    #[test]
    fn missing_secret_is_rejected() {
        assert!(matches!(
            Settings::from_overrides(&[]),
            Err(ConfigError::MissingJwtSecret)
        ));
    }

    #[test]
    fn overrides_are_parsed() {
        let settings = Settings::from_overrides(&[
            ("JWT_SECRET", "x"),
            ("PORT", "9100"),
            ("STORAGE_BACKEND", "memory"),
            ("DEFAULT_AI_PROVIDER", "Anthropic"),
            ("OPENAI_API_KEY", ""),
            ("ADMIN_EMAIL", "admin@example.com"),
        ])
        .unwrap();
        assert_eq!(settings.port, 9100);
        assert_eq!(settings.storage_backend, StorageBackend::Memory);
        assert_eq!(settings.default_ai_provider, "anthropic");
        assert!(settings.openai_api_key.is_none());
        assert_eq!(settings.admin_email.as_deref(), Some("admin@example.com"));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let result = Settings::from_overrides(&[("JWT_SECRET", "x"), ("DEFAULT_AI_PROVIDER", "gemini")]);
        assert!(matches!(result, Err(ConfigError::UnknownProvider(p)) if p == "gemini"));
    }

    #[test]
    fn database_url_is_assembled() {
        let settings = Settings::from_overrides(&[
            ("JWT_SECRET", "x"),
            ("DB_USER", "app"),
            ("DB_PASSWORD", "pw"),
            ("DB_HOST", "db"),
        ])
        .unwrap();
        assert_eq!(settings.database_url(), "postgres://app:pw@db:5432/leadership4dx");
    }
}
