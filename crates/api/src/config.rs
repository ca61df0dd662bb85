//! Process configuration, read once from the environment at startup.

use std::net::{IpAddr, SocketAddr};

use loomworks_reports::{InactiveProductRate, SalaryPolicy};
use thiserror::Error;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Origins accepted in every environment unless `ALLOWED_ORIGINS` overrides them.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:3000",
    "http://localhost:8081",
    "http://127.0.0.1:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:8081",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value `{value}`: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(AppEnv::Development),
            "production" | "prod" => Some(AppEnv::Production),
            _ => None,
        }
    }

    pub fn is_production(self) -> bool {
        self == AppEnv::Production
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Postgres URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub allowed_origins: Vec<String>,
    pub app_env: AppEnv,
    pub salary_policy: SalaryPolicy,
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
            app_env: AppEnv::Development,
            salary_policy: SalaryPolicy::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset and blank variables
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = ApiConfig::default();

        if let Some(raw) = var("HOST") {
            config.host = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("HOST", &raw, e))?;
        }
        if let Some(raw) = var("PORT") {
            config.port = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("PORT", &raw, e))?;
        }
        config.database_url = var("DATABASE_URL").map(|v| v.trim().to_string());
        if let Some(raw) = var("DATABASE_MAX_CONNECTIONS") {
            config.database_max_connections = match raw.trim().parse::<u32>() {
                Ok(0) => return Err(ConfigError::invalid("DATABASE_MAX_CONNECTIONS", &raw, "must be at least 1")),
                Ok(n) => n,
                Err(e) => return Err(ConfigError::invalid("DATABASE_MAX_CONNECTIONS", &raw, e)),
            };
        }
        if let Some(raw) = var("ALLOWED_ORIGINS") {
            config.allowed_origins = raw
                .split(',')
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(raw) = var("APP_ENV") {
            config.app_env = AppEnv::parse(&raw)
                .ok_or_else(|| ConfigError::invalid("APP_ENV", &raw, "expected `development` or `production`"))?;
        }
        if let Some(raw) = var("SALARY_INACTIVE_PRODUCT_RATE") {
            let rate: InactiveProductRate = raw
                .parse()
                .map_err(|e: String| ConfigError::invalid("SALARY_INACTIVE_PRODUCT_RATE", &raw, e))?;
            config.salary_policy = SalaryPolicy {
                inactive_product_rate: rate,
            };
        }
        if let Some(raw) = var("MAX_BODY_BYTES") {
            config.max_body_bytes = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("MAX_BODY_BYTES", &raw, e))?;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
