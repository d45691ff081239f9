/*
 * Responsibility
 * - Read environment variables / .env (PORT, APP_ENV, CLAIM_* settings)
 * - Validate settings up front (missing or malformed values fail startup)
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::services::claims::{ClaimHeaderConfig, TokenScheme, parse_fallbacks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("invalid header name in {key}: {value:?}")]
    InvalidHeaderName { key: &'static str, value: String },
    #[error("invalid configuration: CLAIM_FALLBACKS: {0}")]
    Fallbacks(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub request_timeout: Duration,
    pub claim_header: ClaimHeaderConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        let request_timeout = lookup("REQUEST_TIMEOUT_SECONDS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"))?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let source_header = required("CLAIM_SOURCE_HEADER")?;
        let claim_field = required("CLAIM_FIELD")?;
        let destination_header = required("CLAIM_DESTINATION_HEADER")?;

        let token_scheme = match lookup("CLAIM_TOKEN_SCHEME") {
            Some(raw) => TokenScheme::from_str(&raw)
                .map_err(|_| ConfigError::Invalid("CLAIM_TOKEN_SCHEME"))?,
            None => TokenScheme::default(),
        };

        let fallbacks = match lookup("CLAIM_FALLBACKS") {
            Some(raw) if !raw.trim().is_empty() => parse_fallbacks(&raw)?,
            _ => Vec::new(),
        };

        let debug = match lookup("CLAIM_DEBUG") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid("CLAIM_DEBUG"))?,
            None => false,
        };

        Ok(Self {
            addr,
            app_env,
            request_timeout,
            claim_header: ClaimHeaderConfig {
                source_header,
                claim_field,
                destination_header,
                token_scheme,
                fallbacks,
                debug,
            },
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
