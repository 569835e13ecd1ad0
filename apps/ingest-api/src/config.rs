//! Application configuration loaded from environment variables.
//!
//! Fail-fast: required variables must be present and valid, or the
//! application exits with a clear error message before binding anything.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use foliant_delivery::{RetryPolicy, TransportMode};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {cause}")]
    Invalid { name: &'static str, cause: String },
}

/// Runtime configuration for the ingest API server.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Base URL this service is reachable under; embedded in outbound
    /// download and callback URLs.
    pub public_base_url: String,
    /// Endpoint the external processor listens on.
    pub processor_webhook_url: String,
    /// Secret for HMAC-signing outbound webhook requests.
    pub webhook_signing_secret: Option<String>,
    pub transport_mode: TransportMode,
    pub retry_policy: RetryPolicy,
    pub sweep_interval: Duration,
    pub sweep_batch_size: i64,
    pub embedding_dimension: usize,
    pub rust_log: String,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let transport_mode = TransportMode::from_str(&optional("TRANSPORT_MODE", "webhook"))
            .map_err(|e| ConfigError::Invalid {
                name: "TRANSPORT_MODE",
                cause: e.to_string(),
            })?;

        let retry_policy = RetryPolicy {
            base_delay: Duration::from_secs(parsed("RETRY_BASE_DELAY_SECS", 60)?),
            max_delay: Duration::from_secs(parsed("RETRY_MAX_DELAY_SECS", 3600)?),
            max_retries: parsed("RETRY_MAX_RETRIES", 3)?,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 10)?,
            host: optional("HOST", "0.0.0.0"),
            port: parsed("PORT", 8080)?,
            public_base_url: required("PUBLIC_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            processor_webhook_url: required("PROCESSOR_WEBHOOK_URL")?,
            webhook_signing_secret: env::var("WEBHOOK_SIGNING_SECRET").ok(),
            transport_mode,
            retry_policy,
            sweep_interval: Duration::from_secs(parsed("RETRY_SWEEP_INTERVAL_SECS", 5)?),
            sweep_batch_size: parsed("RETRY_BATCH_SIZE", 10)?,
            embedding_dimension: parsed("EMBEDDING_DIMENSION", 1536)?,
            rust_log: optional("RUST_LOG", "info"),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            cause: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
