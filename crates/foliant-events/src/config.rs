//! Kafka connection configuration.

use crate::error::EventError;
use std::env;
use std::str::FromStr;

/// Security protocol for the broker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityProtocol {
    /// Plaintext connection (no encryption).
    Plaintext,
    /// TLS-encrypted connection.
    Ssl,
}

impl FromStr for SecurityProtocol {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PLAINTEXT" => Ok(Self::Plaintext),
            "SSL" => Ok(Self::Ssl),
            _ => Err(EventError::ConfigInvalid {
                var: "KAFKA_SECURITY_PROTOCOL".to_string(),
                reason: format!("Unknown protocol: {s}"),
            }),
        }
    }
}

impl SecurityProtocol {
    /// rdkafka configuration string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plaintext => "PLAINTEXT",
            Self::Ssl => "SSL",
        }
    }
}

/// Kafka connection configuration.
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Comma-separated list of broker addresses.
    pub bootstrap_servers: String,
    /// Security protocol.
    pub security_protocol: SecurityProtocol,
    /// Client identifier.
    pub client_id: String,
}

impl KafkaConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `KAFKA_BOOTSTRAP_SERVERS`.
    /// Optional: `KAFKA_SECURITY_PROTOCOL` (PLAINTEXT default, or SSL),
    /// `KAFKA_CLIENT_ID` (default "foliant-events").
    pub fn from_env() -> Result<Self, EventError> {
        let bootstrap_servers =
            env::var("KAFKA_BOOTSTRAP_SERVERS").map_err(|_| EventError::ConfigMissing {
                var: "KAFKA_BOOTSTRAP_SERVERS".to_string(),
            })?;

        let security_protocol = match env::var("KAFKA_SECURITY_PROTOCOL") {
            Ok(v) => SecurityProtocol::from_str(&v)?,
            Err(_) => SecurityProtocol::Plaintext,
        };

        let client_id =
            env::var("KAFKA_CLIENT_ID").unwrap_or_else(|_| "foliant-events".to_string());

        Ok(Self {
            bootstrap_servers,
            security_protocol,
            client_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_parsing() {
        assert_eq!(
            SecurityProtocol::from_str("plaintext").unwrap(),
            SecurityProtocol::Plaintext
        );
        assert_eq!(
            SecurityProtocol::from_str("SSL").unwrap(),
            SecurityProtocol::Ssl
        );
        assert!(SecurityProtocol::from_str("SASL_SSL").is_err());
    }

    #[test]
    fn test_protocol_as_str_roundtrip() {
        for p in [SecurityProtocol::Plaintext, SecurityProtocol::Ssl] {
            assert_eq!(SecurityProtocol::from_str(p.as_str()).unwrap(), p);
        }
    }
}
