//! Sink selection and connection settings.

use std::str::FromStr;

use crate::error::SinkError;
use crate::retry::RetryPolicy;

/// The closed set of supported sink kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Document,
    Relational,
    KeyValue,
    Event,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Document => "document",
            SinkKind::Relational => "relational",
            SinkKind::KeyValue => "keyvalue",
            SinkKind::Event => "event",
        }
    }
}

impl FromStr for SinkKind {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "document" | "mongodb" => Ok(SinkKind::Document),
            "relational" | "postgres" => Ok(SinkKind::Relational),
            "keyvalue" | "redis" => Ok(SinkKind::KeyValue),
            "event" | "kafka" => Ok(SinkKind::Event),
            other => Err(SinkError::Config(format!("unknown sink kind `{other}`"))),
        }
    }
}

/// Connection settings for all sink variants. Only the fields for the
/// selected kind are required; the factory validates the rest.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub kind: SinkKind,
    pub retry: RetryPolicy,

    /// Document store (MongoDB).
    pub mongo_uri: Option<String>,
    pub mongo_database: Option<String>,

    /// Relational store (PostgreSQL).
    pub database_url: Option<String>,

    /// Key-value store (Redis).
    pub redis_url: Option<String>,
    pub redis_ttl_secs: Option<u64>,

    /// Event store (Kafka).
    pub kafka_brokers: Option<String>,
    pub kafka_timeout_ms: u64,
}

impl SinkConfig {
    pub(crate) fn require<'a>(
        field: Option<&'a String>,
        name: &str,
        kind: SinkKind,
    ) -> Result<&'a str, SinkError> {
        field.map(|s| s.as_str()).ok_or_else(|| {
            SinkError::Config(format!("{name} is required for the {} sink", kind.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_aliases() {
        assert_eq!(SinkKind::from_str("document").unwrap(), SinkKind::Document);
        assert_eq!(SinkKind::from_str("postgres").unwrap(), SinkKind::Relational);
        assert_eq!(SinkKind::from_str("Redis").unwrap(), SinkKind::KeyValue);
        assert_eq!(SinkKind::from_str("kafka").unwrap(), SinkKind::Event);
        assert!(SinkKind::from_str("carrier-pigeon").is_err());
    }
}
