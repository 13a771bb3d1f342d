//! Error types for the generation engine.

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    /// A weighted option set was constructed from an empty list.
    #[error("empty option set")]
    EmptyOptionSet,

    /// Every weight in an option set was zero.
    #[error("option weights sum to zero")]
    ZeroTotalWeight,

    /// An individual weight was negative or not finite.
    #[error("invalid weight at index {0}: weights must be positive and finite")]
    InvalidWeight(usize),

    /// The uniqueness scope could not yield a fresh identifier.
    #[error("could not produce a fresh identifier after {attempts} attempts")]
    IdentifierExhausted { attempts: u32 },

    /// A geographic or bank lookup had no data. Normally degraded to a
    /// placeholder and logged rather than propagated.
    #[error("reference data missing: {0}")]
    ReferenceData(String),

    /// A seed data file could not be read or parsed.
    #[error("seed data: {0}")]
    Seed(String),

    #[error("invalid date `{0}`: expected YY/MM/DD")]
    InvalidDate(String),

    #[error("record encoding: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Sink(#[from] popsink::SinkError),
}
