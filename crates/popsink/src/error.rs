//! Sink error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    /// The backing store could not be reached or authenticated against.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A single insert/flush against an otherwise healthy store failed.
    #[error("operation on `{store}` failed: {reason}")]
    Operation { store: String, reason: String },

    /// The sink was used before `connect` or after `disconnect`.
    #[error("sink is not connected")]
    NotConnected,

    /// A record did not carry the field named by the key hint.
    #[error("record is missing key field `{0}`")]
    MissingKey(String),

    /// A required sink setting was absent or invalid.
    #[error("sink configuration: {0}")]
    Config(String),
}

impl SinkError {
    pub(crate) fn connection(err: impl std::fmt::Display) -> Self {
        Self::Connection(err.to_string())
    }

    pub(crate) fn operation(store: &str, err: impl std::fmt::Display) -> Self {
        Self::Operation {
            store: store.to_string(),
            reason: err.to_string(),
        }
    }
}
