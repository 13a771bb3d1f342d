//! Pluggable record sinks for popgen.
//!
//! The generation engine only ever needs three operations against a store:
//! connect once, insert batches of documents keyed by a logical store name,
//! and disconnect. This crate provides that capability interface
//! ([`RecordSink`]), four conforming adapters behind one tagged union
//! ([`AnySink`]), and a factory keyed on configuration
//! ([`AnySink::from_config`]).
//!
//! `insert` always takes a sequence of records, possibly of length one;
//! there is no separate single-record path.

pub mod config;
pub mod error;
pub mod retry;

mod document;
mod event;
mod keyvalue;
mod relational;

pub use config::{SinkConfig, SinkKind};
pub use document::DocumentSink;
pub use error::SinkError;
pub use event::EventSink;
pub use keyvalue::KeyValueSink;
pub use relational::RelationalSink;
pub use retry::RetryPolicy;

use serde_json::Value;

/// Capability interface every sink variant conforms to.
#[allow(async_fn_in_trait)]
pub trait RecordSink {
    /// Acquires the underlying connection. Must be called once before any
    /// insert; fails with [`SinkError::Connection`].
    async fn connect(&mut self) -> Result<(), SinkError>;

    /// Inserts a batch of records into the named logical store and returns
    /// the identifiers of the inserted records. `key_hint` names the record
    /// field used as the storage key where the backend needs one.
    async fn insert(
        &self,
        records: &[Value],
        store: &str,
        key_hint: Option<&str>,
    ) -> Result<Vec<String>, SinkError>;

    /// Releases the underlying connection.
    async fn disconnect(&mut self) -> Result<(), SinkError>;
}

/// The closed set of sink variants, selected by [`SinkKind`].
pub enum AnySink {
    Document(DocumentSink),
    Relational(RelationalSink),
    KeyValue(KeyValueSink),
    Event(EventSink),
}

impl AnySink {
    /// Builds the configured sink variant. Fails with [`SinkError::Config`]
    /// when a setting required by the selected kind is missing.
    pub fn from_config(cfg: &SinkConfig) -> Result<Self, SinkError> {
        match cfg.kind {
            SinkKind::Document => Ok(AnySink::Document(DocumentSink::from_config(cfg)?)),
            SinkKind::Relational => Ok(AnySink::Relational(RelationalSink::from_config(cfg)?)),
            SinkKind::KeyValue => Ok(AnySink::KeyValue(KeyValueSink::from_config(cfg)?)),
            SinkKind::Event => Ok(AnySink::Event(EventSink::from_config(cfg)?)),
        }
    }

    pub fn kind(&self) -> SinkKind {
        match self {
            AnySink::Document(_) => SinkKind::Document,
            AnySink::Relational(_) => SinkKind::Relational,
            AnySink::KeyValue(_) => SinkKind::KeyValue,
            AnySink::Event(_) => SinkKind::Event,
        }
    }
}

impl RecordSink for AnySink {
    async fn connect(&mut self) -> Result<(), SinkError> {
        match self {
            AnySink::Document(s) => s.connect().await,
            AnySink::Relational(s) => s.connect().await,
            AnySink::KeyValue(s) => s.connect().await,
            AnySink::Event(s) => s.connect().await,
        }
    }

    async fn insert(
        &self,
        records: &[Value],
        store: &str,
        key_hint: Option<&str>,
    ) -> Result<Vec<String>, SinkError> {
        match self {
            AnySink::Document(s) => s.insert(records, store, key_hint).await,
            AnySink::Relational(s) => s.insert(records, store, key_hint).await,
            AnySink::KeyValue(s) => s.insert(records, store, key_hint).await,
            AnySink::Event(s) => s.insert(records, store, key_hint).await,
        }
    }

    async fn disconnect(&mut self) -> Result<(), SinkError> {
        match self {
            AnySink::Document(s) => s.disconnect().await,
            AnySink::Relational(s) => s.disconnect().await,
            AnySink::KeyValue(s) => s.disconnect().await,
            AnySink::Event(s) => s.disconnect().await,
        }
    }
}

/// Extracts the storage key for a record. Falls back to the `id` field when
/// no hint is given.
pub(crate) fn record_key(record: &Value, key_hint: Option<&str>) -> Result<String, SinkError> {
    let field = key_hint.unwrap_or("id");
    match record.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(SinkError::MissingKey(field.to_string())),
    }
}
