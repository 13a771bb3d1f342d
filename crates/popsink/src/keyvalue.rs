//! Key-value sink backed by Redis.
//!
//! Records are stored as JSON strings under `store:key` keys, optionally with
//! a TTL, and can be fetched back by key pattern.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{SinkConfig, SinkKind};
use crate::error::SinkError;
use crate::record_key;
use crate::retry::RetryPolicy;

pub struct KeyValueSink {
    url: String,
    ttl_secs: Option<u64>,
    retry: RetryPolicy,
    manager: Option<ConnectionManager>,
}

impl KeyValueSink {
    pub fn from_config(cfg: &SinkConfig) -> Result<Self, SinkError> {
        let url = SinkConfig::require(cfg.redis_url.as_ref(), "REDIS_URL", SinkKind::KeyValue)?;

        Ok(Self {
            url: url.to_string(),
            ttl_secs: cfg.redis_ttl_secs,
            retry: cfg.retry,
            manager: None,
        })
    }

    pub async fn connect(&mut self) -> Result<(), SinkError> {
        let client = redis::Client::open(self.url.as_str()).map_err(SinkError::connection)?;

        let manager = self
            .retry
            .run("redis connect", || {
                let client = client.clone();
                async move {
                    client
                        .get_connection_manager()
                        .await
                        .map_err(SinkError::connection)
                }
            })
            .await?;

        let mut con = manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut con)
            .await
            .map_err(SinkError::connection)?;

        info!("Connected to key-value store");
        self.manager = Some(manager);
        Ok(())
    }

    pub async fn insert(
        &self,
        records: &[Value],
        store: &str,
        key_hint: Option<&str>,
    ) -> Result<Vec<String>, SinkError> {
        let manager = self.manager.as_ref().ok_or(SinkError::NotConnected)?;
        let con = manager.clone();

        let mut inserted = Vec::with_capacity(records.len());
        for record in records {
            let key = format!("{store}:{}", record_key(record, key_hint)?);
            let payload =
                serde_json::to_string(record).map_err(|e| SinkError::operation(store, e))?;

            self.retry
                .run("redis set", || {
                    let mut con = con.clone();
                    let key = key.clone();
                    let payload = payload.clone();
                    async move {
                        match self.ttl_secs {
                            Some(ttl) => con
                                .set_ex::<_, _, ()>(&key, &payload, ttl)
                                .await
                                .map_err(|e| SinkError::operation(store, e)),
                            None => con
                                .set::<_, _, ()>(&key, &payload)
                                .await
                                .map_err(|e| SinkError::operation(store, e)),
                        }
                    }
                })
                .await?;
            inserted.push(key);
        }

        debug!("Set {} keys under `{store}:*`", inserted.len());
        Ok(inserted)
    }

    /// Retrieves every record whose key matches `pattern` (Redis glob syntax,
    /// e.g. `adults:74*`).
    pub async fn fetch_by_pattern(&self, pattern: &str) -> Result<Vec<Value>, SinkError> {
        let manager = self.manager.as_ref().ok_or(SinkError::NotConnected)?;
        let mut con = manager.clone();

        let keys: Vec<String> = {
            let mut iter = con
                .scan_match::<_, String>(pattern)
                .await
                .map_err(|e| SinkError::operation(pattern, e))?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            let payload: String = con
                .get(&key)
                .await
                .map_err(|e| SinkError::operation(&key, e))?;
            values.push(
                serde_json::from_str(&payload).map_err(|e| SinkError::operation(&key, e))?,
            );
        }
        Ok(values)
    }

    pub async fn disconnect(&mut self) -> Result<(), SinkError> {
        self.manager = None;
        Ok(())
    }
}
