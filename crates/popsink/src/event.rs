//! Event sink backed by Kafka.
//!
//! Each logical store maps to a topic; the record key carries the key-hint
//! field so downstream consumers can partition on it. Delivery is
//! at-least-once: a failed produce is retried by the shared policy and a
//! date's batch may be re-sent in full by the caller.

use std::time::Duration;

use rdkafka::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{SinkConfig, SinkKind};
use crate::error::SinkError;
use crate::record_key;
use crate::retry::RetryPolicy;

pub struct EventSink {
    brokers: String,
    timeout: Duration,
    retry: RetryPolicy,
    producer: Option<FutureProducer>,
}

impl EventSink {
    pub fn from_config(cfg: &SinkConfig) -> Result<Self, SinkError> {
        let brokers =
            SinkConfig::require(cfg.kafka_brokers.as_ref(), "KAFKA_BROKERS", SinkKind::Event)?;

        Ok(Self {
            brokers: brokers.to_string(),
            timeout: Duration::from_millis(cfg.kafka_timeout_ms),
            retry: cfg.retry,
            producer: None,
        })
    }

    pub async fn connect(&mut self) -> Result<(), SinkError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .set("message.timeout.ms", self.timeout.as_millis().to_string())
            .create()
            .map_err(SinkError::connection)?;

        info!("Connected event producer to {}", self.brokers);
        self.producer = Some(producer);
        Ok(())
    }

    pub async fn insert(
        &self,
        records: &[Value],
        store: &str,
        key_hint: Option<&str>,
    ) -> Result<Vec<String>, SinkError> {
        let producer = self.producer.as_ref().ok_or(SinkError::NotConnected)?;

        let mut published = Vec::with_capacity(records.len());
        for record in records {
            let key = record_key(record, key_hint)?;
            let payload =
                serde_json::to_string(record).map_err(|e| SinkError::operation(store, e))?;

            self.retry
                .run("kafka produce", || {
                    let producer = producer.clone();
                    let key = key.clone();
                    let payload = payload.clone();
                    let store = store.to_string();
                    let timeout = self.timeout;
                    async move {
                        producer
                            .send(
                                FutureRecord::to(&store).key(&key).payload(&payload),
                                Timeout::After(timeout),
                            )
                            .await
                            .map_err(|(err, _msg)| SinkError::operation(&store, err))
                    }
                })
                .await?;
            published.push(key);
        }

        debug!("Published {} events to `{store}`", published.len());
        Ok(published)
    }

    pub async fn disconnect(&mut self) -> Result<(), SinkError> {
        if let Some(producer) = self.producer.take() {
            if let Err(err) = producer.flush(Timeout::After(self.timeout)) {
                warn!("Event producer flush on disconnect failed: {err}");
            }
        }
        Ok(())
    }
}
