//! Document-store sink backed by MongoDB.

use mongodb::Client;
use mongodb::bson::{self, Document, doc};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{SinkConfig, SinkKind};
use crate::error::SinkError;
use crate::retry::RetryPolicy;

/// Inserts record batches as documents into per-store collections.
pub struct DocumentSink {
    uri: String,
    database: String,
    retry: RetryPolicy,
    client: Option<Client>,
}

impl DocumentSink {
    pub fn from_config(cfg: &SinkConfig) -> Result<Self, SinkError> {
        let uri = SinkConfig::require(cfg.mongo_uri.as_ref(), "MONGO_URI", SinkKind::Document)?;
        let database =
            SinkConfig::require(cfg.mongo_database.as_ref(), "MONGO_DATABASE", SinkKind::Document)?;

        Ok(Self {
            uri: uri.to_string(),
            database: database.to_string(),
            retry: cfg.retry,
            client: None,
        })
    }

    pub async fn connect(&mut self) -> Result<(), SinkError> {
        let client = Client::with_uri_str(&self.uri)
            .await
            .map_err(SinkError::connection)?;

        // Client construction is lazy; a ping proves the server is reachable.
        let db = client.database(&self.database);
        self.retry
            .run("mongodb ping", || {
                let db = db.clone();
                async move {
                    db.run_command(doc! { "ping": 1 })
                        .await
                        .map_err(SinkError::connection)
                }
            })
            .await?;

        info!("Connected to document store `{}`", self.database);
        self.client = Some(client);
        Ok(())
    }

    pub async fn insert(
        &self,
        records: &[Value],
        store: &str,
        _key_hint: Option<&str>,
    ) -> Result<Vec<String>, SinkError> {
        let client = self.client.as_ref().ok_or(SinkError::NotConnected)?;

        let docs: Vec<Document> = records
            .iter()
            .map(|r| bson::to_document(r).map_err(|e| SinkError::operation(store, e)))
            .collect::<Result<_, _>>()?;

        let collection = client.database(&self.database).collection::<Document>(store);
        let result = self
            .retry
            .run("mongodb insert", || {
                let docs = docs.clone();
                let collection = collection.clone();
                async move {
                    collection
                        .insert_many(docs)
                        .await
                        .map_err(|e| SinkError::operation(store, e))
                }
            })
            .await?;

        debug!("Inserted {} documents into `{store}`", result.inserted_ids.len());
        Ok(result
            .inserted_ids
            .values()
            .map(|id| id.to_string())
            .collect())
    }

    pub async fn disconnect(&mut self) -> Result<(), SinkError> {
        // The MongoDB client tears its pool down on drop.
        self.client = None;
        Ok(())
    }
}
