//! Relational sink backed by PostgreSQL.
//!
//! Each logical store maps to a table with a text key column and a JSONB
//! document column, so the schema never has to chase the record shapes.

use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};

use crate::config::{SinkConfig, SinkKind};
use crate::error::SinkError;
use crate::record_key;
use crate::retry::RetryPolicy;

pub struct RelationalSink {
    url: String,
    retry: RetryPolicy,
    pool: Option<PgPool>,
}

impl RelationalSink {
    pub fn from_config(cfg: &SinkConfig) -> Result<Self, SinkError> {
        let url =
            SinkConfig::require(cfg.database_url.as_ref(), "DATABASE_URL", SinkKind::Relational)?;

        Ok(Self {
            url: url.to_string(),
            retry: cfg.retry,
            pool: None,
        })
    }

    pub async fn connect(&mut self) -> Result<(), SinkError> {
        let url = self.url.clone();
        let pool = self
            .retry
            .run("postgres connect", || {
                let url = url.clone();
                async move {
                    PgPoolOptions::new()
                        .max_connections(5)
                        .connect(&url)
                        .await
                        .map_err(SinkError::connection)
                }
            })
            .await?;

        info!("Connected to relational store");
        self.pool = Some(pool);
        Ok(())
    }

    pub async fn insert(
        &self,
        records: &[Value],
        store: &str,
        key_hint: Option<&str>,
    ) -> Result<Vec<String>, SinkError> {
        let pool = self.pool.as_ref().ok_or(SinkError::NotConnected)?;
        let table = valid_table_name(store)?;

        self.ensure_table(pool, table).await?;

        let sql = format!(
            "INSERT INTO {table} (id, doc) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING"
        );

        let mut inserted = Vec::with_capacity(records.len());
        for record in records {
            let key = record_key(record, key_hint)?;
            self.retry
                .run("postgres insert", || {
                    let pool = pool.clone();
                    let sql = sql.clone();
                    let key = key.clone();
                    let record = record.clone();
                    let store = store.to_string();
                    async move {
                        sqlx::query(&sql)
                            .bind(&key)
                            .bind(&record)
                            .execute(&pool)
                            .await
                            .map_err(|e| SinkError::operation(&store, e))
                    }
                })
                .await?;
            inserted.push(key);
        }

        debug!("Inserted {} rows into `{table}`", inserted.len());
        Ok(inserted)
    }

    pub async fn disconnect(&mut self) -> Result<(), SinkError> {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
        }
        Ok(())
    }

    async fn ensure_table(&self, pool: &PgPool, table: &str) -> Result<(), SinkError> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (id TEXT PRIMARY KEY, doc JSONB NOT NULL)"
        ))
        .execute(pool)
        .await
        .map_err(|e| SinkError::operation(table, e))?;
        Ok(())
    }
}

/// Store names are interpolated into DDL/DML, so only identifier characters
/// are allowed through.
fn valid_table_name(store: &str) -> Result<&str, SinkError> {
    let ok = !store.is_empty()
        && store
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(store)
    } else {
        Err(SinkError::Operation {
            store: store.to_string(),
            reason: "store name is not a valid table identifier".to_string(),
        })
    }
}
