//! Run configuration, loaded from the environment.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use popsink::{RetryPolicy, SinkConfig, SinkKind};

use crate::packager::HouseholdConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(String),

    #[error("invalid value `{value}` for `{key}`: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("unsupported locale `{0}` (no national-identifier generator)")]
    UnsupportedLocale(String),
}

/// Everything a generation run needs, resolved before any work starts.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub locale: String,
    pub country: String,

    /// Years per age bracket.
    pub age_block_size: i32,
    /// Households generated per flush unit.
    pub batch_size: usize,
    /// Global ceiling on generated person records.
    pub record_cap: u64,

    /// Mean age gap between mother and child, in years.
    pub age_gap_years: f64,
    /// Relative variation of the age gap, in percent.
    pub age_gap_variation_pct: f64,

    pub geo_seed_file: PathBuf,
    pub bank_seed_file: PathBuf,

    pub adults_store: String,
    pub children_store: String,
    pub families_store: String,

    /// Fixed RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,

    pub sink: SinkConfig,
}

impl GeneratorConfig {
    /// Reads the configuration from the environment. Only `SINK` is
    /// strictly required; everything else has a default. Unparsable values
    /// are fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = PathBuf::from(var_or("DATA_DIR", "data"));

        let kind_raw = var("SINK")?;
        let kind = SinkKind::from_str(&kind_raw).map_err(|err| ConfigError::Invalid {
            key: "SINK".to_string(),
            value: kind_raw,
            reason: err.to_string(),
        })?;

        let retry = RetryPolicy {
            max_attempts: parse_or("SINK_MAX_ATTEMPTS", 5)?,
            base_delay: Duration::from_millis(parse_or("SINK_RETRY_BASE_MS", 250)?),
            multiplier: parse_or("SINK_RETRY_MULTIPLIER", 2.0)?,
        };

        Ok(Self {
            locale: var_or("LOCALE", "en_IE"),
            country: var_or("COUNTRY", "Ireland"),
            age_block_size: parse_or("AGE_BLOCK_SIZE", 10)?,
            batch_size: parse_or("BATCH_SIZE", 100)?,
            record_cap: parse_or("RECORD_CAP", 100_000)?,
            age_gap_years: parse_or("AGE_GAP", 18.0)?,
            age_gap_variation_pct: parse_or("AGE_GAP_VARIATION", 25.0)?,
            geo_seed_file: data_dir.join(var_or("GEO_SEED_FILE", "ie_geography.json")),
            bank_seed_file: data_dir.join(var_or("BANK_SEED_FILE", "ie_banks.json")),
            adults_store: var_or("ADULTS_STORE", "adults"),
            children_store: var_or("CHILDREN_STORE", "children"),
            families_store: var_or("FAMILIES_STORE", "families"),
            rng_seed: maybe_parse("RNG_SEED")?,
            sink: SinkConfig {
                kind,
                retry,
                mongo_uri: maybe("MONGO_URI"),
                mongo_database: maybe("MONGO_DATABASE"),
                database_url: maybe("DATABASE_URL"),
                redis_url: maybe("REDIS_URL"),
                redis_ttl_secs: maybe_parse("REDIS_TTL_SECS")?,
                kafka_brokers: maybe("KAFKA_BROKERS"),
                kafka_timeout_ms: parse_or("KAFKA_TIMEOUT_MS", 30_000)?,
            },
        })
    }

    /// Standard deviation of the mother-child age gap, in years.
    pub fn age_gap_std_dev(&self) -> f64 {
        self.age_gap_years * self.age_gap_variation_pct / 100.0
    }

    /// The subset of settings the household factory needs.
    pub fn household(&self) -> HouseholdConfig {
        HouseholdConfig {
            locale: self.locale.clone(),
            country: self.country.clone(),
            age_gap_years: self.age_gap_years,
            age_gap_std_dev: self.age_gap_std_dev(),
        }
    }

    /// Logs the resolved configuration. Connection strings are left out so
    /// credentials never reach the log.
    pub fn echo(&self) {
        info!("Locale: {}, country: {}", self.locale, self.country);
        info!(
            "Age blocks of {} years, batches of {}, record cap {}",
            self.age_block_size, self.batch_size, self.record_cap
        );
        info!(
            "Child age gap {}y ± {}%, spouse offset built in",
            self.age_gap_years, self.age_gap_variation_pct
        );
        info!(
            "Seed data: {} / {}",
            self.geo_seed_file.display(),
            self.bank_seed_file.display()
        );
        info!(
            "Sink: {} (stores: {}, {}, {}; {} attempts, base delay {:?})",
            self.sink.kind.as_str(),
            self.adults_store,
            self.children_store,
            self.families_store,
            self.sink.retry.max_attempts,
            self.sink.retry.base_delay,
        );
        if let Some(seed) = self.rng_seed {
            info!("RNG seed: {seed} (reproducible run)");
        }
    }
}

fn var(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn maybe(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
            reason: err.to_string(),
        }),
    }
}

fn maybe_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match maybe(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|err: T::Err| ConfigError::Invalid {
                key: key.to_string(),
                value: raw,
                reason: err.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test covers the whole env surface: parallel tests sharing process
    // environment would race.
    #[test]
    fn test_from_env() {
        unsafe {
            env::remove_var("SINK");
        }
        assert!(matches!(
            GeneratorConfig::from_env(),
            Err(ConfigError::Missing(key)) if key == "SINK"
        ));

        unsafe {
            env::set_var("SINK", "document");
            env::set_var("BATCH_SIZE", "25");
        }
        let config = GeneratorConfig::from_env().unwrap();
        assert_eq!(config.sink.kind, SinkKind::Document);
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.locale, "en_IE");
        assert!((config.age_gap_std_dev() - 4.5).abs() < 1e-9);

        unsafe {
            env::set_var("BATCH_SIZE", "not-a-number");
        }
        assert!(matches!(
            GeneratorConfig::from_env(),
            Err(ConfigError::Invalid { key, .. }) if key == "BATCH_SIZE"
        ));

        unsafe {
            env::remove_var("SINK");
            env::remove_var("BATCH_SIZE");
        }
    }
}
