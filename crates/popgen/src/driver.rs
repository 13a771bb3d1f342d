//! Population scheduler: age brackets → birth dates → batches → flushes.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::Value;
use time::{Date, Duration, OffsetDateTime};
use tracing::{error, info};

use popsink::RecordSink;

use crate::config::GeneratorConfig;
use crate::error::GenError;
use crate::generators::dates::{format_yymmdd, years_ago};
use crate::options::{self, AgeBracket};
use crate::packager::HouseholdFactory;

/// Counters for one date, one bracket, or a whole run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTotals {
    pub adults: u64,
    pub children: u64,
    pub families: u64,
    /// Person records (adults + children); the record cap compares against
    /// this.
    pub records: u64,
}

impl RunTotals {
    fn add(&mut self, other: &RunTotals) {
        self.adults += other.adults;
        self.children += other.children;
        self.families += other.families;
        self.records += other.records;
    }
}

/// Drives a full generation run against one sink.
///
/// The sink connection is acquired once before the first bracket and
/// released on every exit path. Per-date failures are logged and skipped;
/// only configuration and connection-setup errors abort the run.
pub struct PopulationDriver<S: RecordSink> {
    factory: HouseholdFactory,
    sink: S,
    rng: StdRng,
    brackets: Vec<AgeBracket>,
    age_block_size: i32,
    batch_size: usize,
    record_cap: u64,
    adults_store: String,
    children_store: String,
    families_store: String,
}

impl<S: RecordSink> PopulationDriver<S> {
    pub fn new(config: &GeneratorConfig, factory: HouseholdFactory, sink: S) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            factory,
            sink,
            rng,
            brackets: options::age_brackets(),
            age_block_size: config.age_block_size,
            batch_size: config.batch_size,
            record_cap: config.record_cap,
            adults_store: config.adults_store.clone(),
            children_store: config.children_store.clone(),
            families_store: config.families_store.clone(),
        }
    }

    /// Overrides the age brackets to generate.
    pub fn with_brackets(mut self, brackets: Vec<AgeBracket>) -> Self {
        self.brackets = brackets;
        self
    }

    /// Runs the whole generation and returns the final counts.
    pub async fn run(mut self) -> Result<RunTotals, GenError> {
        let connect_started = Instant::now();
        self.sink.connect().await?;
        info!("Sink connected in {:?}", connect_started.elapsed());

        let run_started = Instant::now();
        let result = self.generate_all().await;

        if let Err(err) = self.sink.disconnect().await {
            error!("Sink disconnect failed: {err}");
        }

        let totals = result?;
        let elapsed = run_started.elapsed();
        let rate = totals.records as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        info!(
            "Run complete: {} adults, {} children, {} families ({} records) in {:.2?} ({rate:.0} rec/s)",
            totals.adults, totals.children, totals.families, totals.records, elapsed
        );

        Ok(totals)
    }

    async fn generate_all(&mut self) -> Result<RunTotals, GenError> {
        let mut totals = RunTotals::default();
        let mut capped = false;

        for bracket in self.brackets.clone() {
            let bracket_started = Instant::now();
            let mut block = RunTotals::default();
            let end_age = bracket.start_age + self.age_block_size;

            let dates = self.bracket_dates(&bracket);
            info!(
                "Creating {} people for age bracket {}-{} across {} dates in batches of {}",
                bracket.count,
                bracket.start_age,
                end_age,
                dates.len(),
                self.batch_size
            );

            for dob in dates {
                if totals.records >= self.record_cap {
                    capped = true;
                    break;
                }

                let date_started = Instant::now();
                match self.run_date(dob).await {
                    Ok(day) => {
                        block.add(&day);
                        totals.add(&day);
                        info!(
                            "Flushed {}: {} adults, {} children, {} families, {} records in {:.2?}",
                            format_yymmdd(dob),
                            day.adults,
                            day.children,
                            day.families,
                            day.records,
                            date_started.elapsed()
                        );
                    }
                    Err(err) => {
                        error!("Skipping batch for {}: {err}", format_yymmdd(dob));
                    }
                }
            }

            info!(
                "Age bracket {}-{}: {} adults, {} children, {} families, {} records in {:.2?}",
                bracket.start_age,
                end_age,
                block.adults,
                block.children,
                block.families,
                block.records,
                bracket_started.elapsed()
            );

            if capped {
                info!("Record cap {} reached, stopping", self.record_cap);
                break;
            }
        }

        Ok(totals)
    }

    /// Representative birth dates spanning the bracket's range at a uniform
    /// interval with a few days of jitter, one generation batch per date.
    fn bracket_dates(&mut self, bracket: &AgeBracket) -> Vec<Date> {
        let today = OffsetDateTime::now_utc().date();
        let range_start = years_ago(today, bracket.start_age + self.age_block_size);
        let range_end = years_ago(today, bracket.start_age);

        let total_days = (range_end - range_start).whole_days();
        let number_of_dates = (bracket.count / self.batch_size as u64).max(1);
        let interval = total_days as f64 / number_of_dates as f64;

        let mut dates = Vec::with_capacity(number_of_dates as usize);
        let mut offset = 0.0;
        for _ in 0..number_of_dates {
            let jitter = self.rng.gen_range(-5..=5);
            offset += interval + jitter as f64;
            dates.push(range_start + Duration::days(offset as i64));
        }
        dates
    }

    /// Generates one date's batch of households and flushes the three
    /// streams. A batch always completes before the cap is re-checked.
    async fn run_date(&mut self, dob: Date) -> Result<RunTotals, GenError> {
        let mut adults = Vec::new();
        let mut children = Vec::new();
        let mut families = Vec::new();

        let mut generated = 0usize;
        while generated < self.batch_size {
            let household = self.factory.generate(dob, &mut self.rng)?;
            generated += household.members;

            adults.extend(household.adults);
            children.extend(household.children);
            families.extend(household.family);
        }

        let day = RunTotals {
            adults: adults.len() as u64,
            children: children.len() as u64,
            families: families.len() as u64,
            records: (adults.len() + children.len()) as u64,
        };

        self.flush(&adults, &self.adults_store, "national_id").await?;
        self.flush(&children, &self.children_store, "national_id").await?;
        self.flush(&families, &self.families_store, "id").await?;

        Ok(day)
    }

    async fn flush<T: Serialize>(
        &self,
        records: &[T],
        store: &str,
        key_hint: &str,
    ) -> Result<(), GenError> {
        if records.is_empty() {
            return Ok(());
        }

        let values: Vec<Value> = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()?;

        self.sink.insert(&values, store, Some(key_hint)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use popsink::SinkError;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use crate::seed::banks::BankDirectory;
    use crate::seed::geo::GeoDirectory;

    /// In-memory sink capturing every flush for assertions.
    #[derive(Clone, Default)]
    struct MemorySink {
        flushes: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
        fail_stores: Vec<String>,
    }

    impl RecordSink for MemorySink {
        async fn connect(&mut self) -> Result<(), SinkError> {
            Ok(())
        }

        async fn insert(
            &self,
            records: &[Value],
            store: &str,
            _key_hint: Option<&str>,
        ) -> Result<Vec<String>, SinkError> {
            if self.fail_stores.iter().any(|s| s == store) {
                return Err(SinkError::Operation {
                    store: store.to_string(),
                    reason: "simulated outage".to_string(),
                });
            }
            self.flushes
                .lock()
                .unwrap()
                .push((store.to_string(), records.to_vec()));
            Ok(records
                .iter()
                .map(|r| r.get("id").map(|id| id.to_string()).unwrap_or_default())
                .collect())
        }

        async fn disconnect(&mut self) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn test_config() -> GeneratorConfig {
        GeneratorConfig {
            locale: "en_IE".to_string(),
            country: "Ireland".to_string(),
            age_block_size: 10,
            batch_size: 10,
            record_cap: 30,
            age_gap_years: 18.0,
            age_gap_variation_pct: 25.0,
            geo_seed_file: PathBuf::new(),
            bank_seed_file: PathBuf::new(),
            adults_store: "adults".to_string(),
            children_store: "children".to_string(),
            families_store: "families".to_string(),
            rng_seed: Some(20220406),
            sink: popsink::SinkConfig {
                kind: popsink::SinkKind::Document,
                retry: popsink::RetryPolicy::default(),
                mongo_uri: None,
                mongo_database: None,
                database_url: None,
                redis_url: None,
                redis_ttl_secs: None,
                kafka_brokers: None,
                kafka_timeout_ms: 1000,
            },
        }
    }

    fn test_factory(config: &GeneratorConfig) -> HouseholdFactory {
        let data = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data");
        let geo = GeoDirectory::load(&data.join("ie_geography.json")).unwrap();
        let banks = BankDirectory::load(&data.join("ie_banks.json")).unwrap();
        HouseholdFactory::new(config.household(), geo, banks).unwrap()
    }

    fn small_brackets() -> Vec<AgeBracket> {
        vec![
            AgeBracket {
                start_age: 30,
                share: 0.5,
                count: 40,
            },
            AgeBracket {
                start_age: 40,
                share: 0.5,
                count: 40,
            },
        ]
    }

    #[tokio::test]
    async fn test_run_flushes_three_streams_and_honors_the_cap() {
        let config = test_config();
        let sink = MemorySink::default();
        let flushes = sink.flushes.clone();

        let driver = PopulationDriver::new(&config, test_factory(&config), sink)
            .with_brackets(small_brackets());
        let totals = driver.run().await.unwrap();

        // The cap is checked at date boundaries, so the run overshoots by at
        // most one batch's worth of households.
        assert!(totals.records >= config.record_cap);
        assert!(totals.records < config.record_cap + 3 * config.batch_size as u64);
        assert_eq!(totals.records, totals.adults + totals.children);

        let flushes = flushes.lock().unwrap();
        let stores: std::collections::HashSet<&str> =
            flushes.iter().map(|(s, _)| s.as_str()).collect();
        assert!(stores.contains("adults"));

        let flushed_adults: usize = flushes
            .iter()
            .filter(|(s, _)| s == "adults")
            .map(|(_, records)| records.len())
            .sum();
        assert_eq!(flushed_adults as u64, totals.adults);

        // Adult records carry the key fields the sinks key on.
        let (_, batch) = flushes.iter().find(|(s, _)| s == "adults").unwrap();
        assert!(batch[0].get("national_id").is_some());
        assert!(batch[0].get("dob").is_some());
    }

    #[tokio::test]
    async fn test_failed_flush_skips_the_date_and_continues() {
        let config = test_config();
        let sink = MemorySink {
            flushes: Arc::new(Mutex::new(Vec::new())),
            fail_stores: vec!["adults".to_string()],
        };
        let flushes = sink.flushes.clone();

        let driver = PopulationDriver::new(&config, test_factory(&config), sink)
            .with_brackets(small_brackets());
        let totals = driver.run().await.unwrap();

        // Every date failed on the adults stream, so nothing is counted and
        // the run still terminates cleanly.
        assert_eq!(totals.records, 0);
        assert!(flushes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_bracket_dates_span_the_range() {
        let config = test_config();
        let sink = MemorySink::default();
        let mut driver = PopulationDriver::new(&config, test_factory(&config), sink);

        let bracket = AgeBracket {
            start_age: 30,
            share: 1.0,
            count: 100,
        };
        let dates = driver.bracket_dates(&bracket);
        assert_eq!(dates.len(), 10);

        let today = OffsetDateTime::now_utc().date();
        for date in &dates {
            let age_years = (today - *date).whole_days() / 365;
            assert!((29..=41).contains(&age_years), "age {age_years} out of bracket");
        }
    }
}
