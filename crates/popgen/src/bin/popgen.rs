//! Population generation entry point.
//!
//! Run with:
//! ```
//! SINK=document MONGO_URI=mongodb://localhost:27017 MONGO_DATABASE=popgen \
//!     cargo run -p popgen --bin popgen
//! ```

use tracing_subscriber::EnvFilter;

use popgen::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GeneratorConfig::from_env()?;
    config.echo();

    let geo = GeoDirectory::load(&config.geo_seed_file)?;
    let banks = BankDirectory::load(&config.bank_seed_file)?;
    let factory = HouseholdFactory::new(config.household(), geo, banks)?;
    let sink = AnySink::from_config(&config.sink)?;

    let totals = PopulationDriver::new(&config, factory, sink).run().await?;

    tracing::info!("Generation finished");
    tracing::info!("  Adults: {}", totals.adults);
    tracing::info!("  Children: {}", totals.children);
    tracing::info!("  Families: {}", totals.families);
    tracing::info!("  Records: {}", totals.records);

    Ok(())
}
