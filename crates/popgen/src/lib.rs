//! Synthetic population generation for popgen.
//!
//! This crate generates a statistically realistic population — adults,
//! spouses, children, addresses, bank accounts, and cards — from weighted
//! demographic option sets, and streams the records to a pluggable sink.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use popgen::prelude::*;
//!
//! let config = GeneratorConfig::from_env()?;
//! let geo = GeoDirectory::load(&config.geo_seed_file)?;
//! let banks = BankDirectory::load(&config.bank_seed_file)?;
//!
//! let factory = HouseholdFactory::new(config.household(), geo, banks)?;
//! let sink = AnySink::from_config(&config.sink)?;
//!
//! let totals = PopulationDriver::new(&config, factory, sink).run().await?;
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod generators;
pub mod options;
pub mod packager;
pub mod records;
pub mod seed;
pub mod weighted;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{ConfigError, GeneratorConfig};
    pub use crate::driver::{PopulationDriver, RunTotals};
    pub use crate::error::GenError;
    pub use crate::generators::{
        AccountFactory, AddressGenerator, NationalIdGenerator, UniquenessScope,
        relative_birth_date,
    };
    pub use crate::options::{AgeBracket, DemographicOptions, age_brackets};
    pub use crate::packager::{Household, HouseholdConfig, HouseholdFactory};
    pub use crate::records::{
        Account, Address, Child, ChildRecord, FamilyRecord, Gender, LivingStatus, MaritalStatus,
        Person, PersonRecord,
    };
    pub use crate::seed::{BankDirectory, GeoDirectory};
    pub use crate::weighted::{OptionSet, Strategy};
    pub use popsink::{AnySink, RecordSink};
}
