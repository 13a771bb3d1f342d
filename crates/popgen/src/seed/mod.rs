//! Reference data loaded from JSON seed files.

pub mod banks;
pub mod geo;

pub use banks::{Bank, BankDirectory};
pub use geo::GeoDirectory;
