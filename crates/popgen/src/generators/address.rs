//! Address generation with population-weighted locality selection.

use fake::Fake;
use fake::faker::address::en::{BuildingNumber, PostCode, StreetName, StreetSuffix};
use rand::Rng;
use tracing::warn;

use crate::error::GenError;
use crate::records::Address;
use crate::seed::geo::GeoDirectory;
use crate::weighted::OptionSet;

/// Generates addresses by drilling down province → county → town, each draw
/// weighted by census population, then filling in street-level detail.
///
/// Missing county or town data degrades to placeholder values with a
/// warning; only an entirely empty geographic directory is an error.
#[derive(Debug, Clone)]
pub struct AddressGenerator {
    country: String,
    provinces: OptionSet<String>,
}

impl AddressGenerator {
    pub fn new(country: impl Into<String>, geo: &GeoDirectory) -> Result<Self, GenError> {
        Ok(Self {
            country: country.into(),
            provinces: geo.provinces()?,
        })
    }

    /// Draws a fresh locality and builds a full address in it.
    pub fn generate(&self, geo: &GeoDirectory, rng: &mut impl Rng) -> Address {
        let province = self.provinces.pick(rng);

        let county = match geo.counties(&province) {
            Ok(counties) => counties.pick(rng),
            Err(err) => {
                warn!("{err}, using placeholder county");
                let town = "Unknown City".to_string();
                return self.street_address(town, "Unknown County".to_string(), province, rng);
            }
        };

        let town = match geo.towns(&province, &county) {
            Ok(towns) => towns.pick(rng),
            Err(err) => {
                // The county name stands in for its towns.
                warn!("{err}, using county name");
                county.clone()
            }
        };

        self.street_address(town, county, province, rng)
    }

    /// Builds an address within a known locality.
    pub fn street_address(
        &self,
        town: String,
        county: String,
        state: String,
        rng: &mut impl Rng,
    ) -> Address {
        let number: String = BuildingNumber().fake_with_rng(rng);
        let street: String = StreetName().fake_with_rng(rng);
        let suffix: String = StreetSuffix().fake_with_rng(rng);
        let post_code: String = PostCode().fake_with_rng(rng);

        Address {
            street: format!("{number} {street} {suffix}"),
            town,
            county,
            state,
            post_code,
            country: self.country.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn geo() -> GeoDirectory {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/ie_geography.json");
        GeoDirectory::load(&path).unwrap()
    }

    #[test]
    fn test_addresses_use_seeded_localities() {
        let geo = geo();
        let generator = AddressGenerator::new("Ireland", &geo).unwrap();
        let mut rng = rand::thread_rng();

        for _ in 0..50 {
            let address = generator.generate(&geo, &mut rng);
            assert_eq!(address.country, "Ireland");
            assert!(!address.street.is_empty());
            assert!(!address.town.is_empty());
            assert!(
                ["Leinster", "Munster", "Connacht", "Ulster"].contains(&address.state.as_str()),
                "unexpected province {}",
                address.state
            );
        }
    }

    #[test]
    fn test_street_address_keeps_locality() {
        let geo = geo();
        let generator = AddressGenerator::new("Ireland", &geo).unwrap();
        let address = generator.street_address(
            "Naas".to_string(),
            "Kildare".to_string(),
            "Leinster".to_string(),
            &mut rand::thread_rng(),
        );

        assert_eq!(address.town, "Naas");
        assert_eq!(address.county, "Kildare");
        assert_eq!(address.state, "Leinster");
    }
}
