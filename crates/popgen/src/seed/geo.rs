//! Geographic reference data: provinces, counties, and towns with census
//! populations, loaded from a JSON seed file.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::GenError;
use crate::weighted::OptionSet;

#[derive(Debug, Clone, Deserialize)]
struct GeoData {
    country: String,
    provinces: Vec<ProvinceData>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProvinceData {
    name: String,
    population: u64,
    #[serde(default)]
    counties: Vec<CountyData>,
}

#[derive(Debug, Clone, Deserialize)]
struct CountyData {
    name: String,
    population: u64,
    #[serde(default)]
    towns: Vec<TownData>,
}

#[derive(Debug, Clone, Deserialize)]
struct TownData {
    name: String,
    population: u64,
}

/// Population-weighted lookup over the geographic seed data.
#[derive(Debug, Clone)]
pub struct GeoDirectory {
    data: GeoData,
}

impl GeoDirectory {
    pub fn load(path: &Path) -> Result<Self, GenError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| GenError::Seed(format!("{}: {e}", path.display())))?;
        let data: GeoData = serde_json::from_str(&raw)
            .map_err(|e| GenError::Seed(format!("{}: {e}", path.display())))?;

        info!(
            "Loaded geographic data for {} ({} provinces)",
            data.country,
            data.provinces.len()
        );
        Ok(Self { data })
    }

    pub fn country(&self) -> &str {
        &self.data.country
    }

    /// Provinces weighted by population.
    pub fn provinces(&self) -> Result<OptionSet<String>, GenError> {
        weighted_by_population(
            self.data
                .provinces
                .iter()
                .map(|p| (p.name.clone(), p.population)),
            || "no provinces in geographic data".to_string(),
        )
    }

    /// Counties of a province, weighted by population. Fails with
    /// [`GenError::ReferenceData`] for an unknown province or one without
    /// county data.
    pub fn counties(&self, province: &str) -> Result<OptionSet<String>, GenError> {
        let province = self.find_province(province)?;
        weighted_by_population(
            province
                .counties
                .iter()
                .map(|c| (c.name.clone(), c.population)),
            || format!("no counties for province `{}`", province.name),
        )
    }

    /// Towns of a county, weighted by population.
    pub fn towns(&self, province: &str, county: &str) -> Result<OptionSet<String>, GenError> {
        let province = self.find_province(province)?;
        let county = province
            .counties
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(county))
            .ok_or_else(|| {
                GenError::ReferenceData(format!(
                    "county `{county}` not found in province `{}`",
                    province.name
                ))
            })?;

        weighted_by_population(
            county.towns.iter().map(|t| (t.name.clone(), t.population)),
            || format!("no towns for county `{}`", county.name),
        )
    }

    fn find_province(&self, name: &str) -> Result<&ProvinceData, GenError> {
        self.data
            .provinces
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| GenError::ReferenceData(format!("province `{name}` not found")))
    }
}

fn weighted_by_population(
    pairs: impl Iterator<Item = (String, u64)>,
    missing: impl Fn() -> String,
) -> Result<OptionSet<String>, GenError> {
    let options: Vec<(String, f64)> = pairs.map(|(name, pop)| (name, pop as f64)).collect();
    let total: f64 = options.iter().map(|(_, w)| w).sum();

    OptionSet::new(options, total).map_err(|_| GenError::ReferenceData(missing()))
}
