//! Bank reference data: identifiers, IBAN prefixes, market shares, and the
//! card networks each bank issues.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::GenError;
use crate::weighted::OptionSet;

#[derive(Debug, Clone, Deserialize)]
pub struct Bank {
    pub id: String,
    pub name: String,
    pub country: String,
    pub bicfi_code: String,
    pub swift_code: String,
    /// Country code + check digits + bank identifier + sort code; the fixed
    /// prefix of every account number issued by the bank.
    pub iban_structure: String,
    pub market_share: f64,
    pub card_networks: Vec<NetworkShare>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkShare {
    pub network: String,
    pub share: f64,
}

impl Bank {
    /// Card networks this bank issues, weighted by share.
    pub fn network_options(&self) -> Result<OptionSet<String>, GenError> {
        let options: Vec<(String, f64)> = self
            .card_networks
            .iter()
            .map(|n| (n.network.clone(), n.share))
            .collect();
        let total: f64 = options.iter().map(|(_, w)| w).sum();

        OptionSet::new(options, total).map_err(|_| {
            GenError::ReferenceData(format!("no card networks for bank `{}`", self.name))
        })
    }
}

#[derive(Debug, Clone)]
pub struct BankDirectory {
    banks: Vec<Bank>,
}

impl BankDirectory {
    pub fn load(path: &Path) -> Result<Self, GenError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| GenError::Seed(format!("{}: {e}", path.display())))?;
        let banks: Vec<Bank> = serde_json::from_str(&raw)
            .map_err(|e| GenError::Seed(format!("{}: {e}", path.display())))?;

        info!("Loaded {} banks from {}", banks.len(), path.display());
        Ok(Self { banks })
    }

    /// Finds a bank by name: exact, then substring, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&Bank> {
        let needle = name.trim().to_lowercase();
        self.banks
            .iter()
            .find(|b| b.name.to_lowercase() == needle)
            .or_else(|| {
                self.banks
                    .iter()
                    .find(|b| b.name.to_lowercase().contains(&needle))
            })
    }

    /// Banks weighted by market share.
    pub fn share_options(&self) -> Result<OptionSet<String>, GenError> {
        let options: Vec<(String, f64)> = self
            .banks
            .iter()
            .map(|b| (b.name.clone(), b.market_share))
            .collect();
        let total: f64 = options.iter().map(|(_, w)| w).sum();

        OptionSet::new(options, total)
            .map_err(|_| GenError::ReferenceData("no banks in bank data".to_string()))
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn directory() -> BankDirectory {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/ie_banks.json");
        BankDirectory::load(&path).unwrap()
    }

    #[test]
    fn test_loads_banks() {
        let banks = directory();
        assert_eq!(banks.len(), 6);
    }

    #[test]
    fn test_fuzzy_lookup() {
        let banks = directory();
        assert!(banks.get("Bank of Ireland").is_some());
        assert!(banks.get("barclays").is_some());
        assert!(banks.get("permanent tsb").is_some());
        assert!(banks.get("First Galactic").is_none());
    }

    #[test]
    fn test_iban_prefixes_look_irish() {
        let banks = directory();
        let aib = banks.get("Allied Irish Banks").unwrap();
        assert!(aib.iban_structure.starts_with("IE"));
        assert!(!aib.bicfi_code.is_empty());
    }

    #[test]
    fn test_network_options_draw() {
        let banks = directory();
        let bank = banks.get("Bank of Ireland").unwrap();
        let networks = bank.network_options().unwrap();
        let picked = networks.pick(&mut rand::thread_rng());
        assert!(!picked.is_empty());
    }
}
