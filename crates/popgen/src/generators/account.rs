//! Bank account and credit card generation.

use rand::Rng;
use tracing::warn;

use crate::error::GenError;
use crate::generators::dates;
use crate::generators::identity::{UniquenessScope, luhn_check_digit};
use crate::options::DemographicOptions;
use crate::records::{Account, BankAccount, CreditCard};
use crate::seed::banks::{Bank, BankDirectory};
use crate::weighted::OptionSet;

/// Builds each adult's account portfolio: a weighted number of deposit
/// accounts followed by a separately weighted number of credit cards, every
/// one tied to a market-share-weighted bank draw.
#[derive(Debug, Clone)]
pub struct AccountFactory {
    accounts_per_person: OptionSet<u32>,
    cards_per_person: OptionSet<u32>,
    account_types: OptionSet<&'static str>,
    bank_shares: OptionSet<String>,
}

impl AccountFactory {
    pub fn new(banks: &BankDirectory) -> Result<Self, GenError> {
        let opts = DemographicOptions::census_2022();
        Ok(Self {
            accounts_per_person: opts.accounts_per_person,
            cards_per_person: opts.cards_per_person,
            account_types: opts.account_types,
            bank_shares: banks.share_options()?,
        })
    }

    /// Generates the full portfolio for one adult. `initial` and `surname`
    /// form the card holder name.
    pub fn portfolio(
        &self,
        banks: &BankDirectory,
        initial: char,
        surname: &str,
        account_numbers: &mut UniquenessScope,
        card_numbers: &mut UniquenessScope,
        rng: &mut impl Rng,
    ) -> Result<Vec<Account>, GenError> {
        let mut accounts = Vec::new();

        let deposit_count = self.accounts_per_person.pick(rng);
        for _ in 0..deposit_count {
            let bank_name = self.bank_shares.pick(rng);
            let Some(bank) = banks.get(&bank_name) else {
                warn!("Bank `{bank_name}` not found in bank data, skipping account");
                continue;
            };

            let account_number = unique_account_number(&bank.iban_structure, account_numbers, rng)?;
            accounts.push(Account::Bank(BankAccount {
                bank: bank.name.clone(),
                bicfi_code: bank.bicfi_code.clone(),
                swift_code: bank.swift_code.clone(),
                iban_structure: bank.iban_structure.clone(),
                account_number,
                account_type: self.account_types.pick(rng).to_string(),
            }));
        }

        let card_count = self.cards_per_person.pick(rng);
        for _ in 0..card_count {
            let bank_name = self.bank_shares.pick(rng);
            let Some(bank) = banks.get(&bank_name) else {
                warn!("Bank `{bank_name}` not found in bank data, skipping card");
                continue;
            };

            match self.issue_card(bank, initial, surname, card_numbers, rng) {
                Ok(card) => accounts.push(Account::Card(card)),
                Err(GenError::ReferenceData(reason)) => {
                    warn!("Skipping card from `{}`: {reason}", bank.name);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(accounts)
    }

    fn issue_card(
        &self,
        bank: &Bank,
        initial: char,
        surname: &str,
        card_numbers: &mut UniquenessScope,
        rng: &mut impl Rng,
    ) -> Result<CreditCard, GenError> {
        // The network comes from the issuing bank's own list, never from a
        // global distribution.
        let network = bank.network_options()?.pick(rng);
        let card_number = unique_card_number(&network, card_numbers, rng)?;

        Ok(CreditCard {
            card_holder: format!("{initial} {surname}"),
            card_number,
            exp_date: dates::card_expiry(rng),
            card_network: network,
            issuing_bank: bank.name.clone(),
            iban_structure: bank.iban_structure.clone(),
        })
    }
}

/// IBAN prefix plus a random 8-digit suffix, unique per run.
fn unique_account_number(
    iban_prefix: &str,
    scope: &mut UniquenessScope,
    rng: &mut impl Rng,
) -> Result<String, GenError> {
    for _ in 0..scope.max_attempts() {
        let candidate = format!("{iban_prefix}{:08}", rng.gen_range(0..100_000_000u32));
        if scope.claim(&candidate) {
            return Ok(candidate);
        }
    }
    Err(GenError::IdentifierExhausted {
        attempts: scope.max_attempts(),
    })
}

/// Network-specific card number with a valid Luhn check digit, unique per
/// run.
fn unique_card_number(
    network: &str,
    scope: &mut UniquenessScope,
    rng: &mut impl Rng,
) -> Result<String, GenError> {
    for _ in 0..scope.max_attempts() {
        let candidate = card_number(network, rng)?;
        if scope.claim(&candidate) {
            return Ok(candidate);
        }
    }
    Err(GenError::IdentifierExhausted {
        attempts: scope.max_attempts(),
    })
}

fn card_number(network: &str, rng: &mut impl Rng) -> Result<String, GenError> {
    let (prefix, length) = match network.to_lowercase().as_str() {
        "visa" => ("4".to_string(), 16),
        "mastercard" => (format!("5{}", rng.gen_range(1..=5)), 16),
        "amex" => {
            let second = if rng.r#gen::<bool>() { '4' } else { '7' };
            (format!("3{second}"), 15)
        }
        "jcb" => ("35".to_string(), 16),
        "diners" => {
            let second = if rng.r#gen::<bool>() { '6' } else { '8' };
            (format!("3{second}"), 14)
        }
        other => {
            return Err(GenError::ReferenceData(format!(
                "unknown card network `{other}`"
            )));
        }
    };

    let mut digits = prefix;
    while digits.len() < length - 1 {
        digits.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    let check = luhn_check_digit(&digits);
    digits.push(char::from(b'0' + check));
    Ok(digits)
}
