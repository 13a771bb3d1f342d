//! National-identifier generators.
//!
//! Each locale plugs in a [`NationalIdGenerator`]; uniqueness is enforced by
//! a per-run [`UniquenessScope`] passed into every call, so independent runs
//! (and parallel tests) never share tracker state.

use std::collections::HashSet;

use rand::{Rng, RngCore};
use time::{Date, Month};

use crate::config::ConfigError;
use crate::error::GenError;
use crate::records::Gender;

/// Attempt budget before a generator reports exhaustion.
const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

/// Per-run exclusion set for identifier-like values.
#[derive(Debug, Default)]
pub struct UniquenessScope {
    seen: HashSet<String>,
    max_attempts: u32,
}

impl UniquenessScope {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            seen: HashSet::new(),
            max_attempts,
        }
    }

    /// Claims a candidate. Returns false when it was already taken.
    pub fn claim(&mut self, candidate: &str) -> bool {
        self.seen.insert(candidate.to_string())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// A locale-specific national-identifier generator.
pub trait NationalIdGenerator {
    /// Produces one candidate identifier for the given birth date and
    /// gender. Uniqueness is the caller's concern; see [`generate`].
    ///
    /// [`generate`]: NationalIdGenerator::generate
    fn candidate(&self, dob: Date, gender: Gender, rng: &mut dyn RngCore) -> String;

    /// Produces an identifier not yet present in `scope`, or fails with
    /// [`GenError::IdentifierExhausted`] once the scope's attempt budget is
    /// spent.
    fn generate(
        &self,
        dob: Date,
        gender: Gender,
        scope: &mut UniquenessScope,
        rng: &mut dyn RngCore,
    ) -> Result<String, GenError> {
        for _ in 0..scope.max_attempts() {
            let candidate = self.candidate(dob, gender, rng);
            if scope.claim(&candidate) {
                return Ok(candidate);
            }
        }
        Err(GenError::IdentifierExhausted {
            attempts: scope.max_attempts(),
        })
    }
}

/// Picks the identifier generator for a locale code.
pub fn for_locale(locale: &str) -> Result<Box<dyn NationalIdGenerator>, GenError> {
    match locale {
        "en_IE" => Ok(Box::new(IrishPps)),
        "zu_ZA" => Ok(Box::new(SouthAfricanId)),
        other => Err(GenError::Config(ConfigError::UnsupportedLocale(
            other.to_string(),
        ))),
    }
}

/// South African identity number: `YYMMDD G SSS C A Z`.
///
/// - `YYMMDD` birth date
/// - `G` gender digit, 0-4 female, 5-9 male
/// - `SSS` random sequence
/// - `C` citizenship, 0 for citizens
/// - `A` legacy classifier digit, 8 or 9
/// - `Z` Luhn check digit over the first 12 digits
pub struct SouthAfricanId;

impl SouthAfricanId {
    /// Recomputes the check digit and structural fields of a full 13-digit
    /// identifier.
    pub fn validate(id: &str) -> bool {
        if id.len() != 13 || !id.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        let yy: i32 = id[0..2].parse().unwrap_or(-1);
        let mm: u8 = id[2..4].parse().unwrap_or(0);
        let dd: u8 = id[4..6].parse().unwrap_or(0);
        let year = if yy <= 68 { 2000 + yy } else { 1900 + yy };
        let valid_date = Month::try_from(mm)
            .map(|month| Date::from_calendar_date(year, month, dd).is_ok())
            .unwrap_or(false);
        if !valid_date {
            return false;
        }

        let citizenship = &id[10..11];
        if citizenship != "0" && citizenship != "1" {
            return false;
        }
        let classifier = &id[11..12];
        if classifier != "8" && classifier != "9" {
            return false;
        }

        let check: u8 = id[12..13].parse().unwrap_or(10);
        luhn_check_digit(&id[0..12]) == check
    }
}

impl NationalIdGenerator for SouthAfricanId {
    fn candidate(&self, dob: Date, gender: Gender, rng: &mut dyn RngCore) -> String {
        let date_part = format!(
            "{:02}{:02}{:02}",
            dob.year().rem_euclid(100),
            u8::from(dob.month()),
            dob.day()
        );

        let gender_digit: u8 = match gender {
            Gender::Female => rng.gen_range(0..=4),
            Gender::Male => rng.gen_range(5..=9),
        };
        let sequence: u16 = rng.gen_range(0..=999);
        let citizenship = 0;
        let classifier = if rng.r#gen::<bool>() { 8 } else { 9 };

        let payload =
            format!("{date_part}{gender_digit}{sequence:03}{citizenship}{classifier}");
        let check = luhn_check_digit(&payload);
        format!("{payload}{check}")
    }
}

/// Irish Personal Public Service number: seven digits and a checksum letter.
///
/// The checksum weighs the digits 8 down to 2 by position and maps the sum
/// modulo 23 through a fixed alphabet where `W` stands for zero.
pub struct IrishPps;

const PPS_CHECKSUM_ALPHABET: &[u8; 23] = b"WABCDEFGHIJKLMNOPQRSTUV";

impl NationalIdGenerator for IrishPps {
    fn candidate(&self, _dob: Date, _gender: Gender, rng: &mut dyn RngCore) -> String {
        let digits: Vec<u32> = (0..7).map(|_| rng.gen_range(0..=9)).collect();

        let checksum: u32 = digits
            .iter()
            .enumerate()
            .map(|(i, d)| d * (8 - i as u32))
            .sum();
        let letter = PPS_CHECKSUM_ALPHABET[(checksum % 23) as usize] as char;

        let number: String = digits.iter().map(ToString::to_string).collect();
        format!("{number}{letter}")
    }
}

/// Luhn check digit over a string of ASCII digits, doubling every second
/// digit from the right.
pub(crate) fn luhn_check_digit(payload: &str) -> u8 {
    let mut total = 0u32;
    for (i, ch) in payload.chars().rev().enumerate() {
        let digit = ch.to_digit(10).unwrap_or(0);
        total += if i % 2 == 0 {
            let doubled = digit * 2;
            if doubled > 9 { doubled - 9 } else { doubled }
        } else {
            digit
        };
    }
    ((10 - (total % 10)) % 10) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::dates::parse_yymmdd;

    #[test]
    fn test_sa_id_check_digit_round_trip() {
        let generator = SouthAfricanId;
        let dob = parse_yymmdd("74/04/10").unwrap();
        let mut rng = rand::thread_rng();

        for _ in 0..200 {
            let id = generator.candidate(dob, Gender::Male, &mut rng);
            assert_eq!(id.len(), 13);
            assert!(SouthAfricanId::validate(&id), "invalid id {id}");
            assert!(id.starts_with("740410"));
        }
    }

    #[test]
    fn test_sa_id_gender_digit_ranges() {
        let generator = SouthAfricanId;
        let dob = parse_yymmdd("92/12/27").unwrap();
        let mut rng = rand::thread_rng();

        for _ in 0..100 {
            let id = generator.candidate(dob, Gender::Female, &mut rng);
            let digit: u8 = id[6..7].parse().unwrap();
            assert!(digit <= 4, "female gender digit was {digit}");

            let id = generator.candidate(dob, Gender::Male, &mut rng);
            let digit: u8 = id[6..7].parse().unwrap();
            assert!(digit >= 5, "male gender digit was {digit}");
        }
    }

    #[test]
    fn test_sa_validate_rejects_tampering() {
        let generator = SouthAfricanId;
        let dob = parse_yymmdd("80/06/10").unwrap();
        let id = generator.candidate(dob, Gender::Male, &mut rand::thread_rng());

        // Flip the check digit.
        let check: u8 = id[12..13].parse().unwrap();
        let tampered = format!("{}{}", &id[..12], (check + 1) % 10);
        assert!(!SouthAfricanId::validate(&tampered));

        assert!(!SouthAfricanId::validate("abc"));
        assert!(!SouthAfricanId::validate("9913459012083")); // month 13
    }

    #[test]
    fn test_pps_checksum_recomputes() {
        let generator = IrishPps;
        let dob = parse_yymmdd("74/04/10").unwrap();
        let mut rng = rand::thread_rng();

        for _ in 0..200 {
            let pps = generator.candidate(dob, Gender::Female, &mut rng);
            assert_eq!(pps.len(), 8);

            let digits: Vec<u32> = pps[..7]
                .chars()
                .map(|c| c.to_digit(10).unwrap())
                .collect();
            let sum: u32 = digits.iter().enumerate().map(|(i, d)| d * (8 - i as u32)).sum();
            let expected = PPS_CHECKSUM_ALPHABET[(sum % 23) as usize] as char;
            assert_eq!(pps.chars().last().unwrap(), expected);
        }
    }

    #[test]
    fn test_generate_is_unique_within_scope() {
        let generator = IrishPps;
        let dob = parse_yymmdd("74/04/10").unwrap();
        let mut scope = UniquenessScope::new();
        let mut rng = rand::thread_rng();

        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let id = generator
                .generate(dob, Gender::Male, &mut scope, &mut rng)
                .unwrap();
            assert!(seen.insert(id));
        }
        assert_eq!(scope.len(), 1000);
    }

    #[test]
    fn test_exhausted_scope_fails() {
        let generator = SouthAfricanId;
        let dob = parse_yymmdd("74/04/10").unwrap();
        let mut scope = UniquenessScope::with_max_attempts(0);

        let result = generator.generate(dob, Gender::Male, &mut scope, &mut rand::thread_rng());
        assert!(matches!(
            result,
            Err(GenError::IdentifierExhausted { attempts: 0 })
        ));
    }

    #[test]
    fn test_locale_selection() {
        assert!(for_locale("en_IE").is_ok());
        assert!(for_locale("zu_ZA").is_ok());
        assert!(for_locale("fr_FR").is_err());
    }

    #[test]
    fn test_luhn_known_value() {
        // 7992739871 is the classic worked example; its check digit is 3.
        assert_eq!(luhn_check_digit("7992739871"), 3);
    }
}
