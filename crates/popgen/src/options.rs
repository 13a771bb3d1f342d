//! Built-in demographic option sets.
//!
//! Weights approximate the 2022 Irish census:
//! - marital status: 43% never married, 46% married (incl. remarried and
//!   civil partnerships), 3% separated, 3% divorced, 5% widowed
//! - gender: 49.4% male (2,544,549), 50.6% female (2,604,590)
//! - families with children: ~69%
//! - children per family: 42% none, 26% one, 22% two, 7% three, 2% four,
//!   1% five or more
//! - accounts per person: 1-3 accounts covers ~80% of consumers, a small
//!   tail holds specialty accounts
//!
//! The age distribution models adults only; children are generated on top
//! of these counts.

use crate::records::{Gender, LivingStatus, MaritalStatus};
use crate::weighted::OptionSet;

/// One adult age bracket: bracket start age, share of the adult population,
/// and the target person count for the bracket.
#[derive(Debug, Clone, Copy)]
pub struct AgeBracket {
    pub start_age: i32,
    pub share: f64,
    pub count: u64,
}

/// Adult age distribution by decade bracket.
pub fn age_brackets() -> Vec<AgeBracket> {
    vec![
        AgeBracket { start_age: 20, share: 0.17, count: 875_353 },
        AgeBracket { start_age: 30, share: 0.20, count: 1_029_827 },
        AgeBracket { start_age: 40, share: 0.17, count: 875_353 },
        AgeBracket { start_age: 50, share: 0.19, count: 978_336 },
        AgeBracket { start_age: 60, share: 0.16, count: 823_862 },
        AgeBracket { start_age: 70, share: 0.11, count: 566_405 },
    ]
}

/// The weighted option sets behind every household draw.
#[derive(Debug, Clone)]
pub struct DemographicOptions {
    pub gender: OptionSet<Gender>,
    pub marital: OptionSet<MaritalStatus>,
    pub has_children: OptionSet<bool>,
    pub children_count: OptionSet<u32>,
    pub mother_custody: OptionSet<bool>,
    pub living_status: OptionSet<LivingStatus>,
    pub accounts_per_person: OptionSet<u32>,
    pub cards_per_person: OptionSet<u32>,
    pub account_types: OptionSet<&'static str>,
}

impl DemographicOptions {
    pub fn census_2022() -> Self {
        Self {
            gender: OptionSet::new(
                vec![(Gender::Male, 0.494), (Gender::Female, 0.506)],
                1.0,
            )
            .unwrap(),
            marital: OptionSet::new(
                vec![
                    (MaritalStatus::Single, 0.43),
                    (MaritalStatus::Married, 0.46),
                    (MaritalStatus::Separated, 0.03),
                    (MaritalStatus::Divorced, 0.03),
                    (MaritalStatus::Widowed, 0.05),
                ],
                1.0,
            )
            .unwrap(),
            has_children: OptionSet::new(vec![(false, 0.31), (true, 0.69)], 1.0).unwrap(),
            children_count: OptionSet::new(
                vec![
                    (0, 0.42),
                    (1, 0.26),
                    (2, 0.22),
                    (3, 0.07),
                    (4, 0.02),
                    (5, 0.01),
                ],
                1.0,
            )
            .unwrap(),
            mother_custody: OptionSet::new(vec![(false, 0.1), (true, 0.9)], 1.0).unwrap(),
            living_status: OptionSet::new(
                vec![(LivingStatus::Living, 0.85), (LivingStatus::Deceased, 0.15)],
                1.0,
            )
            .unwrap(),
            accounts_per_person: OptionSet::new(
                vec![
                    (1, 0.35),
                    (2, 0.29),
                    (3, 0.18),
                    (4, 0.08),
                    (5, 0.05),
                    (6, 0.03),
                    (7, 0.02),
                ],
                1.0,
            )
            .unwrap(),
            cards_per_person: OptionSet::new(vec![(1, 0.65), (2, 0.25), (3, 0.10)], 1.0)
                .unwrap(),
            account_types: OptionSet::new(
                vec![
                    ("Current Accounts", 0.55),
                    ("Savings/Deposit", 0.30),
                    ("Business Accounts", 0.15),
                ],
                1.0,
            )
            .unwrap(),
        }
    }
}

impl Default for DemographicOptions {
    fn default() -> Self {
        Self::census_2022()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_census_options_build() {
        let opts = DemographicOptions::census_2022();
        assert_eq!(opts.marital.len(), 5);
        assert!((opts.gender.total_weight() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_age_brackets_cover_adult_decades() {
        let brackets = age_brackets();
        assert_eq!(brackets.len(), 6);
        assert_eq!(brackets[0].start_age, 20);
        let share: f64 = brackets.iter().map(|b| b.share).sum();
        assert!((share - 1.0).abs() < 1e-9);
    }
}
