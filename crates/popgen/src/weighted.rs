//! Weighted random selection over labelled option sets.
//!
//! Every stochastic decision in the engine (gender, marital status, bank,
//! province, number of children, ...) is a draw from an [`OptionSet`]: an
//! ordered list of labels with relative weights. Labels are carried through
//! unchanged, so they can be plain scalars or structured values.

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use tracing::warn;

use crate::error::GenError;

/// How a draw maps a uniform random number onto the option list.
///
/// Both strategies produce the same distribution; `CumulativeWalk` exists as
/// an auditable reference implementation for deterministic reasoning in
/// tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Cumulative-weight inversion through [`WeightedIndex`], one uniform
    /// draw per pick.
    #[default]
    Index,
    /// Manual walk down the running cumulative sum.
    CumulativeWalk,
}

/// An ordered set of `(label, weight)` options with a declared weight scale.
#[derive(Debug, Clone)]
pub struct OptionSet<T> {
    labels: Vec<T>,
    weights: Vec<f64>,
    total: f64,
    strategy: Strategy,
    index: WeightedIndex<f64>,
}

impl<T: Clone> OptionSet<T> {
    /// Builds an option set. `scale` is the expected sum of the weights; a
    /// mismatch is only warned about, and the actual weights are used as-is.
    ///
    /// Fails with [`GenError::EmptyOptionSet`] for an empty list,
    /// [`GenError::InvalidWeight`] for a negative or non-finite weight, and
    /// [`GenError::ZeroTotalWeight`] when the weights sum to zero.
    pub fn new(options: Vec<(T, f64)>, scale: f64) -> Result<Self, GenError> {
        if options.is_empty() {
            return Err(GenError::EmptyOptionSet);
        }

        let (labels, weights): (Vec<T>, Vec<f64>) = options.into_iter().unzip();

        for (i, w) in weights.iter().enumerate() {
            if !w.is_finite() || *w < 0.0 {
                return Err(GenError::InvalidWeight(i));
            }
        }

        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(GenError::ZeroTotalWeight);
        }

        if (total - scale).abs() > 1e-9 {
            warn!("Option weights sum to {total}, expected scale {scale}");
        }

        let index = WeightedIndex::new(weights.iter().copied())
            .map_err(|_| GenError::ZeroTotalWeight)?;

        Ok(Self {
            labels,
            weights,
            total,
            strategy: Strategy::default(),
            index,
        })
    }

    /// Switches the selection strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Draws one label according to the weights.
    pub fn pick(&self, rng: &mut impl Rng) -> T {
        match self.strategy {
            Strategy::Index => self.labels[self.index.sample(rng)].clone(),
            Strategy::CumulativeWalk => self.pick_cumulative(rng),
        }
    }

    /// Reference implementation: scale one uniform draw to the total weight
    /// and walk the running sum until it is passed.
    fn pick_cumulative(&self, rng: &mut impl Rng) -> T {
        let target = rng.r#gen::<f64>() * self.total;

        let mut cumulative = 0.0;
        for (label, weight) in self.labels.iter().zip(&self.weights) {
            cumulative += weight;
            if target <= cumulative {
                return label.clone();
            }
        }

        // Floating-point tail: the last label owns the remainder.
        self.labels[self.labels.len() - 1].clone()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sum of the actual weights.
    pub fn total_weight(&self) -> f64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn frequencies(set: &OptionSet<&'static str>, draws: usize) -> HashMap<&'static str, f64> {
        let mut rng = rand::thread_rng();
        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        for _ in 0..draws {
            *counts.entry(set.pick(&mut rng)).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(k, v)| (k, v as f64 / draws as f64))
            .collect()
    }

    #[test]
    fn test_distribution_converges_on_weights() {
        let set =
            OptionSet::new(vec![("A", 0.5), ("B", 0.3), ("C", 0.2)], 1.0).unwrap();
        let freq = frequencies(&set, 10_000);

        assert!((0.46..=0.54).contains(&freq["A"]), "A was {}", freq["A"]);
        assert!((0.26..=0.34).contains(&freq["B"]), "B was {}", freq["B"]);
        assert!((0.16..=0.24).contains(&freq["C"]), "C was {}", freq["C"]);
    }

    #[test]
    fn test_strategies_are_statistically_equivalent() {
        let walk = OptionSet::new(vec![("A", 0.5), ("B", 0.3), ("C", 0.2)], 1.0)
            .unwrap()
            .with_strategy(Strategy::CumulativeWalk);
        let freq = frequencies(&walk, 10_000);

        assert!((0.46..=0.54).contains(&freq["A"]), "A was {}", freq["A"]);
        assert!((0.26..=0.34).contains(&freq["B"]), "B was {}", freq["B"]);
        assert!((0.16..=0.24).contains(&freq["C"]), "C was {}", freq["C"]);
    }

    #[test]
    fn test_single_element_always_wins() {
        let mut rng = rand::thread_rng();
        for weight in [0.001, 1.0, 42.0] {
            let set = OptionSet::new(vec![("only", weight)], weight).unwrap();
            for _ in 0..100 {
                assert_eq!(set.pick(&mut rng), "only");
            }
        }
    }

    #[test]
    fn test_empty_set_is_an_error() {
        let options: Vec<(&str, f64)> = Vec::new();
        assert!(matches!(
            OptionSet::new(options, 1.0),
            Err(GenError::EmptyOptionSet)
        ));
    }

    #[test]
    fn test_zero_total_weight_is_an_error() {
        assert!(matches!(
            OptionSet::new(vec![("A", 0.0), ("B", 0.0)], 1.0),
            Err(GenError::ZeroTotalWeight)
        ));
    }

    #[test]
    fn test_negative_weight_is_an_error() {
        assert!(matches!(
            OptionSet::new(vec![("A", 0.5), ("B", -0.1)], 1.0),
            Err(GenError::InvalidWeight(1))
        ));
    }

    #[test]
    fn test_scale_mismatch_still_draws() {
        // Warned, not fatal: the actual weights keep working.
        let set = OptionSet::new(vec![("A", 2.0), ("B", 2.0)], 1.0).unwrap();
        let freq = frequencies(&set, 4_000);
        assert!((0.44..=0.56).contains(&freq["A"]));
    }

    #[test]
    fn test_structured_labels_pass_through() {
        #[derive(Debug, Clone, PartialEq)]
        struct Doc {
            id: u32,
            title: &'static str,
        }

        let set = OptionSet::new(
            vec![(
                Doc {
                    id: 1,
                    title: "only doc",
                },
                0.4,
            )],
            0.4,
        )
        .unwrap();

        let picked = set.pick(&mut rand::thread_rng());
        assert_eq!(picked.id, 1);
        assert_eq!(picked.title, "only doc");
    }
}
