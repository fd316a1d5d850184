//! Seeded random streams and weighted sampling.

use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::ConfigError;

/// The independent parts of a run that each get their own random streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Providers = 1,
    Payers = 2,
    Patients = 3,
    Claims = 4,
}

/// Derives deterministic, non-overlapping generators from one run seed.
///
/// Every `(domain, index)` pair maps to its own ChaCha stream, so chunks can be
/// produced in any order (or in parallel) and still yield the same data.
#[derive(Debug, Clone, Copy)]
pub struct SeedSequence {
    seed: u64,
}

impl SeedSequence {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn rng(&self, domain: Domain, index: u64) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(((domain as u64) << 48) | (index & 0xFFFF_FFFF_FFFF));
        rng
    }
}

/// A discrete distribution over arbitrary values, built once and sampled many
/// times (cumulative weights with binary search).
#[derive(Debug, Clone)]
pub struct Discrete<T> {
    values: Vec<T>,
    index: WeightedIndex<f64>,
}

impl<T> Discrete<T> {
    pub fn new(
        what: &'static str,
        entries: impl IntoIterator<Item = (T, f64)>,
    ) -> Result<Self, ConfigError> {
        let (values, weights): (Vec<T>, Vec<f64>) = entries.into_iter().unzip();
        let index = WeightedIndex::new(&weights).map_err(|e| ConfigError::InvalidWeights {
            what,
            reason: e.to_string(),
        })?;
        Ok(Self { values, index })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        &self.values[self.index.sample(rng)]
    }
}

/// Uniformly picks one element. Callers guarantee `items` is non-empty.
pub fn pick<'a, T, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

/// Rounds to whole cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
