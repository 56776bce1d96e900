use crate::config::QolRange;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Single source of randomness for the engine.
///
/// Everything random (event rolls, QoL deltas, weighted picks) goes through
/// this port so tests can script outcomes.
pub trait RandomSource {
    /// Uniform integer in `min..=max`. Returns `min` when `max < min`.
    fn range_inclusive(&mut self, min: i64, max: i64) -> i64;

    /// `true` with probability `p`.
    fn chance(&mut self, p: f64) -> bool;

    /// Index into `weights`, proportional to weight.
    fn weighted_index(&mut self, weights: &[u32]) -> usize;

    /// Roll a QoL delta from a configured range.
    fn roll(&mut self, range: QolRange) -> i32 {
        self.range_inclusive(i64::from(range.min), i64::from(range.max)) as i32
    }
}

/// `StdRng`-backed source.
pub struct SeededRng {
    rng: StdRng,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRng {
    fn range_inclusive(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    fn weighted_index(&mut self, weights: &[u32]) -> usize {
        match WeightedIndex::new(weights) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(e) => {
                log::warn!("Weighted draw over {:?} failed: {}", weights, e);
                0
            }
        }
    }
}
