//! Approximate event counting with a fixed relative error
//!
//! Stores the number of times an event occurred in `O(log log n)` bits by
//! keeping the exponent of a power-of-two bucket instead of the count itself.
//! A stored value `v` represents an estimated `2^v - 1` true events. Advancing
//! past a bucket boundary is deterministic; advancing within a bucket happens
//! with probability proportional to the remainder, which keeps the estimator
//! unbiased.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Width of the bucket a stored value sits in
fn bucket_width(value: u64) -> u64 {
    1u64 << value.min(63)
}

/// Advance a stored approximate value by `increment` true events.
///
/// Whole buckets covered by the increment are consumed deterministically.
/// The remainder advances the value by at most one more step, with
/// probability `remainder / bucket_width`, decided by `random`.
///
/// `random` must lie in `[0, 1]`; drawn variates are uniform on `[0, 1)`.
pub fn approximate_increment(current: u64, increment: u64, random: f64) -> u64 {
    debug_assert!((0.0..=1.0).contains(&random), "random must lie in [0, 1]");
    let mut value = current;
    let mut remaining = increment;
    while remaining >= bucket_width(value) {
        remaining -= bucket_width(value);
        value += 1;
    }
    if remaining == 0 {
        return value;
    }
    if random <= remaining as f64 / bucket_width(value) as f64 {
        value += 1;
    }
    value
}

/// Estimated number of true events represented by a stored value
pub fn estimated_total(value: u64) -> u64 {
    if value >= 64 {
        u64::MAX
    } else {
        (1u64 << value) - 1
    }
}

/// Approximate counter advancing stored values with its own random source
#[derive(Debug)]
pub struct AdaptiveCounter {
    rng: StdRng,
}

impl AdaptiveCounter {
    /// Create a counter seeded from system entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a counter with a fixed seed, for reproducible behavior
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Advance a stored approximate value by `increment` true events
    pub fn advance(&mut self, current: u64, increment: u64) -> u64 {
        let random = self.rng.gen::<f64>();
        approximate_increment(current, increment, random)
    }
}

impl Default for AdaptiveCounter {
    fn default() -> Self {
        Self::new()
    }
}
