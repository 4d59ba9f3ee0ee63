//! Per-fit seed derivation.
//!
//! Every candidate `k` gets its own seed, drawn in order from a generator
//! seeded with the sweep's top-level seed. Seeds are derived before any fit
//! starts, so they do not depend on scheduling or on which fits fail.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Derive `count` seeds from `top_seed`.
pub fn derive_seeds(top_seed: u64, count: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(top_seed);
    (0..count).map(|_| rng.random::<u64>()).collect()
}

/// Pair each topic count with its derived seed, in input order.
pub fn seeds_for(top_seed: u64, topic_counts: &[usize]) -> Vec<(usize, u64)> {
    topic_counts
        .iter()
        .copied()
        .zip(derive_seeds(top_seed, topic_counts.len()))
        .collect()
}
