//! Per-engine RNG stream construction.
//!
//! Every engine, and in the shared-memory driver every worker thread, owns
//! an independent `StdRng` stream. None is ever shared across threads.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Builds an RNG stream, either deterministic from `seed` or seeded from OS entropy.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Derives one independent sub-stream per worker index from a base seed (or
/// entropy), for the shared-memory driver's per-thread RNGs. Each worker's
/// stream is seeded distinctly so no two threads ever draw from the same
/// sequence.
pub fn make_worker_rngs(base_seed: Option<u64>, n_workers: usize) -> Vec<StdRng> {
    match base_seed {
        Some(s) => (0..n_workers)
            .map(|i| StdRng::seed_from_u64(s.wrapping_add(i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)))
            .collect(),
        None => (0..n_workers).map(|_| StdRng::from_rng(&mut rand::rng())).collect(),
    }
}
