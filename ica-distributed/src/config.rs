//! Topology and schedule for the distributed ring (§4.5).

/// `P` peers, and the migration schedule run after each peer's initial
/// `engine_config.max_iter` iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributedConfig {
    pub peers: usize,
    pub iterations_per_cycle: usize,
    pub migration_cycles: usize,
}

impl DistributedConfig {
    pub fn new(peers: usize, iterations_per_cycle: usize, migration_cycles: usize) -> Self {
        Self { peers, iterations_per_cycle, migration_cycles }
    }
}

/// Derives a per-peer seed from a base seed so that peers run independent,
/// reproducible streams rather than sharing one. `None` leaves every peer
/// seeded from OS entropy, same as a single-engine run.
pub(crate) fn peer_seed(base: Option<u64>, peer: usize) -> Option<u64> {
    base.map(|seed| seed.wrapping_add(peer as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
