//! Distributed driver (C7): runs `P` independent engines, one per peer, on a
//! unidirectional migration ring, then reduces to a single global best.
//!
//! Each peer is a plain `std::thread::scope` thread rather than a process.
//! The MPI-style collective is realized with `std::sync::mpsc` channels
//! (one per directed ring edge) and a shared `std::sync::Barrier`. There is
//! no network or process boundary here; the collective's shape (barrier,
//! pairwise send-receive, reduction, gather) is what is being modeled, not
//! its transport.

mod config;
mod error;

pub use config::DistributedConfig;
pub use error::DistributedError;

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Barrier};
use std::thread;

use ndarray::Array1;

use ica_core::snapshot::PhaseSnapshot;
use ica_core::{Engine, EngineConfig, NoOpSink, ObjectiveFn, RecordingSink, SnapshotSink};

/// The collective's result: the globally best point found by any peer, and
/// which peer found it.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributedOutcome {
    pub winning_peer: usize,
    pub best_fitness: f64,
    pub best_solution: Array1<f64>,
}

/// Runs the plain (non-visual) distributed collective to completion and
/// reduces to the global best.
pub fn run_distributed<F>(
    engine_config: EngineConfig,
    objective: &F,
    dist_config: DistributedConfig,
) -> Result<DistributedOutcome, DistributedError>
where
    F: ObjectiveFn,
{
    let engines = build_peer_engines::<F, NoOpSink>(engine_config, objective, dist_config.peers)?;
    let finished = run_ring(engines, dist_config)?;
    Ok(reduce(&finished))
}

/// Runs the visual distributed collective: every peer records its own
/// phase-snapshot history, which is gathered at the end via the same flat
/// C5 encoding used for cross-peer transport, proving each peer's history
/// round-trips through serialization before being handed back.
pub fn run_distributed_visual<F>(
    engine_config: EngineConfig,
    objective: &F,
    dist_config: DistributedConfig,
) -> Result<(DistributedOutcome, Vec<Vec<PhaseSnapshot>>), DistributedError>
where
    F: ObjectiveFn,
{
    let engines =
        build_peer_engines::<F, RecordingSink>(engine_config, objective, dist_config.peers)?;
    let finished = run_ring(engines, dist_config)?;
    let outcome = reduce(&finished);
    let histories = gather_visualization_history(finished)?;
    Ok((outcome, histories))
}

fn build_peer_engines<F, S>(
    engine_config: EngineConfig,
    objective: &F,
    peers: usize,
) -> Result<Vec<Engine<&F, S>>, DistributedError>
where
    F: ObjectiveFn,
    S: BuildSink<F>,
{
    (0..peers)
        .map(|peer| {
            let mut cfg = engine_config;
            cfg.seed = config::peer_seed(engine_config.seed, peer);
            S::build_engine(cfg, objective)
        })
        .collect()
}

/// `Engine::new`/`new_visual` are inherent on `NoOpSink`/`RecordingSink`
/// respectively rather than generic; this trait picks the right one for a
/// generic `S` at the two call sites above.
trait BuildSink<F: ObjectiveFn>: SnapshotSink + Sized {
    fn build_engine(cfg: EngineConfig, objective: &F) -> Result<Engine<&F, Self>, DistributedError>;
}

impl<F: ObjectiveFn> BuildSink<F> for NoOpSink {
    fn build_engine(cfg: EngineConfig, objective: &F) -> Result<Engine<&F, Self>, DistributedError> {
        Engine::new(cfg, objective).map_err(DistributedError::from)
    }
}

impl<F: ObjectiveFn> BuildSink<F> for RecordingSink {
    fn build_engine(cfg: EngineConfig, objective: &F) -> Result<Engine<&F, Self>, DistributedError> {
        Engine::new_visual(cfg, objective).map_err(DistributedError::from)
    }
}

/// Runs every peer's lifecycle (§4.5 steps 1-3) inside one `thread::scope`,
/// wired into a ring of `mpsc` channels, and returns each peer's finished
/// engine in peer-rank order.
fn run_ring<F, S>(
    mut engines: Vec<Engine<&F, S>>,
    dist_config: DistributedConfig,
) -> Result<Vec<Engine<&F, S>>, DistributedError>
where
    F: ObjectiveFn,
    S: SnapshotSink,
{
    let peers = engines.len();
    debug_assert_eq!(peers, dist_config.peers);

    // One mpsc channel per directed ring edge: edge k carries peer k's
    // elite to peer (k+1) mod P. Built before any thread is spawned, so
    // every peer can be handed its outgoing sender and incoming receiver
    // up front.
    let mut senders: Vec<Sender<Array1<f64>>> = Vec::with_capacity(peers);
    let mut receivers: Vec<Option<Receiver<Array1<f64>>>> = (0..peers).map(|_| None).collect();
    for k in 0..peers {
        let (tx, rx) = mpsc::channel();
        senders.push(tx);
        receivers[(k + 1) % peers] = Some(rx);
    }

    let barrier = Arc::new(Barrier::new(peers));

    let results: Vec<thread::Result<Result<Engine<&F, S>, DistributedError>>> = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(peers);
        for (peer, (engine, tx)) in engines.drain(..).zip(senders.into_iter()).enumerate() {
            let rx = receivers[peer].take().expect("one receiver per peer");
            let barrier = Arc::clone(&barrier);
            let iterations_per_cycle = dist_config.iterations_per_cycle;
            let migration_cycles = dist_config.migration_cycles;
            handles.push(scope.spawn(move || {
                run_peer(peer, engine, tx, rx, barrier, iterations_per_cycle, migration_cycles)
            }));
        }
        handles.into_iter().map(|h| h.join()).collect()
    });

    results
        .into_iter()
        .enumerate()
        .map(|(peer, joined)| match joined {
            Ok(Ok(engine)) => Ok(engine),
            Ok(Err(e)) => Err(e),
            Err(_panic) => Err(DistributedError::PeerPanicked(peer)),
        })
        .collect()
}

/// One peer's lifecycle: initial run, then `migration_cycles` rounds of
/// barrier / ring exchange / `migrate_best` / bounded re-run (§4.5 steps
/// 2-3). Runs entirely on the calling (scoped) thread.
fn run_peer<F, S>(
    peer: usize,
    mut engine: Engine<&F, S>,
    tx_to_successor: Sender<Array1<f64>>,
    rx_from_predecessor: Receiver<Array1<f64>>,
    barrier: Arc<Barrier>,
    iterations_per_cycle: usize,
    migration_cycles: usize,
) -> Result<Engine<&F, S>, DistributedError>
where
    F: ObjectiveFn,
    S: SnapshotSink,
{
    engine.setup();
    engine.run();

    for _ in 0..migration_cycles {
        barrier.wait();

        let elite = engine.best_solution();
        tx_to_successor.send(elite).map_err(|_| DistributedError::ChannelDisconnected(peer))?;
        let received =
            rx_from_predecessor.recv().map_err(|_| DistributedError::ChannelDisconnected(peer))?;

        engine.migrate_best(received);
        engine.set_max_iter(iterations_per_cycle);
        engine.run();
    }

    Ok(engine)
}

/// Global reduction (§4.5 step 4): argmin over (`best_fitness`), tie-broken
/// by lowest peer rank. Iterating peers in ascending order and using a
/// strict `<` comparison gives that tie-break for free.
fn reduce<F, S>(engines: &[Engine<&F, S>]) -> DistributedOutcome
where
    F: ObjectiveFn,
    S: SnapshotSink,
{
    let mut winning_peer = 0;
    let mut best_fitness = f64::INFINITY;
    let mut best_solution = Array1::zeros(engines.first().map(|e| e.config().dim).unwrap_or(0));

    for (peer, engine) in engines.iter().enumerate() {
        let fitness = engine.best_fitness();
        if fitness < best_fitness {
            best_fitness = fitness;
            best_solution = engine.best_solution();
            winning_peer = peer;
        }
    }

    DistributedOutcome { winning_peer, best_fitness, best_solution }
}

/// Snapshot gather (§4.5 step 5), visual mode only: every peer's history is
/// run through the C5 flat encode/decode pair, proving the round-trip
/// before returning it, rather than handing back the in-process `Vec`
/// directly.
fn gather_visualization_history<F>(
    engines: Vec<Engine<&F, RecordingSink>>,
) -> Result<Vec<Vec<PhaseSnapshot>>, DistributedError>
where
    F: ObjectiveFn,
{
    engines
        .into_iter()
        .map(|engine| {
            let history = engine.into_history();
            let buffer = ica_core::snapshot::serialize(&history);
            ica_core::snapshot::deserialize(&buffer).map_err(DistributedError::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ica_core::EngineConfigBuilder;
    use ica_testfunctions::sphere;

    fn config() -> EngineConfig {
        EngineConfigBuilder::new().pop_size(20).dim(2).max_iter(20).bounds(-5.0, 5.0).seed(1).build()
    }

    #[test]
    fn single_peer_ring_sends_to_itself_and_leaves_best_fitness_unchanged() {
        let cfg = config();
        let outcome =
            run_distributed(cfg, &sphere, DistributedConfig::new(1, 5, 3)).expect("collective ok");
        assert_eq!(outcome.winning_peer, 0);
        assert!(outcome.best_fitness.is_finite());
    }

    #[test]
    fn four_peer_ring_reduces_to_a_single_finite_best() {
        let cfg = config();
        let outcome =
            run_distributed(cfg, &sphere, DistributedConfig::new(4, 5, 4)).expect("collective ok");
        assert!(outcome.winning_peer < 4);
        assert!(outcome.best_fitness.is_finite());
        assert_eq!(outcome.best_solution.len(), 2);
    }

    #[test]
    fn visual_four_peer_ring_gathers_one_round_tripped_history_per_peer() {
        let cfg = config();
        let (outcome, histories) =
            run_distributed_visual(cfg, &sphere, DistributedConfig::new(4, 5, 3))
                .expect("collective ok");
        assert!(outcome.best_fitness.is_finite());
        assert_eq!(histories.len(), 4);
        for history in &histories {
            assert!(!history.is_empty());
        }
    }

    #[test]
    fn reduction_tie_breaks_by_lowest_peer_rank() {
        let cfg = config();
        let mut first = Engine::new(cfg, &sphere).unwrap();
        first.setup();
        let mut second = Engine::new(cfg, &sphere).unwrap();
        second.setup();

        // Drive both peers' best_fitness to the same exact value so the
        // reduction's tie-break is what decides the winner.
        let origin = Array1::zeros(cfg.dim);
        first.migrate_best(origin.clone());
        second.migrate_best(origin);
        assert_eq!(first.best_fitness(), second.best_fitness());

        let outcome = reduce(&[first, second]);
        assert_eq!(outcome.winning_peer, 0);
    }
}
