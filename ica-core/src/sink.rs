//! Snapshot sinks (C4/C9 design note): the capability object the engine
//! calls into when a phase completes. A non-visual engine is built with
//! [`NoOpSink`]; a visual engine is built with [`RecordingSink`], which owns
//! the append-only history.
//!
//! This replaces what the reference algorithm expresses as a subclass
//! (`Visual_ICA` extending `ICA`) with composition: one `Engine` type,
//! parameterized over the sink it was constructed with.

use crate::country::Country;
use crate::snapshot::PhaseSnapshot;
use std::fmt;

/// One of the four per-iteration operators a visual engine snapshots after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Assimilation,
    Revolution,
    Mutiny,
    ImperialWar,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Assimilation => "Assimilation",
            Phase::Revolution => "Revolution",
            Phase::Mutiny => "Mutiny",
            Phase::ImperialWar => "Imperial War",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The capability set an engine drives: told when a phase completes, and
/// whether it needs empires color-tagged at setup.
///
/// `Sync` is required so the shared-memory driver (C6) can read-share an
/// `Engine` across its worker pool during a parallel phase; the sink is
/// only ever mutated back on the orchestrating thread, between phases.
pub trait SnapshotSink: Send + Sync {
    /// Whether the engine should assign and propagate empire colors. `false`
    /// for a plain engine; colors would otherwise never be read.
    fn wants_color(&self) -> bool {
        false
    }

    /// Called once per operator, in operator order, with the full population.
    fn on_phase_complete(&mut self, phase: Phase, countries: &[Country]) {
        let _ = (phase, countries);
    }
}

/// The sink a non-visual engine is built with. Does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl SnapshotSink for NoOpSink {}

/// The sink a visual engine is built with. Records one [`PhaseSnapshot`]
/// per operator, in order, and never reorders or drops one.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    history: Vec<PhaseSnapshot>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded history so far, in append order.
    pub fn history(&self) -> &[PhaseSnapshot] {
        &self.history
    }

    /// Takes ownership of the recorded history, leaving it empty.
    pub fn into_history(self) -> Vec<PhaseSnapshot> {
        self.history
    }
}

impl SnapshotSink for RecordingSink {
    fn wants_color(&self) -> bool {
        true
    }

    fn on_phase_complete(&mut self, phase: Phase, countries: &[Country]) {
        self.history.push(PhaseSnapshot::capture(phase, countries));
    }
}
