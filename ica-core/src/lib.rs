//! Sequential and thread-parallelizable Imperialist Competitive Algorithm
//! engine.
//!
//! [`Engine`] is the whole evolutionary loop (C3/C4): population init,
//! empire formation, and the assimilation/revolution/mutiny/imperial-war
//! operators, with an optional [`sink::RecordingSink`] for visual playback.
//! [`Engine::run_parallel`] drives the same operators across a `rayon`
//! thread pool for the shared-memory layer (`ica-parallel`); the
//! distributed layer (`ica-distributed`) composes several engines.

pub mod config;
pub mod country;
pub mod engine;
pub mod error;
pub mod objective;
pub mod rng;
pub mod sink;
pub mod snapshot;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use country::{Country, Handle};
pub use engine::Engine;
pub use error::ConfigError;
pub use objective::ObjectiveFn;
pub use sink::{NoOpSink, Phase, RecordingSink, SnapshotSink};
pub use snapshot::{deserialize, serialize, CountryRecord, PhaseSnapshot, SnapshotError};
