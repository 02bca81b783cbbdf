//! Umbrella crate over the ICA optimizer workspace: the engine, the
//! shared-memory thread-pool driver, and the distributed ring driver, under
//! one dependency.
//!
//! This crate carries no logic of its own. The interactive viewer and the
//! command-line entry point this workspace is meant to be embedded in are
//! external collaborators; their contract with the core is exactly what is
//! re-exported here: an objective and hyperparameters in, a best solution,
//! best fitness, and (in visual mode) a phase-snapshot history out.

// Re-export member crates under short names.
pub use ica_core as core;
pub use ica_distributed as distributed;
pub use ica_env as env;
pub use ica_parallel as parallel;
pub use ica_testfunctions as testfunctions;

// Flatten the engine's commonly used items.
pub use ica_core::{
    ConfigError, Country, Engine, EngineConfig, EngineConfigBuilder, Handle, NoOpSink,
    ObjectiveFn, Phase, PhaseSnapshot, RecordingSink, SnapshotSink,
};

// Shared-memory driver.
pub use ica_parallel::{DriverError, SharedMemoryDriver};

// Distributed driver.
pub use ica_distributed::{
    run_distributed, run_distributed_visual, DistributedConfig, DistributedError,
    DistributedOutcome,
};

// Benchmark objectives, handy for examples and quick experiments.
pub use ica_testfunctions::{default_bounds, rastrigin, rosenbrock, sphere};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_plain_engine_runs_end_to_end_through_the_facade() {
        let config = EngineConfigBuilder::new()
            .pop_size(30)
            .dim(2)
            .max_iter(20)
            .bounds(-5.0, 5.0)
            .seed(7)
            .build();
        let mut engine = Engine::new(config, sphere).unwrap();
        engine.setup();
        engine.run();
        assert!(engine.best_fitness().is_finite());
    }

    #[test]
    fn a_shared_memory_run_goes_through_the_facade() {
        let config = EngineConfigBuilder::new()
            .pop_size(30)
            .dim(2)
            .max_iter(20)
            .bounds(-5.0, 5.0)
            .seed(8)
            .build();
        let mut engine = Engine::new(config, sphere).unwrap();
        engine.setup();
        let driver = SharedMemoryDriver::new(Some(2)).unwrap();
        driver.run(&mut engine);
        assert!(engine.best_fitness().is_finite());
    }

    #[test]
    fn a_distributed_run_goes_through_the_facade() {
        let config = EngineConfigBuilder::new()
            .pop_size(20)
            .dim(2)
            .max_iter(10)
            .bounds(-5.0, 5.0)
            .seed(9)
            .build();
        let outcome =
            run_distributed(config, &sphere, DistributedConfig::new(3, 5, 2)).unwrap();
        assert!(outcome.best_fitness.is_finite());
    }
}
