//! Shared-memory driver (C6): parallelizes the ICA engine's per-iteration
//! operators across a fixed-size, persistent pool of worker threads.
//!
//! The parallel operator bodies themselves live on `ica_core::Engine`
//! (`run_parallel` and friends), since they need access to the engine's
//! internals; this crate is the thin driver around them that resolves a
//! worker count, builds the `rayon::ThreadPool` once, and reuses it for
//! every `run`.

use ica_core::{Engine, ObjectiveFn, SnapshotSink};
use rayon::{ThreadPool, ThreadPoolBuildError};
use thiserror::Error;

/// Failure building the worker pool. Fatal to the driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to build a {0}-thread pool: {1}")]
    PoolBuild(usize, ThreadPoolBuildError),
}

/// Drives an [`Engine`] across a persistent pool of `T_w` worker threads.
///
/// The pool is built once, at construction, and reused for every call to
/// [`SharedMemoryDriver::run`]; it is never rebuilt per iteration.
pub struct SharedMemoryDriver {
    pool: ThreadPool,
    n_workers: usize,
}

impl SharedMemoryDriver {
    /// Builds a driver with `n_workers` worker threads, or
    /// [`ica_env::default_worker_count`] (the host's logical CPU count) if
    /// `n_workers` is `None`.
    pub fn new(n_workers: Option<usize>) -> Result<Self, DriverError> {
        let n_workers = n_workers.unwrap_or_else(ica_env::default_worker_count).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_workers)
            .build()
            .map_err(|e| DriverError::PoolBuild(n_workers, e))?;
        log::info!("shared-memory driver ready with {n_workers} worker threads");
        Ok(Self { pool, n_workers })
    }

    /// The number of worker threads this driver's pool was built with.
    pub fn worker_count(&self) -> usize {
        self.n_workers
    }

    /// Runs `engine` to completion, parallelizing per-country work across
    /// this driver's pool. `engine.setup()` must already have been called.
    pub fn run<F, S>(&self, engine: &mut Engine<F, S>)
    where
        F: ObjectiveFn,
        S: SnapshotSink,
    {
        engine.run_parallel(&self.pool);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ica_core::{Engine, EngineConfigBuilder};
    use ica_testfunctions::sphere;

    #[test]
    fn runs_with_an_explicit_worker_count() {
        let driver = SharedMemoryDriver::new(Some(4)).unwrap();
        assert_eq!(driver.worker_count(), 4);

        let config = EngineConfigBuilder::new()
            .pop_size(30)
            .dim(3)
            .max_iter(20)
            .seed(11)
            .build();
        let mut engine = Engine::new(config, sphere).unwrap();
        engine.setup();
        driver.run(&mut engine);

        assert!(engine.best_fitness().is_finite());
        assert_eq!(engine.empires().len() + engine.colonies().len(), engine.countries().len());
    }

    #[test]
    fn default_worker_count_is_at_least_one() {
        let driver = SharedMemoryDriver::new(None).unwrap();
        assert!(driver.worker_count() >= 1);
    }

    #[test]
    fn invariants_hold_across_worker_counts() {
        for workers in [1, 2, 4, 8] {
            let driver = SharedMemoryDriver::new(Some(workers)).unwrap();
            let config = EngineConfigBuilder::new()
                .pop_size(100)
                .dim(4)
                .max_iter(30)
                .seed(workers as u64)
                .build();
            let mut engine = Engine::new(config, sphere).unwrap();
            engine.setup();
            driver.run(&mut engine);

            assert_eq!(engine.empires().len() + engine.colonies().len(), engine.countries().len());
            for &h in engine.colonies() {
                let owner = engine.countries()[h].empire_of.expect("colony has an empire");
                assert!(engine.empires().contains(&owner));
                assert!(engine.countries()[owner].vassals.contains(&h));
            }
        }
    }
}
