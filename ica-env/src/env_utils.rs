//! Environment variable and host-topology utilities.

use crate::constants::ICA_LOG_ENV;
use std::env;
use std::sync::Once;

static LOGGER_INIT: Once = Once::new();

/// Initializes the global logger exactly once, honoring `ICA_LOG` (falling back to `RUST_LOG`).
///
/// Safe to call from multiple crates/tests; subsequent calls are no-ops.
pub fn init_logging() {
    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        let filter = env::var(ICA_LOG_ENV)
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());
        builder.parse_filters(&filter);
        let _ = builder.try_init();
    });
}

/// Default worker-thread count for the shared-memory driver: the number of logical CPUs,
/// clamped to at least one.
pub fn default_worker_count() -> usize {
    num_cpus::get().max(1)
}
