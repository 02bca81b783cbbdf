//! Environment and runtime utilities shared across the ICA optimizer workspace.
//!
//! This crate centralizes environment variable handling, logging bootstrap and
//! host-topology defaults so that the optimization crates stay focused on the
//! algorithm itself.

pub mod constants;
pub mod env_utils;

pub use constants::ICA_LOG_ENV;
pub use env_utils::{default_worker_count, init_logging};
