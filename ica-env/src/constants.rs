//! Shared constants for the ICA optimizer workspace.

/// Environment variable controlling the log level, honored by [`crate::env_utils::init_logging`].
pub const ICA_LOG_ENV: &str = "ICA_LOG";
