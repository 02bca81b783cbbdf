//! Configuration error taxonomy for the ICA engine.
//!
//! Every variant corresponds to one admissibility constraint from the
//! engine's external interface and carries the offending value.

/// A hyperparameter outside its admissible range. Fatal at engine construction.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("population size must be >= 2, got {0}")]
    PopSizeTooSmall(usize),

    #[error("dimension must be >= 1, got {0}")]
    DimensionZero(usize),

    #[error("max_iter must be >= 1, got {0}")]
    MaxIterZero(usize),

    #[error("assimilation coefficient beta must be > 0, got {0}")]
    BetaNonPositive(f64),

    #[error("revolution amplitude gamma must be > 0, got {0}")]
    GammaNonPositive(f64),

    #[error("vassal-weight eta must lie in [0, 1], got {0}")]
    EtaOutOfRange(f64),

    #[error("lower bound {0} must be strictly less than upper bound {1}")]
    BoundsInverted(f64, f64),
}
