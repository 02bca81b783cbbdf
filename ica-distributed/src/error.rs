//! Error taxonomy for the distributed driver (§7 "Communication error").

use ica_core::{ConfigError, SnapshotError};
use thiserror::Error;

/// Failure of the distributed collective. Fatal to the whole run: a
/// misbehaving peer's output can never be trusted, so the caller gets an
/// error rather than a partial result.
#[derive(Debug, Error)]
pub enum DistributedError {
    #[error("peer engine configuration rejected: {0}")]
    Config(#[from] ConfigError),

    #[error("peer {0} panicked during its run")]
    PeerPanicked(usize),

    #[error("peer {0}'s ring channel disconnected before the collective completed")]
    ChannelDisconnected(usize),

    #[error("a gathered snapshot history failed to round-trip: {0}")]
    SnapshotRoundTrip(#[from] SnapshotError),
}
