//! Error types for the reconciliation loop.

use algoplane_state::StateError;
use thiserror::Error;

/// Errors that abort a reconciliation tick.
///
/// Per-client and per-workload failures are isolated inside the tick and
/// logged rather than surfaced here; only losing the store entirely
/// aborts a tick, and only that tick.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("desired-state store unavailable: {0}")]
    StoreUnavailable(#[source] StateError),
}
