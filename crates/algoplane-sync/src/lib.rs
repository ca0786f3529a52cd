//! algoplane-sync — the reconciliation loop.
//!
//! On a fixed interval, the [`Reconciler`] reads every client and its
//! algorithm flags from the desired-state store and drives the workload
//! orchestrator toward that state: a set flag means the corresponding
//! workload must exist, a cleared flag means it must not. Convergence is
//! by presence only, correlated through the deterministic
//! `{kind}-{client_id}` workload name.
//!
//! Failure handling is layered: a store listing failure skips the whole
//! tick (the next tick is the retry), a status lookup failure skips that
//! one client, and an orchestrator call failure skips that one workload.
//! Nothing inside a tick can terminate the loop.

pub mod error;
pub mod reconciler;

pub use error::SyncError;
pub use reconciler::{Reconciler, TickStats};

use algoplane_state::{AlgorithmStatus, Client, ClientId, StateError, StateStore};

/// The slice of the store contract the reconciler consumes.
///
/// Implemented by [`StateStore`]; tests substitute fixed or failing
/// stores to exercise the failure-isolation paths.
pub trait DesiredState: Send + Sync {
    fn list_clients(&self) -> Result<Vec<Client>, StateError>;

    fn algorithm_status_for_client(
        &self,
        client_id: ClientId,
    ) -> Result<Option<AlgorithmStatus>, StateError>;
}

impl DesiredState for StateStore {
    fn list_clients(&self) -> Result<Vec<Client>, StateError> {
        StateStore::list_clients(self)
    }

    fn algorithm_status_for_client(
        &self,
        client_id: ClientId,
    ) -> Result<Option<AlgorithmStatus>, StateError> {
        StateStore::algorithm_status_for_client(self, client_id)
    }
}
