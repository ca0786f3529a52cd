//! Reconciler — fixed-interval convergence of workloads to desired state.

use std::time::Duration;

use algoplane_kube::WorkloadController;
use algoplane_state::{AlgorithmKind, AlgorithmStatus, Client};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::SyncError;
use crate::DesiredState;

/// Outcome counters for one reconciliation tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Clients returned by the store listing.
    pub clients: u32,
    /// Clients skipped because their status could not be fetched.
    pub skipped: u32,
    /// Workload operations that succeeded (including idempotent no-ops).
    pub applied: u32,
    /// Workload operations that failed and were logged.
    pub failed: u32,
}

/// Polls the desired-state store and converges orchestrator workloads.
pub struct Reconciler<S, W> {
    state: S,
    workloads: W,
    interval: Duration,
}

impl<S: DesiredState, W: WorkloadController> Reconciler<S, W> {
    pub fn new(state: S, workloads: W, interval: Duration) -> Self {
        Self {
            state,
            workloads,
            interval,
        }
    }

    /// Run the reconciliation loop until `shutdown` fires.
    ///
    /// The tick body runs inline in this task, so the next sleep only
    /// starts after the current tick finishes and ticks can never
    /// overlap, however slow the orchestrator is.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "reconciler started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    match self.run_once().await {
                        Ok(stats) => debug!(
                            clients = stats.clients,
                            skipped = stats.skipped,
                            applied = stats.applied,
                            failed = stats.failed,
                            "tick complete"
                        ),
                        Err(e) => error!(error = %e, "tick skipped"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("reconciler shutting down");
                    break;
                }
            }
        }
    }

    /// One reconciliation pass over every client.
    ///
    /// Fails only if the client listing itself fails; everything below
    /// that is isolated per client and per workload.
    pub async fn run_once(&self) -> Result<TickStats, SyncError> {
        let clients = self
            .state
            .list_clients()
            .map_err(SyncError::StoreUnavailable)?;

        let mut stats = TickStats {
            clients: clients.len() as u32,
            ..TickStats::default()
        };

        for client in &clients {
            let status = match self.state.algorithm_status_for_client(client.id) {
                Ok(Some(status)) => status,
                Ok(None) => {
                    warn!(client_id = client.id, "client has no algorithm status");
                    stats.skipped += 1;
                    continue;
                }
                Err(e) => {
                    error!(
                        client_id = client.id,
                        error = %e,
                        "failed to fetch algorithm status"
                    );
                    stats.skipped += 1;
                    continue;
                }
            };
            self.converge_client(client, &status, &mut stats).await;
        }

        Ok(stats)
    }

    /// Converge the three workloads of one client.
    ///
    /// A failed orchestrator call is logged and the remaining kinds are
    /// still processed.
    async fn converge_client(
        &self,
        client: &Client,
        status: &AlgorithmStatus,
        stats: &mut TickStats,
    ) {
        for kind in AlgorithmKind::ALL {
            let name = kind.workload_name(client.id);
            let result = if status.enabled(kind) {
                self.workloads.create_workload(&name, &client.image).await
            } else {
                self.workloads.delete_workload(&name).await
            };

            match result {
                Ok(()) => {
                    debug!(
                        client_id = client.id,
                        kind = kind.as_str(),
                        workload = %name,
                        desired = status.enabled(kind),
                        "workload converged"
                    );
                    stats.applied += 1;
                }
                Err(e) => {
                    error!(
                        client_id = client.id,
                        kind = kind.as_str(),
                        workload = %name,
                        error = %e,
                        "workload operation failed"
                    );
                    stats.failed += 1;
                }
            }
        }
    }
}
