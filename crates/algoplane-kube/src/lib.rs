//! algoplane-kube — workload lifecycle against a Kubernetes cluster.
//!
//! The reconciler talks to the orchestrator through the
//! [`WorkloadController`] trait: create, delete, and list named
//! workloads. Both mutating operations are idempotent by name — creating
//! a workload that already exists and deleting one that does not are
//! successes, so the reconciler can re-issue the full desired set every
//! tick without tracking what it did last time.
//!
//! [`KubectlController`] is the production implementation, shelling out
//! to `kubectl`. Tests and other environments can substitute their own
//! implementation.

pub mod error;
pub mod kubectl;

pub use error::{WorkloadError, WorkloadResult};
pub use kubectl::KubectlController;

use async_trait::async_trait;

/// Idempotent workload lifecycle operations.
#[async_trait]
pub trait WorkloadController: Send + Sync {
    /// Ensure a workload named `name` exists, running `image`.
    ///
    /// Succeeds if a workload with that name already exists; an existing
    /// workload with a different image is left alone (presence, not
    /// content, is reconciled).
    async fn create_workload(&self, name: &str, image: &str) -> WorkloadResult<()>;

    /// Ensure no workload named `name` exists. Succeeds if it already
    /// doesn't.
    async fn delete_workload(&self, name: &str) -> WorkloadResult<()>;

    /// Names of all workloads currently known to the orchestrator.
    ///
    /// Inspection only — the reconciler derives desired names from
    /// client ids and never diffs against this list.
    async fn list_workloads(&self) -> WorkloadResult<Vec<String>>;
}

#[async_trait]
impl<T: WorkloadController + ?Sized> WorkloadController for std::sync::Arc<T> {
    async fn create_workload(&self, name: &str, image: &str) -> WorkloadResult<()> {
        (**self).create_workload(name, image).await
    }

    async fn delete_workload(&self, name: &str) -> WorkloadResult<()> {
        (**self).delete_workload(name).await
    }

    async fn list_workloads(&self) -> WorkloadResult<Vec<String>> {
        (**self).list_workloads().await
    }
}
