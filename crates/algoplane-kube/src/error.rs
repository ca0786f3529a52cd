//! Error types for the workload controller.

use thiserror::Error;

/// Result type alias for workload operations.
pub type WorkloadResult<T> = Result<T, WorkloadError>;

/// Errors surfaced by orchestrator calls.
///
/// The idempotent-success cases ("already exists" on create, "not found"
/// on delete) are classified away before an error is built and never
/// appear here.
#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("failed to run kubectl: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("kubectl {action} failed: {stderr}")]
    CommandFailed {
        action: &'static str,
        stderr: String,
    },

    #[error("failed to parse pod list: {0}")]
    Parse(#[from] serde_json::Error),
}
