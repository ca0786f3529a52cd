//! Error types for the algoplane state store.

use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },
}

impl StateError {
    pub fn not_found(kind: &'static str, id: u64) -> Self {
        StateError::NotFound { kind, id }
    }

    /// Whether this error is a missing-record error rather than a
    /// store/connection failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StateError::NotFound { .. })
    }
}
