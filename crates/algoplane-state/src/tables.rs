//! redb table definitions for the algoplane state store.
//!
//! Record tables use `u64` primary keys and `&[u8]` values
//! (JSON-serialized domain types). The `sequences` table holds the
//! next-id counters keyed by sequence name.

use redb::TableDefinition;

/// Client records keyed by client id.
pub const CLIENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("clients");

/// Algorithm status records keyed by status id.
pub const ALGORITHM_STATUSES: TableDefinition<u64, &[u8]> =
    TableDefinition::new("algorithm_statuses");

/// Monotonic id counters keyed by sequence name.
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Sequence name for client ids.
pub const CLIENT_ID_SEQ: &str = "client_id";

/// Sequence name for algorithm status ids.
pub const STATUS_ID_SEQ: &str = "status_id";
