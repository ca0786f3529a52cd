//! StateStore — redb-backed desired-state persistence for algoplane.
//!
//! Provides typed CRUD operations over clients and algorithm statuses.
//! All values are JSON-serialized into redb's `&[u8]` value columns. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing).
//!
//! Record ids are allocated from the `sequences` table inside the same
//! write transaction as the insert, so ids are unique for the lifetime
//! of the database and never reused after a delete.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe desired-state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(CLIENTS).map_err(map_err!(Table))?;
        txn.open_table(ALGORITHM_STATUSES).map_err(map_err!(Table))?;
        txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Clients ────────────────────────────────────────────────────

    /// Register a client and its paired algorithm status (all flags off)
    /// in one transaction. Returns the stored record with its assigned id.
    pub fn create_client(&self, new: &NewClient) -> StateResult<Client> {
        let now = epoch_secs();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let client_id = next_id(&txn, CLIENT_ID_SEQ)?;
        let status_id = next_id(&txn, STATUS_ID_SEQ)?;

        let client = Client {
            id: client_id,
            name: new.name.clone(),
            version: new.version,
            image: new.image.clone(),
            cpu: new.cpu.clone(),
            memory: new.memory.clone(),
            priority: new.priority,
            need_restart: new.need_restart,
            spawned_at: now,
            created_at: now,
            updated_at: now,
        };
        let status = AlgorithmStatus {
            id: status_id,
            client_id,
            vwap: false,
            twap: false,
            hft: false,
        };

        {
            let value = serde_json::to_vec(&client).map_err(map_err!(Serialize))?;
            let mut table = txn.open_table(CLIENTS).map_err(map_err!(Table))?;
            table
                .insert(client.id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        {
            let value = serde_json::to_vec(&status).map_err(map_err!(Serialize))?;
            let mut table = txn.open_table(ALGORITHM_STATUSES).map_err(map_err!(Table))?;
            table
                .insert(status.id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(client_id, status_id, "client registered");
        Ok(client)
    }

    /// Get a client by id.
    pub fn get_client(&self, id: ClientId) -> StateResult<Option<Client>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CLIENTS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let client: Client =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(client))
            }
            None => Ok(None),
        }
    }

    /// List all clients.
    pub fn list_clients(&self) -> StateResult<Vec<Client>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CLIENTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let client: Client =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(client);
        }
        Ok(results)
    }

    /// Apply a partial update to a client and bump `updated_at`.
    pub fn update_client(&self, id: ClientId, patch: &ClientPatch) -> StateResult<Client> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let updated;
        {
            let mut table = txn.open_table(CLIENTS).map_err(map_err!(Table))?;
            let mut client: Client = match table.get(id).map_err(map_err!(Read))? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                }
                None => return Err(StateError::not_found("client", id)),
            };
            patch.apply(&mut client);
            client.updated_at = epoch_secs();
            let value = serde_json::to_vec(&client).map_err(map_err!(Serialize))?;
            table
                .insert(id, value.as_slice())
                .map_err(map_err!(Write))?;
            updated = client;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(client_id = id, "client updated");
        Ok(updated)
    }

    /// Delete a client by id. Returns true if it existed.
    ///
    /// The paired algorithm status is left in place (no cascade).
    pub fn delete_client(&self, id: ClientId) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(CLIENTS).map_err(map_err!(Table))?;
            existed = table.remove(id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(client_id = id, existed, "client deleted");
        Ok(existed)
    }

    // ── Algorithm statuses ─────────────────────────────────────────

    /// Create an algorithm status record with the given flags.
    pub fn create_algorithm_status(
        &self,
        new: &NewAlgorithmStatus,
    ) -> StateResult<AlgorithmStatus> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let status_id = next_id(&txn, STATUS_ID_SEQ)?;
        let status = AlgorithmStatus {
            id: status_id,
            client_id: new.client_id,
            vwap: new.vwap,
            twap: new.twap,
            hft: new.hft,
        };
        {
            let value = serde_json::to_vec(&status).map_err(map_err!(Serialize))?;
            let mut table = txn.open_table(ALGORITHM_STATUSES).map_err(map_err!(Table))?;
            table
                .insert(status.id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(status_id, client_id = new.client_id, "algorithm status created");
        Ok(status)
    }

    /// Get an algorithm status by its own id.
    pub fn get_algorithm_status(&self, id: u64) -> StateResult<Option<AlgorithmStatus>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ALGORITHM_STATUSES).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let status: AlgorithmStatus =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(status))
            }
            None => Ok(None),
        }
    }

    /// Find the algorithm status for a given client.
    ///
    /// The pairing is one-to-one by convention; if several records exist
    /// for the client, the first in id order wins.
    pub fn algorithm_status_for_client(
        &self,
        client_id: ClientId,
    ) -> StateResult<Option<AlgorithmStatus>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ALGORITHM_STATUSES).map_err(map_err!(Table))?;
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let status: AlgorithmStatus =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if status.client_id == client_id {
                return Ok(Some(status));
            }
        }
        Ok(None)
    }

    /// List all algorithm statuses.
    pub fn list_algorithm_statuses(&self) -> StateResult<Vec<AlgorithmStatus>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ALGORITHM_STATUSES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let status: AlgorithmStatus =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(status);
        }
        Ok(results)
    }

    /// Apply a partial update to an algorithm status by its id.
    pub fn update_algorithm_status(
        &self,
        id: u64,
        patch: &AlgorithmStatusPatch,
    ) -> StateResult<AlgorithmStatus> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let updated;
        {
            let mut table = txn.open_table(ALGORITHM_STATUSES).map_err(map_err!(Table))?;
            let mut status: AlgorithmStatus = match table.get(id).map_err(map_err!(Read))? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                }
                None => return Err(StateError::not_found("algorithm status", id)),
            };
            patch.apply(&mut status);
            let value = serde_json::to_vec(&status).map_err(map_err!(Serialize))?;
            table
                .insert(id, value.as_slice())
                .map_err(map_err!(Write))?;
            updated = status;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(status_id = id, "algorithm status updated");
        Ok(updated)
    }
}

/// Allocate the next id from a sequence, within the caller's transaction.
fn next_id(txn: &WriteTransaction, seq: &str) -> StateResult<u64> {
    let mut table = txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
    let next = table
        .get(seq)
        .map_err(map_err!(Read))?
        .map(|guard| guard.value())
        .unwrap_or(0)
        + 1;
    table.insert(seq, next).map_err(map_err!(Write))?;
    Ok(next)
}

fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
