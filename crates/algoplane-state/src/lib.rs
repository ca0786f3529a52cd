//! algoplane-state — embedded desired-state store for algoplane.
//!
//! Backed by [redb](https://docs.rs/redb), holds the tenant (`Client`)
//! records and their per-client `AlgorithmStatus` flags that the
//! reconciler converges against.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns
//! under `u64` primary keys. Record ids are allocated from a `sequences`
//! table, so a deleted client's id is never reused.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and is the sole synchronization point between the HTTP handlers and the
//! reconciliation loop.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
