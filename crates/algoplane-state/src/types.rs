//! Domain types for the algoplane state store.
//!
//! These types represent the desired state of tenant workloads: `Client`
//! records and their per-client `AlgorithmStatus` flags. All types are
//! serializable to/from JSON for storage in redb tables.

use serde::{Deserialize, Serialize};

/// Unique identifier for a client (tenant).
pub type ClientId = u64;

// ── Client ─────────────────────────────────────────────────────────

/// A tenant's compute workload template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub version: i64,
    /// Container image run for each of this client's workloads.
    pub image: String,
    /// Resource request strings (e.g. "500m", "256Mi").
    pub cpu: String,
    pub memory: String,
    /// Advisory only; reconciliation is unordered across clients.
    pub priority: f64,
    /// Advisory restart flag; not consumed by the reconciler.
    pub need_restart: bool,
    /// Unix timestamp (seconds) when the client workload was first spawned.
    pub spawned_at: u64,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Fields supplied by the caller when registering a client.
///
/// The store assigns `id` and stamps the timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub version: i64,
    pub image: String,
    pub cpu: String,
    pub memory: String,
    #[serde(default)]
    pub priority: f64,
    #[serde(default)]
    pub need_restart: bool,
}

/// Partial update for a `Client`.
///
/// Unknown fields and wrongly-typed values are rejected at
/// deserialization time, so no runtime column validation is needed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub version: Option<i64>,
    pub image: Option<String>,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub priority: Option<f64>,
    pub need_restart: Option<bool>,
}

impl ClientPatch {
    /// Apply the set fields to `client`. Timestamps are the store's job.
    pub fn apply(&self, client: &mut Client) {
        if let Some(name) = &self.name {
            client.name = name.clone();
        }
        if let Some(version) = self.version {
            client.version = version;
        }
        if let Some(image) = &self.image {
            client.image = image.clone();
        }
        if let Some(cpu) = &self.cpu {
            client.cpu = cpu.clone();
        }
        if let Some(memory) = &self.memory {
            client.memory = memory.clone();
        }
        if let Some(priority) = self.priority {
            client.priority = priority;
        }
        if let Some(need_restart) = self.need_restart {
            client.need_restart = need_restart;
        }
    }
}

// ── Algorithm status ───────────────────────────────────────────────

/// Desired activation state of the three algorithm kinds for one client.
///
/// One-to-one with `Client`, enforced by the caller rather than by a
/// store constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlgorithmStatus {
    pub id: u64,
    pub client_id: ClientId,
    pub vwap: bool,
    pub twap: bool,
    pub hft: bool,
}

impl AlgorithmStatus {
    /// Whether the workload for `kind` should be running.
    pub fn enabled(&self, kind: AlgorithmKind) -> bool {
        match kind {
            AlgorithmKind::Vwap => self.vwap,
            AlgorithmKind::Twap => self.twap,
            AlgorithmKind::Hft => self.hft,
        }
    }
}

/// Request body for creating an algorithm status record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAlgorithmStatus {
    pub client_id: ClientId,
    #[serde(default)]
    pub vwap: bool,
    #[serde(default)]
    pub twap: bool,
    #[serde(default)]
    pub hft: bool,
}

/// Partial update for an `AlgorithmStatus`.
///
/// Only the three boolean flags are patchable; anything else in the
/// body is a deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlgorithmStatusPatch {
    pub vwap: Option<bool>,
    pub twap: Option<bool>,
    pub hft: Option<bool>,
}

impl AlgorithmStatusPatch {
    pub fn apply(&self, status: &mut AlgorithmStatus) {
        if let Some(vwap) = self.vwap {
            status.vwap = vwap;
        }
        if let Some(twap) = self.twap {
            status.twap = twap;
        }
        if let Some(hft) = self.hft {
            status.hft = hft;
        }
    }
}

// ── Algorithm kind ─────────────────────────────────────────────────

/// The three algorithm kinds a client can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    Vwap,
    Twap,
    Hft,
}

impl AlgorithmKind {
    /// Every kind, in the order the reconciler processes them.
    pub const ALL: [AlgorithmKind; 3] =
        [AlgorithmKind::Vwap, AlgorithmKind::Twap, AlgorithmKind::Hft];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmKind::Vwap => "vwap",
            AlgorithmKind::Twap => "twap",
            AlgorithmKind::Hft => "hft",
        }
    }

    /// Deterministic workload name for this kind and client.
    ///
    /// This name is the sole correlation between desired state and the
    /// orchestrator; it must be stable across ticks and restarts.
    pub fn workload_name(&self, client_id: ClientId) -> String {
        format!("{}-{}", self.as_str(), client_id)
    }
}
