use thiserror::Error;

use crate::model::GroupKey;

/// Failures surfaced by the external collaborators. Fetch failures are
/// terminal for the current render pass; the engine never retries.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("fetch failed: {message}")]
    Fetch { message: String },

    #[error("store version conflict: expected {expected}, store is at {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("unknown port: {0}")]
    UnknownPort(String),

    #[error("unknown group: {0}")]
    UnknownGroup(GroupKey),

    #[error("custom group {0} is not region-scoped and cannot be persisted")]
    NotRegionScoped(GroupKey),
}

/// Problems in a snapshot document itself, caught at ingestion.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid port code {code:?} for port {port_id}")]
    InvalidPortCode { port_id: String, code: String },

    #[error("shipment {shipment_id} references unknown port {port_id}")]
    DanglingPort {
        shipment_id: String,
        port_id: String,
    },
}
