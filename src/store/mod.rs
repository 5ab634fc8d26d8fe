//! Queue state persistence.
//!
//! A store holds one JSON snapshot of [`QueueState`] per deployment key. Every
//! save overwrites the whole snapshot; there is no merge and no version check,
//! so the last writer wins.
//!
//! Snapshots are validated on the way in. A snapshot that does not decode, or
//! decodes into a state that breaks the queue invariants, is logged and
//! reported as absent rather than as an error.

pub mod kv;
pub mod memory;

pub use kv::KvStateStore;
pub use memory::MemoryStateStore;

use tracing::warn;

use crate::error::StoreError;
use crate::state::QueueState;

/// Trait for queue state storage backends.
pub trait StateStore: Send + Sync {
    /// Load the snapshot for a deployment key.
    ///
    /// `Ok(None)` covers both "never saved" and "saved but invalid".
    fn load(&self, key: &str) -> Result<Option<QueueState>, StoreError>;

    /// Overwrite the snapshot for a deployment key.
    fn save(&self, key: &str, state: &QueueState) -> Result<(), StoreError>;
}

/// Storage key for a deployment.
pub fn storage_key(app_id: &str) -> String {
    format!("queue_state#{}", app_id)
}

/// Serialize a snapshot.
pub fn encode_snapshot(state: &QueueState) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec(state)?)
}

/// Deserialize and validate a snapshot.
pub fn decode_snapshot(bytes: &[u8]) -> Option<QueueState> {
    let state: QueueState = match serde_json::from_slice(bytes) {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "Discarding malformed queue snapshot");
            return None;
        }
    };

    if let Err(reason) = state.validate() {
        warn!(%reason, "Discarding invalid queue snapshot");
        return None;
    }

    Some(state)
}
