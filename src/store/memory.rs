//! In-memory state store.
//!
//! Keeps encoded snapshots in a process-local map. Nothing survives the
//! process; use it for tests and single-instance deployments.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{decode_snapshot, encode_snapshot, StateStore};
use crate::error::StoreError;
use crate::state::QueueState;

/// Process-local snapshot store.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    // key -> encoded snapshot
    snapshots: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under a key, bypassing encoding.
    pub fn put_raw(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.snapshots
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(key.to_string(), bytes);
        Ok(())
    }

    /// Check if a snapshot exists for a key.
    pub fn contains(&self, key: &str) -> bool {
        self.snapshots
            .read()
            .map(|snapshots| snapshots.contains_key(key))
            .unwrap_or(false)
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, key: &str) -> Result<Option<QueueState>, StoreError> {
        let snapshots = self.snapshots.read().map_err(|_| StoreError::Poisoned)?;
        Ok(snapshots.get(key).and_then(|bytes| decode_snapshot(bytes)))
    }

    fn save(&self, key: &str, state: &QueueState) -> Result<(), StoreError> {
        let bytes = encode_snapshot(state)?;
        self.put_raw(key, bytes)
    }
}
