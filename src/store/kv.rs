//! Durable key-value state store backed by sled.
//!
//! One item per deployment key, stored under [`storage_key`]. Each save
//! replaces the item and flushes before returning.

use std::path::Path;

use sled::{Db, Tree};
use tracing::debug;

use super::{decode_snapshot, encode_snapshot, storage_key, StateStore};
use crate::error::StoreError;
use crate::state::QueueState;

const TREE_NAME: &str = "queue_state";

/// sled-backed snapshot store.
pub struct KvStateStore {
    db: Db,
    tree: Tree,
}

impl KvStateStore {
    /// Open (or create) a store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path.as_ref())?;
        let tree = db.open_tree(TREE_NAME)?;
        debug!(path = %path.as_ref().display(), "Opened queue state store");
        Ok(Self { db, tree })
    }
}

impl StateStore for KvStateStore {
    fn load(&self, key: &str) -> Result<Option<QueueState>, StoreError> {
        Ok(self
            .tree
            .get(storage_key(key))?
            .and_then(|bytes| decode_snapshot(&bytes)))
    }

    fn save(&self, key: &str, state: &QueueState) -> Result<(), StoreError> {
        let value = encode_snapshot(state)?;
        self.tree.insert(storage_key(key), value)?;
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kv_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.db");

        let mut state = QueueState::new();
        state.join("a@x.com").unwrap();
        state.set_venue_mode(true);
        state.set_venue_capacity(3).unwrap();

        {
            let store = KvStateStore::open(&path).unwrap();
            assert_eq!(store.load("deli").unwrap(), None);
            store.save("deli", &state).unwrap();
        }

        let store = KvStateStore::open(&path).unwrap();
        assert_eq!(store.load("deli").unwrap(), Some(state));
        assert_eq!(store.load("other").unwrap(), None);
    }

    #[test]
    fn test_kv_store_rejects_corrupt_item() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStateStore::open(dir.path().join("queue.db")).unwrap();

        store
            .tree
            .insert(storage_key("deli"), b"{\"is_open\": true}".to_vec())
            .unwrap();
        assert_eq!(store.load("deli").unwrap(), None);
    }
}
