//! In-memory chain store.
//!
//! Clones share the same backing slot, so a test can keep a handle while the
//! ledger owns another and inspect what was persisted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::ChainStore;
use crate::blockchain::Block;
use crate::error::StorageError;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blocks: Arc<Mutex<Option<Vec<Block>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Creates an empty store (nothing persisted yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `blocks`.
    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        let store = Self::default();
        *store.slot() = Some(blocks);
        store
    }

    /// Snapshot of the persisted chain.
    pub fn snapshot(&self) -> Option<Vec<Block>> {
        self.slot().clone()
    }

    /// Make subsequent saves fail until switched off again.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Vec<Block>>> {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChainStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<Block>>, StorageError> {
        Ok(self.snapshot())
    }

    fn save(&self, blocks: &[Block]) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StorageError::Rejected("memory store is read-only".into()));
        }
        *self.slot() = Some(blocks.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_persisted_blocks() {
        let store = MemoryStore::new();
        let handle = store.clone();
        assert!(handle.load().unwrap().is_none());

        let genesis = Block::genesis(1.0).unwrap();
        store.save(std::slice::from_ref(&genesis)).unwrap();
        assert_eq!(handle.snapshot(), Some(vec![genesis]));
    }

    #[test]
    fn failing_writes_leave_previous_state() {
        let genesis = Block::genesis(1.0).unwrap();
        let store = MemoryStore::with_blocks(vec![genesis.clone()]);
        store.set_fail_writes(true);
        assert!(matches!(store.save(&[]), Err(StorageError::Rejected(_))));
        assert_eq!(store.snapshot(), Some(vec![genesis]));
    }
}
