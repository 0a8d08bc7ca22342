use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::DurableStore;
use crate::cache::CacheSnapshot;
use crate::error::StoreError;

/// In-process store. Clones share state, so a test can keep a handle while
/// the cache owns another and inspect what was persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Option<CacheSnapshot>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `snapshot`, as if a previous process saved it.
    pub fn with_snapshot(snapshot: CacheSnapshot) -> Self {
        let store = Self::default();
        *store.saved.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot);
        store
    }

    /// Make every subsequent load/save fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// The last snapshot that was saved.
    pub fn saved(&self) -> Option<CacheSnapshot> {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store set to fail".into()));
        }
        Ok(())
    }
}

impl DurableStore for MemoryStore {
    async fn load(&self) -> Result<Option<CacheSnapshot>, StoreError> {
        self.check()?;
        Ok(self.saved())
    }

    async fn save(&self, snapshot: &CacheSnapshot) -> Result<(), StoreError> {
        self.check()?;
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        Ok(())
    }
}
