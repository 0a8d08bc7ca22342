//! Store used by long-running processes: SQLite when it opens, memory otherwise.

use std::path::Path;

use super::{DurableStore, MemoryStore, SqliteStore};
use crate::cache::CacheSnapshot;
use crate::error::StoreError;

#[derive(Clone)]
pub enum CacheStore {
    Sqlite(SqliteStore),
    /// The database could not be opened; state lives only as long as the process.
    Memory(MemoryStore),
}

impl CacheStore {
    /// Open the database at `path`, or fall back to memory with a warning.
    pub async fn open_or_memory(path: &Path) -> Self {
        match SqliteStore::open_at(path).await {
            Ok(store) => CacheStore::Sqlite(store),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "cache database unavailable, keeping metadata in memory: {:#}",
                    e
                );
                CacheStore::Memory(MemoryStore::new())
            }
        }
    }

    pub fn is_durable(&self) -> bool {
        matches!(self, CacheStore::Sqlite(_))
    }
}

impl DurableStore for CacheStore {
    async fn load(&self) -> Result<Option<CacheSnapshot>, StoreError> {
        match self {
            CacheStore::Sqlite(s) => s.load().await,
            CacheStore::Memory(m) => m.load().await,
        }
    }

    async fn save(&self, snapshot: &CacheSnapshot) -> Result<(), StoreError> {
        match self {
            CacheStore::Sqlite(s) => s.save(snapshot).await,
            CacheStore::Memory(m) => m.save(snapshot).await,
        }
    }
}
