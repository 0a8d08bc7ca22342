//! Durable backing for the resource cache.
//!
//! A store only ever sees whole snapshots: it is read once at start and
//! overwritten after every mutation.

mod fallback;
mod memory;
mod sqlite;

pub use fallback::CacheStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::future::Future;

use crate::cache::CacheSnapshot;
use crate::error::StoreError;

/// Key-value persistence for full cache snapshots.
pub trait DurableStore {
    /// Read the last saved snapshot, or `None` if nothing was saved yet.
    fn load(&self) -> impl Future<Output = Result<Option<CacheSnapshot>, StoreError>> + Send;

    /// Replace the saved snapshot.
    fn save(&self, snapshot: &CacheSnapshot) -> impl Future<Output = Result<(), StoreError>> + Send;
}
