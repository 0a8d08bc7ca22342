//! Last-resort metadata recovery for URLs the cache no longer knows.
//!
//! The click side stages an entry right before it asks for a download; the
//! engine reads it only when every cache lookup missed. Both directions are
//! best effort: no error ever reaches the caller.

mod memory;
mod session;

pub use memory::MemoryRehydration;
pub use session::SessionFileStore;

use std::future::Future;

use crate::record::ResourceInfo;

/// Session-scoped URL to metadata store.
pub trait RehydrationStore {
    /// Stage `info` for `url`. Failures are logged and dropped.
    fn write(&self, url: &str, info: &ResourceInfo) -> impl Future<Output = ()> + Send;

    /// Look up `url`. Any failure reads as `None`.
    fn read(&self, url: &str) -> impl Future<Output = Option<ResourceInfo>> + Send;
}
