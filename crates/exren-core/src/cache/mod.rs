//! TTL-bounded cache of download metadata keyed by URL.
//!
//! Two maps share one lifecycle: document URL to [`ResourceRecord`] and page
//! URL to [`PageContextRecord`]. Both are loaded from a [`DurableStore`] when
//! the cache is created and written back in full after every `put` and
//! every sweep, so a restarted daemon picks up where the last one stopped.
//!
//! [`ResourceRecord`]: crate::record::ResourceRecord
//! [`PageContextRecord`]: crate::record::PageContextRecord
//! [`DurableStore`]: crate::store::DurableStore

mod snapshot;
mod state;

pub use snapshot::CacheSnapshot;
pub use state::ResourceCache;

#[cfg(test)]
mod tests;
