//! Error types for the storage seams.
//!
//! Everything above the stores works with `anyhow`; the stores keep a typed
//! error so callers can log what kind of failure turned into a cache miss.

/// Failure reading or writing a durable cache snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite reported an error (locked, corrupt, missing file, ...).
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    /// Snapshot JSON could not be encoded or decoded.
    #[error("snapshot encoding: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Filesystem access failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The store refused the operation (used by in-memory stores in tests).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
