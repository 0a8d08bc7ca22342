//! SQLite-backed snapshot store (sqlx).
//!
//! One `kv` table; the snapshot is split across the fixed keys
//! [`RESOURCES_KEY`] and [`PAGE_CONTEXTS_KEY`], both rewritten on every save.

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};

use super::DurableStore;
use crate::cache::CacheSnapshot;
use crate::error::StoreError;
use crate::record::now_millis;

pub const RESOURCES_KEY: &str = "resources";
pub const PAGE_CONTEXTS_KEY: &str = "page_contexts";

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Handle to the SQLite cache database, `~/.local/state/exren/cache.db` by default.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Default database path under the XDG state directory.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("exren")?;
        Ok(xdg_dirs.get_state_home().join("exren").join("cache.db"))
    }

    /// Open (or create) the default database and run migrations.
    pub async fn open_default() -> Result<Self> {
        Self::open_at(Self::default_path()?).await
    }

    /// Open (or create) the database at `path`. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&uri)
            .await?;
        let store = SqliteStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database, for tests and throwaway runs.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = SqliteStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl DurableStore for SqliteStore {
    async fn load(&self) -> Result<Option<CacheSnapshot>, StoreError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM kv WHERE key = ?1 OR key = ?2")
                .bind(RESOURCES_KEY)
                .bind(PAGE_CONTEXTS_KEY)
                .fetch_all(&self.pool)
                .await?;
        if rows.is_empty() {
            return Ok(None);
        }

        let mut snapshot = CacheSnapshot::default();
        for (key, value) in rows {
            match key.as_str() {
                RESOURCES_KEY => snapshot.resources = serde_json::from_str(&value)?,
                PAGE_CONTEXTS_KEY => snapshot.page_contexts = serde_json::from_str(&value)?,
                _ => {}
            }
        }
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &CacheSnapshot) -> Result<(), StoreError> {
        let resources = serde_json::to_string(&snapshot.resources)?;
        let page_contexts = serde_json::to_string(&snapshot.page_contexts)?;
        let now = now_millis() as i64;

        let mut tx = self.pool.begin().await?;
        for (key, value) in [(RESOURCES_KEY, resources), (PAGE_CONTEXTS_KEY, page_contexts)] {
            sqlx::query(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
