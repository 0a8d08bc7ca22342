//! Rehydration entries in a JSON file under `$XDG_RUNTIME_DIR`.
//!
//! The runtime directory lives as long as the login session, which is the
//! scope the entries are meant for. The daemon and the CLI share the file;
//! writers replace it through a temporary file and a rename.
//!
//! A write is read-modify-replace without a lock: two processes staging
//! entries at the same moment can each drop the other's entry. Readers never
//! see a torn file, and a lost entry only means that download keeps its
//! original name.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::RehydrationStore;
use crate::record::ResourceInfo;

type Entries = HashMap<String, ResourceInfo>;

#[derive(Debug, Clone)]
pub struct SessionFileStore {
    path: Option<PathBuf>,
}

impl SessionFileStore {
    /// Store at `$XDG_RUNTIME_DIR/exren/session.json`, or a disabled store when
    /// there is no runtime directory.
    pub fn open_default() -> Self {
        let path = xdg::BaseDirectories::with_prefix("exren")
            .ok()
            .and_then(|dirs| dirs.get_runtime_directory().ok().map(|d| d.join("exren")))
            .map(|dir| dir.join("session.json"));
        if path.is_none() {
            tracing::warn!("no XDG runtime directory; rehydration disabled");
        }
        Self { path }
    }

    /// Store backed by an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Store that never remembers anything.
    pub fn disabled() -> Self {
        Self { path: None }
    }
}

async fn read_entries(path: &Path) -> Result<Entries> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
        Err(e) => return Err(e).with_context(|| format!("read session store: {}", path.display())),
    };
    serde_json::from_slice(&bytes).with_context(|| format!("parse session store: {}", path.display()))
}

async fn write_entries(path: &Path, entries: &Entries) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create dir: {}", parent.display()))?;
    }
    let json = serde_json::to_vec(entries).context("serialize session store")?;
    let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
    tokio::fs::write(&tmp, json)
        .await
        .with_context(|| format!("write session store: {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("replace session store: {}", path.display()))?;
    Ok(())
}

impl RehydrationStore for SessionFileStore {
    async fn write(&self, url: &str, info: &ResourceInfo) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        let mut entries = match read_entries(path).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("{:#}; starting a fresh session store", e);
                Entries::new()
            }
        };
        entries.insert(url.to_string(), info.clone());
        if let Err(e) = write_entries(path, &entries).await {
            tracing::warn!("staging rehydration entry failed: {:#}", e);
        }
    }

    async fn read(&self, url: &str) -> Option<ResourceInfo> {
        let path = self.path.as_deref()?;
        match read_entries(path).await {
            Ok(mut entries) => entries.remove(url),
            Err(e) => {
                tracing::warn!("rehydration lookup failed: {:#}", e);
                None
            }
        }
    }
}
