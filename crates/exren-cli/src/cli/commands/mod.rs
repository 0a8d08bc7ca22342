//! CLI command handlers, one file per command.

mod cache;
pub(crate) mod get;
pub(crate) mod get_all;
pub(crate) mod ingest;
pub(crate) mod resolve;
pub(crate) mod serve;

pub use cache::run_cache;
pub use get::run_get;
pub use get_all::run_get_all;
pub use ingest::run_ingest;
pub use resolve::run_resolve;
pub use serve::run_serve;

use anyhow::{Context, Result};
use exren_core::config::ExrenConfig;
use std::path::{Path, PathBuf};

/// Who carried out a client command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    Daemon,
    /// The daemon was unreachable after the retry budget; the command ran locally.
    Direct,
}

/// Download directory: explicit argument, then config, then the current directory.
pub(crate) fn download_dir(cfg: &ExrenConfig, arg: Option<PathBuf>) -> Result<PathBuf> {
    match arg.or_else(|| cfg.download_dir.clone()) {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("current directory"),
    }
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parse {}", path.display()))
}
