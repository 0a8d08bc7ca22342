//! `exren serve` – run the daemon.

use anyhow::{Context, Result};
use exren_core::cache::ResourceCache;
use exren_core::config::ExrenConfig;
use exren_core::engine::{Engine, HostFilter};
use exren_core::protocol::default_socket_path;
use exren_core::rehydrate::SessionFileStore;
use exren_core::service::Service;
use exren_core::store::{CacheStore, SqliteStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::download_dir;
use crate::cli::socket::spawn_listener;

pub async fn run_serve(cfg: &ExrenConfig, download_dir_arg: Option<PathBuf>) -> Result<()> {
    let download_dir = download_dir(cfg, download_dir_arg)?;
    let service = Arc::new(
        build_service(
            cfg,
            &SqliteStore::default_path()?,
            SessionFileStore::open_default(),
            &download_dir,
        )
        .await,
    );

    let socket_path = default_socket_path()?;
    let listener = spawn_listener(Arc::clone(&service), &socket_path)?;
    tracing::info!(
        socket = %socket_path.display(),
        download_dir = %download_dir.display(),
        "daemon started"
    );
    println!(
        "Listening on {}; saving downloads to {}",
        socket_path.display(),
        download_dir.display()
    );

    // The first tick fires immediately, clearing entries left over from the last run.
    let mut sweep = tokio::time::interval(cfg.sweep_interval());
    loop {
        tokio::select! {
            _ = sweep.tick() => {
                let removed = service.sweep().await;
                if removed > 0 {
                    tracing::info!(removed, "sweep removed expired metadata");
                }
            }
            res = tokio::signal::ctrl_c() => {
                res.context("wait for ctrl-c")?;
                break;
            }
        }
    }

    listener.abort();
    let _ = std::fs::remove_file(&socket_path);
    tracing::info!("daemon stopped");
    Ok(())
}

/// The daemon's service over the database at `db`. An unusable database
/// leaves the daemon running on an in-memory cache.
pub(crate) async fn build_service(
    cfg: &ExrenConfig,
    db: &Path,
    session: SessionFileStore,
    download_dir: &Path,
) -> Service<CacheStore, SessionFileStore> {
    let store = CacheStore::open_or_memory(db).await;
    let cache = ResourceCache::load(store, cfg.ttl()).await;
    let engine = Engine::new(cache, session, HostFilter::new(&cfg.allowed_hosts));
    Service::new(engine, download_dir)
}
