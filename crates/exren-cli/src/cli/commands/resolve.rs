//! `exren resolve` – ask which name a download would get.

use anyhow::Result;
use exren_core::cache::ResourceCache;
use exren_core::config::ExrenConfig;
use exren_core::engine::{DeterminationEvent, Engine, HostFilter};
use exren_core::filename::platform_filename;
use exren_core::protocol::{default_socket_path, Request, Response};
use exren_core::rehydrate::SessionFileStore;
use exren_core::retry::RetryPolicy;
use exren_core::store::{CacheStore, SqliteStore};
use std::path::Path;
use std::time::Duration;

use super::Route;
use crate::cli::socket::request_final;

pub async fn run_resolve(
    cfg: &ExrenConfig,
    url: &str,
    referrer: Option<&str>,
    suggested: Option<&str>,
) -> Result<()> {
    let event = DeterminationEvent {
        url: url.to_string(),
        referrer: referrer.map(str::to_string),
        suggested_filename: suggested
            .map(str::to_string)
            .unwrap_or_else(|| platform_filename(url, None)),
    };
    let db = SqliteStore::default_path()?;
    let fallback = Offline {
        db: &db,
        ttl: cfg.ttl(),
        session: SessionFileStore::open_default(),
        hosts: HostFilter::new(&cfg.allowed_hosts),
    };
    let (_, filename) = resolve(&cfg.retry_policy(), &default_socket_path()?, fallback, &event).await?;
    println!("{}", filename);
    Ok(())
}

/// What [`resolve`] answers from when the daemon is unreachable.
pub(crate) struct Offline<'a> {
    pub db: &'a Path,
    pub ttl: Duration,
    pub session: SessionFileStore,
    pub hosts: HostFilter,
}

/// Ask the daemon at `socket` for the name of `event`'s download, or run the
/// same lookup over the stored snapshot and the session file without it.
pub(crate) async fn resolve(
    policy: &RetryPolicy,
    socket: &Path,
    offline: Offline<'_>,
    event: &DeterminationEvent,
) -> Result<(Route, String)> {
    let request = Request::DetermineFilename(event.clone());
    match request_final(policy, socket, &request).await {
        Ok(Response::Suggestion(s)) => Ok((Route::Daemon, s.filename)),
        Ok(other) => anyhow::bail!("unexpected reply from daemon: {:?}", other),
        Err(e) => {
            tracing::warn!("daemon unavailable, resolving from the stored cache: {:#}", e);
            let store = CacheStore::open_or_memory(offline.db).await;
            let cache = ResourceCache::load(store, offline.ttl).await;
            let mut engine = Engine::new(cache, offline.session, offline.hosts);
            Ok((Route::Direct, engine.determine_filename(event).await.filename))
        }
    }
}
