//! `exren ingest` – send scraped page metadata.

use anyhow::Result;
use exren_core::cache::ResourceCache;
use exren_core::config::ExrenConfig;
use exren_core::engine::{Engine, HostFilter};
use exren_core::protocol::{default_socket_path, PageMetadataObserved, Request, Response};
use exren_core::rehydrate::SessionFileStore;
use exren_core::retry::RetryPolicy;
use exren_core::store::SqliteStore;
use std::path::Path;
use std::time::Duration;

use super::{read_json, Route};
use crate::cli::socket::request_final;

pub async fn run_ingest(cfg: &ExrenConfig, file: &Path, page_url: Option<&str>) -> Result<()> {
    let mut page: PageMetadataObserved = read_json(file)?;
    if let Some(url) = page_url {
        page.page_url = Some(url.to_string());
    }

    let (route, stored) = ingest(
        &cfg.retry_policy(),
        &default_socket_path()?,
        &SqliteStore::default_path()?,
        cfg.ttl(),
        page,
    )
    .await?;
    match route {
        Route::Daemon => println!("Stored metadata for {} documents.", stored),
        Route::Direct => println!(
            "Daemon not running; stored metadata for {} documents in the cache.",
            stored
        ),
    }
    Ok(())
}

/// Send `page` to the daemon at `socket`, or write it into the database at
/// `db` when the daemon cannot be reached. Returns the number of documents stored.
pub(crate) async fn ingest(
    policy: &RetryPolicy,
    socket: &Path,
    db: &Path,
    ttl: Duration,
    page: PageMetadataObserved,
) -> Result<(Route, usize)> {
    let request = Request::PageMetadata(page.clone());
    let err = match request_final(policy, socket, &request).await {
        Ok(Response::Ack { stored }) => return Ok((Route::Daemon, stored)),
        Ok(other) => anyhow::bail!("unexpected reply from daemon: {:?}", other),
        Err(e) => e,
    };
    tracing::warn!("daemon unavailable, writing the cache directly: {:#}", err);

    let store = SqliteStore::open_at(db).await?;
    let cache = ResourceCache::load(store, ttl).await;
    let mut engine = Engine::new(cache, SessionFileStore::disabled(), HostFilter::any());
    let stored = engine
        .on_page_metadata(page.page_url.as_deref(), page.course_code.as_deref(), &page.resources)
        .await;
    Ok((Route::Direct, stored))
}
