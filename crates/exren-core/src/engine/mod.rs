//! Resolution engine and event ingestion.
//!
//! [`Engine`] owns the resource cache and the rehydration store. Ingestion
//! writes metadata into the cache; [`Engine::determine_filename`] answers a
//! download-determination event by walking the lookup chain:
//!
//! 1. exact match on the download URL
//! 2. exact match on the referrer
//! 3. first cached key that prefixes the referrer
//! 4. rehydration store, promoting a hit into the cache
//! 5. the platform's suggested filename, unchanged

mod hosts;
mod ingest;
mod resolve;

pub use hosts::HostFilter;
pub use ingest::DownloadAction;
pub use resolve::{ConflictAction, DeterminationEvent, FilenameSuggestion, MatchSource};

use crate::cache::ResourceCache;
use crate::record::{now_millis, ResourceInfo};
use crate::rehydrate::RehydrationStore;
use crate::store::DurableStore;

pub struct Engine<D, R> {
    cache: ResourceCache<D>,
    rehydration: R,
    hosts: HostFilter,
}

impl<D: DurableStore, R: RehydrationStore> Engine<D, R> {
    pub fn new(cache: ResourceCache<D>, rehydration: R, hosts: HostFilter) -> Self {
        Self {
            cache,
            rehydration,
            hosts,
        }
    }

    pub fn cache(&self) -> &ResourceCache<D> {
        &self.cache
    }

    /// Sweep expired cache entries as of now.
    pub async fn sweep(&mut self) -> usize {
        self.cache.sweep_expired(now_millis()).await
    }

    /// Rehydration step shared by resolution and ingestion: a hit with a
    /// course code is written back into the cache before it is returned.
    async fn rehydrate(&mut self, url: &str) -> Option<ResourceInfo> {
        let info = self.rehydration.read(url).await.filter(ResourceInfo::is_usable)?;
        tracing::debug!(url, "rehydrated metadata from session store");
        self.cache.put(url, info.clone()).await;
        Some(info)
    }
}
