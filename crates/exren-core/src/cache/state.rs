//! In-memory cache state and its persistence hooks.

use indexmap::IndexMap;
use std::time::Duration;

use super::CacheSnapshot;
use crate::record::{now_millis, PageContextRecord, ResourceInfo, ResourceRecord};
use crate::store::DurableStore;

/// Metadata cache backed by a durable store.
///
/// The only mutators are [`put`](Self::put), [`put_page`](Self::put_page) and
/// [`sweep`](Self::sweep); each one persists the full snapshot afterwards.
/// Persistence failures are logged and otherwise ignored: the cache keeps
/// serving from memory and only loses state if the process restarts.
#[derive(Debug)]
pub struct ResourceCache<D> {
    resources: IndexMap<String, ResourceRecord>,
    pages: IndexMap<String, PageContextRecord>,
    store: D,
    ttl: Duration,
}

impl<D: DurableStore> ResourceCache<D> {
    /// Empty cache that persists to `store`. Nothing is read from it.
    pub fn new(store: D, ttl: Duration) -> Self {
        Self {
            resources: IndexMap::new(),
            pages: IndexMap::new(),
            store,
            ttl,
        }
    }

    /// Cache restored from the last snapshot in `store`. A missing or
    /// unreadable snapshot gives an empty cache.
    pub async fn load(store: D, ttl: Duration) -> Self {
        let mut cache = Self::new(store, ttl);
        match cache.store.load().await {
            Ok(Some(snapshot)) => {
                cache.resources = snapshot.resources;
                cache.pages = snapshot.page_contexts;
                tracing::debug!(
                    resources = cache.resources.len(),
                    pages = cache.pages.len(),
                    "restored metadata cache"
                );
            }
            Ok(None) => tracing::debug!("no saved metadata cache"),
            Err(e) => tracing::warn!("loading metadata cache failed, starting empty: {}", e),
        }
        cache
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Record for exactly `url` (case-sensitive).
    pub fn get(&self, url: &str) -> Option<&ResourceRecord> {
        self.resources.get(url)
    }

    /// Course code recorded for the page at `page_url`.
    pub fn page_course_code(&self, page_url: &str) -> Option<&str> {
        self.pages.get(page_url).map(|p| p.course_code.as_str())
    }

    /// First cached key, in insertion order, that `referrer` starts with.
    /// This is the first structural match, not the longest one.
    pub fn first_prefix_of(&self, referrer: &str) -> Option<(&str, &ResourceRecord)> {
        self.resources
            .iter()
            .find(|(key, _)| referrer.starts_with(key.as_str()))
            .map(|(key, record)| (key.as_str(), record))
    }

    /// Resource entries in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceRecord)> {
        self.resources.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Store `info` for `url` stamped with the current time.
    pub async fn put(&mut self, url: &str, info: ResourceInfo) {
        self.put_at(url, info, now_millis()).await;
    }

    /// Store `info` for `url` stamped with `now` (Unix ms). Replaces any
    /// previous record for `url` wholesale; an existing key keeps its position.
    pub async fn put_at(&mut self, url: &str, info: ResourceInfo, now: u64) {
        self.resources.insert(
            url.to_string(),
            ResourceRecord {
                info,
                captured_at: now,
            },
        );
        self.persist().await;
    }

    /// Remember the course code shown on the page at `page_url`.
    pub async fn put_page(&mut self, page_url: &str, course_code: &str) {
        self.put_page_at(page_url, course_code, now_millis()).await;
    }

    pub async fn put_page_at(&mut self, page_url: &str, course_code: &str, now: u64) {
        self.pages.insert(
            page_url.to_string(),
            PageContextRecord {
                course_code: course_code.to_string(),
                captured_at: now,
            },
        );
        self.persist().await;
    }

    /// Drop every record older than `ttl` at time `now` (Unix ms), in both
    /// maps. Returns how many records were removed. Always persists.
    pub async fn sweep(&mut self, now: u64, ttl: Duration) -> usize {
        let ttl_ms = ttl.as_millis() as u64;
        let expired = |captured_at: u64| now.saturating_sub(captured_at) > ttl_ms;

        let before = self.resources.len() + self.pages.len();
        self.resources.retain(|_, r| !expired(r.captured_at));
        self.pages.retain(|_, p| !expired(p.captured_at));
        let removed = before - (self.resources.len() + self.pages.len());

        if removed > 0 {
            tracing::debug!(removed, "swept expired metadata");
        }
        self.persist().await;
        removed
    }

    /// [`sweep`](Self::sweep) with the configured TTL.
    pub async fn sweep_expired(&mut self, now: u64) -> usize {
        let ttl = self.ttl;
        self.sweep(now, ttl).await
    }

    /// Current contents as a serializable snapshot.
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            resources: self.resources.clone(),
            page_contexts: self.pages.clone(),
            ..CacheSnapshot::default()
        }
    }

    /// Write the full snapshot to the store. Failures are logged only.
    pub async fn persist(&self) {
        if let Err(e) = self.store.save(&self.snapshot()).await {
            tracing::warn!("persisting metadata cache failed: {}", e);
        }
    }
}
