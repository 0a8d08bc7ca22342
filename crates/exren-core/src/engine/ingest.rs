//! Event ingestion: page metadata and download requests.

use indexmap::IndexMap;

use super::{ConflictAction, Engine};
use crate::filename::build_filename;
use crate::record::{is_course_code, ResourceInfo};
use crate::rehydrate::RehydrationStore;
use crate::store::DurableStore;

/// A download the host must start. Issued for every request, renamed or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAction {
    pub url: String,
    /// Name to save under; `None` lets the host pick its usual name.
    pub filename: Option<String>,
    pub conflict_action: ConflictAction,
}

impl<D: DurableStore, R: RehydrationStore> Engine<D, R> {
    /// Store metadata scraped from one page. The page-level course code fills
    /// in for resources that carry none. Returns the number of resources stored.
    pub async fn on_page_metadata(
        &mut self,
        page_url: Option<&str>,
        course_code: Option<&str>,
        resources: &IndexMap<String, ResourceInfo>,
    ) -> usize {
        let course_code = course_code.filter(|c| !c.is_empty());
        if let Some(code) = course_code.filter(|c| !is_course_code(c)) {
            tracing::debug!(code, "page course code has an unexpected shape");
        }
        if let (Some(page_url), Some(code)) = (page_url.filter(|p| !p.is_empty()), course_code) {
            self.cache.put_page(page_url, code).await;
        }

        let mut stored = 0;
        for (url, info) in resources.iter().filter(|(url, _)| !url.is_empty()) {
            let info = info.clone().inherit_course_code(course_code);
            self.cache.put(url, info).await;
            stored += 1;
        }
        tracing::debug!(stored, page = page_url.unwrap_or("-"), "ingested page metadata");
        stored
    }

    /// A click asked for `url` with whatever metadata the click handler had.
    ///
    /// With a course code the metadata goes straight into the cache. Without
    /// one, the cache and then the rehydration store are consulted so the
    /// first click after a restart can still be renamed. The returned action
    /// is always issued, with or without a name. An empty `url` is never
    /// cached and never named.
    pub async fn on_download_requested(&mut self, url: &str, info: ResourceInfo) -> DownloadAction {
        let resolved = if url.is_empty() {
            // An empty key would prefix every referrer.
            None
        } else if info.is_usable() {
            self.cache.put(url, info.clone()).await;
            Some(info)
        } else {
            match self.lookup(url, None) {
                Some((_, cached)) => Some(cached),
                None => self.rehydrate(url).await,
            }
        };

        let filename = resolved.and_then(|info| build_filename(&info, url));
        if filename.is_none() {
            tracing::debug!(url, "download requested without metadata");
        }
        DownloadAction {
            url: url.to_string(),
            filename,
            conflict_action: ConflictAction::Uniquify,
        }
    }
}
