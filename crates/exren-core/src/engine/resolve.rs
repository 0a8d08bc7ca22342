//! Download-determination: picking the final filename for a download.

use serde::{Deserialize, Serialize};

use super::Engine;
use crate::filename::build_filename;
use crate::record::ResourceInfo;
use crate::rehydrate::RehydrationStore;
use crate::store::DurableStore;

/// The host is about to fix the filename of a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeterminationEvent {
    pub url: String,
    #[serde(default, alias = "referrerUrl", skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    pub suggested_filename: String,
}

/// What the host should do when the chosen name already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictAction {
    /// Keep both files by making the new name unique.
    #[default]
    Uniquify,
}

/// The single answer to a [`DeterminationEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilenameSuggestion {
    pub filename: String,
    pub conflict_action: ConflictAction,
}

impl FilenameSuggestion {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            conflict_action: ConflictAction::Uniquify,
        }
    }
}

/// Which lookup step produced the metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSource {
    Exact,
    Referrer,
    /// Cached key that prefixes the referrer.
    Prefix(String),
    Rehydrated,
}

impl<D: DurableStore, R: RehydrationStore> Engine<D, R> {
    /// Cache-only lookup (steps 1-3). Records without a course code count as
    /// misses. For the prefix step only the first structural match is
    /// considered.
    pub fn lookup(&self, url: &str, referrer: Option<&str>) -> Option<(MatchSource, ResourceInfo)> {
        let usable = |info: &ResourceInfo| info.is_usable();

        if let Some(record) = self.cache.get(url).filter(|r| usable(&r.info)) {
            return Some((MatchSource::Exact, record.info.clone()));
        }
        let referrer = referrer.filter(|r| !r.is_empty())?;
        if let Some(record) = self.cache.get(referrer).filter(|r| usable(&r.info)) {
            return Some((MatchSource::Referrer, record.info.clone()));
        }
        let (key, record) = self.cache.first_prefix_of(referrer)?;
        usable(&record.info).then(|| (MatchSource::Prefix(key.to_string()), record.info.clone()))
    }

    /// Resolve the filename for `event`. Always yields exactly one
    /// suggestion; the original name is the fallback for every miss.
    /// Cache hits return without awaiting; only the rehydration step suspends.
    pub async fn determine_filename(&mut self, event: &DeterminationEvent) -> FilenameSuggestion {
        if !self.hosts.allows(&event.url) {
            return FilenameSuggestion::new(event.suggested_filename.clone());
        }

        let found = match self.lookup(&event.url, event.referrer.as_deref()) {
            Some(hit) => Some(hit),
            None => self
                .rehydrate(&event.url)
                .await
                .map(|info| (MatchSource::Rehydrated, info)),
        };

        let Some((source, info)) = found else {
            tracing::debug!(url = %event.url, "no metadata; keeping original filename");
            return FilenameSuggestion::new(event.suggested_filename.clone());
        };

        match build_filename(&info, &event.url) {
            Some(filename) => {
                tracing::info!(url = %event.url, source = ?source, "renaming to {}", filename);
                FilenameSuggestion::new(filename)
            }
            None => FilenameSuggestion::new(event.suggested_filename.clone()),
        }
    }
}
