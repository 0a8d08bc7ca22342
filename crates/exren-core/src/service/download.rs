//! Executing download actions.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::Service;
use crate::engine::DeterminationEvent;
use crate::fetch::{fetch_to_part, FetchedFile};
use crate::protocol::{DownloadRequested, Response};
use crate::rehydrate::RehydrationStore;
use crate::store::DurableStore;

/// Result of one requested download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub url: String,
    /// Saved path, or the error message.
    pub result: Result<PathBuf, String>,
}

impl DownloadOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_response(self) -> Response {
        match self.result {
            Ok(path) => Response::Downloaded { url: self.url, path },
            Err(message) => Response::Failed {
                url: self.url,
                message,
            },
        }
    }
}

async fn fetch(url: &str, dir: &Path) -> Result<FetchedFile> {
    let url = url.to_string();
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || fetch_to_part(&url, &dir))
        .await
        .context("download task panicked")?
}

impl<D, R> Service<D, R>
where
    D: DurableStore + Send + Sync,
    R: RehydrationStore + Send + Sync,
{
    /// Handle a click: ingest it, fetch the body, then name the file through
    /// a determination event. A failed rename never fails the download.
    pub async fn download(&self, request: &DownloadRequested) -> DownloadOutcome {
        let action = self
            .engine
            .lock()
            .await
            .on_download_requested(&request.url, request.info())
            .await;

        let fetched = match fetch(&action.url, &self.download_dir).await {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(url = %action.url, "download failed: {:#}", e);
                return DownloadOutcome {
                    url: action.url,
                    result: Err(format!("{e:#}")),
                };
            }
        };

        let suggested_filename = action
            .filename
            .clone()
            .unwrap_or_else(|| fetched.platform_filename(&action.url));
        let event = DeterminationEvent {
            url: action.url.clone(),
            referrer: None,
            suggested_filename,
        };
        let suggestion = self.determine(&event).await;

        let bytes = fetched.bytes;
        let result = fetched
            .finish(&self.download_dir, &suggestion.filename)
            .map_err(|e| format!("{e:#}"));
        match &result {
            Ok(path) => tracing::info!(url = %action.url, bytes, "saved {}", path.display()),
            Err(e) => tracing::warn!(url = %action.url, "saving download failed: {}", e),
        }
        DownloadOutcome {
            url: action.url,
            result,
        }
    }
}

/// Download under the platform name without any metadata lookup. Used when
/// the daemon cannot be reached.
pub async fn direct_download(url: &str, dir: &Path) -> Result<PathBuf> {
    let fetched = fetch(url, dir).await?;
    let name = fetched.platform_filename(url);
    fetched.finish(dir, &name)
}
