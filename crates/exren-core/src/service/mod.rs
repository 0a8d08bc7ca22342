//! Daemon-side service: one engine shared by every connection.
//!
//! The engine sits behind an async mutex; each event holds it from start to
//! finish, which gives the single-owner, run-to-completion handling the cache
//! relies on. Network transfers happen outside the lock.

mod batch;
mod download;

pub use download::{direct_download, DownloadOutcome};

use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;

use crate::engine::{DeterminationEvent, Engine, FilenameSuggestion};
use crate::protocol::{PageMetadataObserved, Request, Response};
use crate::rehydrate::RehydrationStore;
use crate::store::DurableStore;

pub struct Service<D, R> {
    engine: Mutex<Engine<D, R>>,
    download_dir: PathBuf,
}

impl<D, R> Service<D, R>
where
    D: DurableStore + Send + Sync,
    R: RehydrationStore + Send + Sync,
{
    pub fn new(engine: Engine<D, R>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine: Mutex::new(engine),
            download_dir: download_dir.into(),
        }
    }

    /// Run `f` with exclusive access to the engine.
    pub async fn with_engine<T>(&self, f: impl FnOnce(&Engine<D, R>) -> T) -> T {
        let engine = self.engine.lock().await;
        f(&engine)
    }

    /// Store page metadata. Returns the number of resources stored.
    pub async fn ingest(&self, page: &PageMetadataObserved) -> usize {
        self.engine
            .lock()
            .await
            .on_page_metadata(page.page_url.as_deref(), page.course_code.as_deref(), &page.resources)
            .await
    }

    /// Answer a download-determination event.
    pub async fn determine(&self, event: &DeterminationEvent) -> FilenameSuggestion {
        self.engine.lock().await.determine_filename(event).await
    }

    /// Drop expired cache entries. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        self.engine.lock().await.sweep().await
    }

    /// Dispatch one protocol request, sending its responses on `responses`.
    /// The last response sent is always final (see [`Response::is_final`]).
    pub async fn handle(&self, request: Request, responses: UnboundedSender<Response>) {
        match request {
            Request::PageMetadata(page) => {
                let stored = self.ingest(&page).await;
                let _ = responses.send(Response::Ack { stored });
            }
            Request::DetermineFilename(event) => {
                let suggestion = self.determine(&event).await;
                let _ = responses.send(Response::Suggestion(suggestion));
            }
            Request::Download(request) => {
                let outcome = self.download(&request).await;
                let _ = responses.send(outcome.into_response());
            }
            Request::DownloadAll(batch) => {
                self.download_all(&batch.items, |progress| {
                    let _ = responses.send(Response::Progress(progress));
                })
                .await;
            }
        }
    }
}
