use super::Service;
use crate::protocol::{BatchProgress, DownloadRequested};
use crate::rehydrate::RehydrationStore;
use crate::store::DurableStore;

impl<D, R> Service<D, R>
where
    D: DurableStore + Send + Sync,
    R: RehydrationStore + Send + Sync,
{
    /// Download every item in order, each independently of the others.
    /// `on_progress` sees the totals once up front and after every item.
    pub async fn download_all(
        &self,
        items: &[DownloadRequested],
        mut on_progress: impl FnMut(BatchProgress),
    ) -> BatchProgress {
        let mut progress = BatchProgress {
            found: items.len(),
            ..BatchProgress::default()
        };
        on_progress(progress);

        for item in items {
            let outcome = self.download(item).await;
            progress.completed += 1;
            if !outcome.is_ok() {
                progress.failed += 1;
            }
            on_progress(progress);
        }

        tracing::info!(
            found = progress.found,
            failed = progress.failed,
            "batch download finished"
        );
        progress
    }
}
