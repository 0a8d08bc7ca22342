//! `exren get-all` – download a batch with progress.

use anyhow::Result;
use exren_core::config::ExrenConfig;
use exren_core::protocol::{default_socket_path, BatchProgress, DownloadAllRequested, Request, Response};
use exren_core::retry::RetryPolicy;
use exren_core::service::direct_download;
use std::path::Path;

use super::{download_dir, read_json, Route};
use crate::cli::socket::request;

/// One progress line, e.g. `Found 3 • Downloaded 1 / 3`.
fn progress_line(p: &BatchProgress) -> String {
    let mut line = format!(
        "Found {} \u{2022} Downloaded {} / {}",
        p.found,
        p.completed - p.failed,
        p.found
    );
    if p.failed > 0 {
        line.push_str(&format!(" ({} failed)", p.failed));
    }
    line
}

pub async fn run_get_all(cfg: &ExrenConfig, file: &Path) -> Result<()> {
    let batch: DownloadAllRequested = read_json(file)?;
    let (route, _) = get_all(
        &cfg.retry_policy(),
        &default_socket_path()?,
        &download_dir(cfg, None)?,
        &batch,
        |p| println!("{}", progress_line(p)),
    )
    .await?;
    if route == Route::Direct {
        println!("Daemon not running; files were saved without renaming.");
    }
    Ok(())
}

/// Send `batch` to the daemon at `socket`, or download every item into
/// `dir` directly when the daemon cannot be reached. `on_progress` sees the
/// same updates either way. Returns the final totals.
pub(crate) async fn get_all(
    policy: &RetryPolicy,
    socket: &Path,
    dir: &Path,
    batch: &DownloadAllRequested,
    mut on_progress: impl FnMut(&BatchProgress),
) -> Result<(Route, BatchProgress)> {
    let mut progress = BatchProgress {
        found: batch.items.len(),
        ..BatchProgress::default()
    };
    let req = Request::DownloadAll(batch.clone());
    let mut last = None;
    let sent = request(policy, socket, &req, |r| {
        if let Response::Progress(p) = r {
            last = Some(*p);
            on_progress(p);
        }
    })
    .await;

    match (sent, last) {
        (Ok(()), Some(last)) => return Ok((Route::Daemon, last)),
        (Ok(()), None) => anyhow::bail!("daemon sent no progress"),
        // Items may already be downloading; sending the batch again would repeat them.
        (Err(e), Some(_)) => return Err(e),
        (Err(e), None) => tracing::warn!("daemon unavailable, downloading directly: {:#}", e),
    }

    on_progress(&progress);
    for item in &batch.items {
        if let Err(e) = direct_download(&item.url, dir).await {
            tracing::warn!(url = %item.url, "direct download failed: {:#}", e);
            progress.failed += 1;
        }
        progress.completed += 1;
        on_progress(&progress);
    }
    Ok((Route::Direct, progress))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_counts_successes() {
        let p = BatchProgress { found: 3, completed: 2, failed: 0 };
        assert_eq!(progress_line(&p), "Found 3 \u{2022} Downloaded 2 / 3");
    }

    #[test]
    fn progress_line_mentions_failures() {
        let p = BatchProgress { found: 3, completed: 3, failed: 1 };
        assert_eq!(progress_line(&p), "Found 3 \u{2022} Downloaded 2 / 3 (1 failed)");
    }
}
