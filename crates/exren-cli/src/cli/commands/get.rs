//! `exren get` – download one document.

use anyhow::Result;
use exren_core::config::ExrenConfig;
use exren_core::protocol::{default_socket_path, DownloadRequested, Request, Response};
use exren_core::record::ResourceInfo;
use exren_core::rehydrate::{RehydrationStore, SessionFileStore};
use exren_core::retry::RetryPolicy;
use exren_core::service::{direct_download, DownloadOutcome};
use std::path::Path;

use super::{download_dir, Route};
use crate::cli::socket::request_final;

pub async fn run_get(
    cfg: &ExrenConfig,
    url: &str,
    course_code: Option<&str>,
    exam_date: Option<&str>,
) -> Result<()> {
    let (route, outcome) = get(
        &cfg.retry_policy(),
        &default_socket_path()?,
        &SessionFileStore::open_default(),
        &download_dir(cfg, None)?,
        url,
        ResourceInfo::new(course_code, exam_date),
    )
    .await?;
    match (route, outcome.result) {
        (Route::Daemon, Ok(path)) => println!("Saved {}", path.display()),
        (Route::Direct, Ok(path)) => {
            println!("Daemon not running; saved {} without renaming", path.display())
        }
        (_, Err(message)) => eprintln!("Download failed: {}", message),
    }
    Ok(())
}

/// Stage `info` in `session`, then ask the daemon at `socket` to download
/// `url`. Without a daemon the file is saved to `dir` under its platform name.
pub(crate) async fn get(
    policy: &RetryPolicy,
    socket: &Path,
    session: &SessionFileStore,
    dir: &Path,
    url: &str,
    info: ResourceInfo,
) -> Result<(Route, DownloadOutcome)> {
    if info.is_usable() {
        // Lets a daemon that restarted before the request still name the file.
        session.write(url, &info).await;
    }

    let request = Request::Download(DownloadRequested {
        url: url.to_string(),
        course_code: info.course_code().map(str::to_string),
        exam_date: info.exam_date().map(str::to_string),
    });
    let result = match request_final(policy, socket, &request).await {
        Ok(Response::Downloaded { path, .. }) => Ok(path),
        Ok(Response::Failed { message, .. }) => Err(message),
        Ok(other) => anyhow::bail!("unexpected reply from daemon: {:?}", other),
        Err(e) => {
            tracing::warn!("daemon unavailable, downloading directly: {:#}", e);
            let path = direct_download(url, dir).await?;
            let outcome = DownloadOutcome {
                url: url.to_string(),
                result: Ok(path),
            };
            return Ok((Route::Direct, outcome));
        }
    };
    let outcome = DownloadOutcome {
        url: url.to_string(),
        result,
    };
    Ok((Route::Daemon, outcome))
}
