//! Single-stream HTTP GET into a hidden partial file.
//!
//! The body is fetched before the final name is known; the caller decides the
//! name afterwards (that is the download-determination point) and then calls
//! [`FetchedFile::finish`] to move the file into place.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::filename::{platform_filename, unique_path};

static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A completed transfer waiting for its final name.
#[derive(Debug)]
pub struct FetchedFile {
    part_path: PathBuf,
    /// Bytes written to the partial file.
    pub bytes: u64,
    /// `Content-Disposition` value if the server sent one.
    pub content_disposition: Option<String>,
}

impl FetchedFile {
    /// The name this file gets when nothing renames it.
    pub fn platform_filename(&self, url: &str) -> String {
        platform_filename(url, self.content_disposition.as_deref())
    }

    /// Move the file to `dir/filename`, making the name unique if taken.
    /// Only the last component of `filename` is used. The partial file is
    /// removed if the move fails.
    pub fn finish(self, dir: &Path, filename: &str) -> Result<PathBuf> {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("download");
        let target = unique_path(dir, name);
        if let Err(e) = std::fs::rename(&self.part_path, &target) {
            let _ = std::fs::remove_file(&self.part_path);
            return Err(e).with_context(|| {
                format!("move {} to {}", self.part_path.display(), target.display())
            });
        }
        Ok(target)
    }
}

fn part_path(dir: &Path) -> PathBuf {
    let n = PART_COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(".exren-{}-{}.part", std::process::id(), n))
}

/// Downloads `url` with a single GET into a new partial file in `dir`.
///
/// Follows redirects. Runs in the current thread; call from `spawn_blocking`
/// when used from async code. The partial file is removed on failure.
pub fn fetch_to_part(url: &str, dir: &Path) -> Result<FetchedFile> {
    std::fs::create_dir_all(dir).with_context(|| format!("create dir: {}", dir.display()))?;
    let part_path = part_path(dir);
    match fetch_into(url, &part_path) {
        Ok((bytes, content_disposition)) => Ok(FetchedFile {
            part_path,
            bytes,
            content_disposition,
        }),
        Err(e) => {
            let _ = std::fs::remove_file(&part_path);
            Err(e)
        }
    }
}

fn fetch_into(url: &str, part_path: &Path) -> Result<(u64, Option<String>)> {
    let mut file = File::create(part_path)
        .with_context(|| format!("create partial file: {}", part_path.display()))?;
    let mut headers: Vec<String> = Vec::new();
    let mut written: u64 = 0;
    let mut write_error: Option<std::io::Error> = None;

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(30))?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;
    easy.timeout(Duration::from_secs(600))?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                headers.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.write_function(|data| match file.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                write_error = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        let performed = transfer.perform();
        drop(transfer);
        if let Some(e) = write_error.take() {
            return Err(e).context("write partial file");
        }
        performed.context("GET request failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("GET {} returned HTTP {}", url, code);
    }
    file.flush().context("flush partial file")?;

    Ok((written, content_disposition(&headers)))
}

/// Last `Content-Disposition` header seen (after redirects, the final response's).
fn content_disposition(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .filter_map(|line| line.split_once(':'))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case("content-disposition"))
        .map(|(_, value)| value.trim().to_string())
        .last()
}
