//! Line-delimited JSON messages between the daemon and its clients.
//!
//! Each request and each response is one JSON object on its own line, tagged
//! by `type`. Payload fields are camelCase so a browser-side bridge can
//! forward its messages unchanged.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::{DeterminationEvent, FilenameSuggestion};
use crate::record::ResourceInfo;

/// Metadata scraped from one archive page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadataObserved {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    #[serde(default)]
    pub resources: IndexMap<String, ResourceInfo>,
}

/// A click on one document link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequested {
    #[serde(alias = "pdfUrl")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<String>,
}

impl DownloadRequested {
    pub fn info(&self) -> ResourceInfo {
        ResourceInfo::new(self.course_code.as_deref(), self.exam_date.as_deref())
    }
}

/// "Download all" on a page: every item is handled independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadAllRequested {
    #[serde(default)]
    pub items: Vec<DownloadRequested>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    PageMetadata(PageMetadataObserved),
    Download(DownloadRequested),
    DownloadAll(DownloadAllRequested),
    DetermineFilename(DeterminationEvent),
}

/// Aggregate progress of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub found: usize,
    /// Items finished so far, failed ones included.
    pub completed: usize,
    pub failed: usize,
}

impl BatchProgress {
    pub fn is_finished(&self) -> bool {
        self.completed >= self.found
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ack {
        stored: usize,
    },
    Suggestion(FilenameSuggestion),
    Downloaded {
        url: String,
        path: PathBuf,
    },
    Failed {
        url: String,
        message: String,
    },
    Progress(BatchProgress),
    Error {
        message: String,
    },
}

impl Response {
    /// True for the last response a request produces.
    pub fn is_final(&self) -> bool {
        match self {
            Response::Progress(p) => p.is_finished(),
            _ => true,
        }
    }
}

/// Encode a message as one line, newline included.
pub fn encode_line<T: Serialize>(msg: &T) -> Result<String> {
    let mut line = serde_json::to_string(msg).context("encode message")?;
    line.push('\n');
    Ok(line)
}

/// Decode one line into a message.
pub fn decode_line<T: for<'de> Deserialize<'de>>(line: &str) -> Result<T> {
    serde_json::from_str(line.trim()).with_context(|| format!("decode message: {}", line.trim()))
}

/// Default path of the daemon socket: `~/.local/state/exren/exren.sock`.
pub fn default_socket_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("exren")?;
    Ok(xdg_dirs.get_state_home().join("exren").join("exren.sock"))
}
