//! Metadata records kept per document URL and per page URL.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Metadata a caller knows about one document. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<String>,
}

impl ResourceInfo {
    pub fn new(course_code: Option<&str>, exam_date: Option<&str>) -> Self {
        Self {
            course_code: course_code.map(str::to_string),
            exam_date: exam_date.map(str::to_string),
        }
    }

    /// The course code, if present and non-empty.
    pub fn course_code(&self) -> Option<&str> {
        self.course_code.as_deref().filter(|c| !c.is_empty())
    }

    /// The exam date, if present and non-empty.
    pub fn exam_date(&self) -> Option<&str> {
        self.exam_date.as_deref().filter(|d| !d.is_empty())
    }

    /// True when the record carries a course code; anything else cannot rename.
    pub fn is_usable(&self) -> bool {
        self.course_code().is_some()
    }

    /// Fills a missing course code from the page-level one. Explicit values win.
    pub fn inherit_course_code(self, page_code: Option<&str>) -> Self {
        let course_code = self
            .course_code()
            .or(page_code.filter(|c| !c.is_empty()))
            .map(str::to_string);
        Self {
            course_code,
            exam_date: self.exam_date().map(str::to_string),
        }
    }
}

/// Cached metadata for one document URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    #[serde(flatten)]
    pub info: ResourceInfo,
    /// Unix milliseconds when the record was written.
    pub captured_at: u64,
}

/// Course code inferred for a whole page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContextRecord {
    pub course_code: String,
    pub captured_at: u64,
}

/// True when `s` has the course code shape: 2-6 uppercase ASCII letters
/// followed by 3-4 ASCII digits.
pub fn is_course_code(s: &str) -> bool {
    let letters = s.bytes().take_while(u8::is_ascii_uppercase).count();
    let digits = &s.as_bytes()[letters..];
    (2..=6).contains(&letters)
        && (3..=4).contains(&digits.len())
        && digits.iter().all(u8::is_ascii_digit)
}

/// Current wall-clock time as Unix milliseconds. Wall clock (not `Instant`)
/// so capture times stay meaningful after a restart.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
