//! Target filename construction for renamed downloads.
//!
//! Builds `<CODE>_Exam_<YYYY-MM-DD>.pdf` from cached metadata, derives the name
//! a download would get without renaming, and resolves name conflicts.

mod path;
mod platform;
mod sanitize;
mod unique;

pub use path::last_path_segment;
pub use platform::{filename_from_content_disposition, platform_filename};
pub use sanitize::{is_iso_date, sanitize};
pub use unique::unique_path;

use crate::record::ResourceInfo;

/// Builds the renamed filename for `url` from `info`.
///
/// Returns `None` when `info` has no course code. With an ISO exam date the
/// result is `<code>_Exam_<date>.pdf`; otherwise the sanitized last path
/// segment of `url` is appended as-is, with no `.pdf` forced on it.
pub fn build_filename(info: &ResourceInfo, url: &str) -> Option<String> {
    let code = sanitize(info.course_code()?);
    match info.exam_date().filter(|d| is_iso_date(d)) {
        Some(date) => Some(format!("{code}_Exam_{date}.pdf")),
        None => Some(format!("{code}_Exam_{}", sanitize(last_path_segment(url)))),
    }
}
