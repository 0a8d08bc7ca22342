/// Text after the last `/` of `url`, cut at the first `?`.
///
/// Works on the raw string: no URL parsing and no percent-decoding, so
/// `https://host/dir/` yields an empty segment.
pub fn last_path_segment(url: &str) -> &str {
    let tail = url.rsplit('/').next().unwrap_or(url);
    tail.split('?').next().unwrap_or(tail)
}
