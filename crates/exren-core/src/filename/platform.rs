//! The filename a download gets when nothing renames it.

/// Fallback when neither the response headers nor the URL name the file.
const DEFAULT_FILENAME: &str = "download";

/// Filename a plain download of `url` would be saved under.
///
/// Prefers the Content-Disposition filename, then the percent-decoded last
/// path segment of the URL, then `download`. Directory components, control
/// characters and leading dots are removed so the result is a single safe
/// path component.
pub fn platform_filename(url: &str, content_disposition: Option<&str>) -> String {
    content_disposition
        .and_then(filename_from_content_disposition)
        .map(|name| to_path_component(&name))
        .filter(|name| !name.is_empty())
        .or_else(|| url_path_filename(url))
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

/// Extracts the filename from a Content-Disposition header value.
/// `filename*=UTF-8''...` wins over `filename=`.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';').map(str::trim) {
        let Some((name, v)) = param.split_once('=') else {
            continue;
        };
        let v = v.trim();
        if name.trim().eq_ignore_ascii_case("filename*") {
            let encoded = v
                .split_once("''")
                .filter(|(charset, _)| charset.eq_ignore_ascii_case("utf-8"))
                .map(|(_, rest)| rest);
            if let Some(decoded) = encoded.map(percent_decode).filter(|s| !s.is_empty()) {
                return Some(decoded);
            }
        } else if name.trim().eq_ignore_ascii_case("filename") {
            let unquoted = v
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .map(|s| s.replace("\\\"", "\"").replace("\\\\", "\\"))
                .unwrap_or_else(|| v.to_string());
            if !unquoted.is_empty() {
                plain = Some(unquoted);
            }
        }
    }
    plain
}

fn url_path_filename(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let name = to_path_component(&percent_decode(segment));
    (!name.is_empty()).then_some(name)
}

/// Keeps the part after the last separator and drops control characters and
/// leading dots.
fn to_path_component(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    cleaned.trim().trim_start_matches('.').to_string()
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(h << 4 | l);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_disposition_quoted_and_token() {
        assert_eq!(
            filename_from_content_disposition("attachment; filename=\"paper.pdf\"").as_deref(),
            Some("paper.pdf")
        );
        assert_eq!(
            filename_from_content_disposition("attachment; filename=paper.pdf").as_deref(),
            Some("paper.pdf")
        );
        assert_eq!(filename_from_content_disposition("inline"), None);
    }

    #[test]
    fn content_disposition_extended_wins() {
        let header = "attachment; filename=\"fallback.pdf\"; filename*=UTF-8''exam%202024.pdf";
        assert_eq!(
            filename_from_content_disposition(header).as_deref(),
            Some("exam 2024.pdf")
        );
    }

    #[test]
    fn platform_prefers_header_then_url() {
        assert_eq!(
            platform_filename("https://host/a.pdf", Some("attachment; filename=\"b.pdf\"")),
            "b.pdf"
        );
        assert_eq!(
            platform_filename("https://host/archive/files/exam%201.pdf?download=1", None),
            "exam 1.pdf"
        );
        assert_eq!(platform_filename("https://host/", None), "download");
        assert_eq!(platform_filename("not a url", None), "download");
    }

    #[test]
    fn platform_strips_directories_and_dots() {
        assert_eq!(
            platform_filename("https://host/x", Some("attachment; filename=\"../../etc/passwd\"")),
            "passwd"
        );
        assert_eq!(
            platform_filename("https://host/x", Some("attachment; filename=\"..\"")),
            "x"
        );
        assert_eq!(platform_filename("https://host/.hidden", None), "hidden");
    }
}
