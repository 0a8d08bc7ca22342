//! Character-level checks for built filenames.

/// Characters Windows and browsers refuse in filenames.
const FORBIDDEN: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Removes `\ / : * ? " < > |` and trims surrounding whitespace.
/// Nothing else is restricted.
pub fn sanitize(name: &str) -> String {
    let kept: String = name.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
    kept.trim().to_string()
}

/// True iff `s` is `DDDD-DD-DD` with ASCII digits. No calendar check.
pub fn is_iso_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}
