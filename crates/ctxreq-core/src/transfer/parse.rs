//! Recover an HTTP status code from partial transfer information.

/// Status code of a status line such as `HTTP/1.1 301 Moved Permanently`.
pub(crate) fn status_from_line(line: &str) -> Option<u32> {
    let mut parts = line.split_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    leading_status(parts.next()?)
}

/// Three-digit status code at the very start of `text`, e.g. an error
/// description like `301 response missing Location header`.
pub(crate) fn leading_status(text: &str) -> Option<u32> {
    let digits = text.get(..3)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
