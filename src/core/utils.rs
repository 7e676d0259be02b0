const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Cut `text` to at most `max_bytes` bytes on a char boundary, appending a
/// marker when anything was dropped.
pub fn truncate_utf8(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }

    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    let mut truncated = String::with_capacity(end + TRUNCATION_MARKER.len());
    truncated.push_str(&text[..end]);
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// `None` for empty strings, truncated text otherwise
pub fn non_empty_truncated(text: &str, max_bytes: usize) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(truncate_utf8(text, max_bytes))
    }
}
