/// Strips a leading ```` ```json ```` / ```` ``` ```` fence and returns the body of
/// the first fenced block. Text that does not open with a fence is returned trimmed.
///
/// Anything after the closing fence is discarded.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let body = match rest.find('\n') {
        Some(idx) if is_language_tag(&rest[..idx]) => &rest[idx + 1..],
        // Single-line block: ```json{"a":1}```
        _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Any opening line that does not start JSON content is a tag (`json`, `c++`, `c#`).
fn is_language_tag(line: &str) -> bool {
    !line.contains(['{', '[', '"'])
}
