//! Isolates the JSON-like span in raw generator text.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```[a-z0-9_+\-]*").expect("fence pattern is valid"));

/// Removes markdown code-fence markers, keeping the fenced content.
///
/// Matches a triple backtick with an optional language tag, case-insensitively.
#[must_use]
pub fn strip_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").into_owned()
}

/// Returns the span from the first `{`/`[` to the last `}`/`]`, inclusive.
///
/// No depth tracking: brackets in surrounding prose can widen the span.
/// Returns `None` when no opening bracket precedes a closing one.
#[must_use]
pub fn extract_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let end = text.rfind(['}', ']'])?;
    (end > start).then(|| &text[start..=end])
}

/// Strips fences, then extracts the JSON-like span.
#[must_use]
pub fn extract(raw: &str) -> Option<String> {
    let stripped = strip_fences(raw);
    extract_span(&stripped).map(str::to_string)
}
