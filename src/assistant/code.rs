//! Cleanup of generated code before it is written.

use crate::decode::recovery::unescape;

/// Strips accidental wrapping and decodes leftover escape sequences.
///
/// Surrounding quotes and a surrounding markdown fence are removed. Then
/// `\n` `\r` `\t` `\"` `\\` and `\uXXXX` sequences are decoded, whether or
/// not the code also contains real line breaks. Unknown escapes are kept
/// verbatim. Unwrapped code keeps its leading indentation.
#[must_use]
pub fn clean_code(code: &str) -> String {
    let code = strip_quotes(code).unwrap_or(code);
    let code = strip_fence(code).unwrap_or(code);
    unescape(code)
}

fn strip_quotes(code: &str) -> Option<&str> {
    let trimmed = code.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        Some(&trimmed[1..trimmed.len() - 1])
    } else {
        None
    }
}

fn strip_fence(code: &str) -> Option<&str> {
    let body = code.trim().strip_prefix("```")?.trim_end().strip_suffix("```")?;
    // Drop the language tag line.
    let (_, inner) = body.split_once('\n')?;
    Some(inner.trim_end_matches(['\n', '\r']))
}
