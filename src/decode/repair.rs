//! Best-effort repair of malformed escapes and quotes in generator JSON.
//!
//! Generators mix over-escaping (`\"` where a plain closing quote belongs)
//! with under-escaping (raw newlines and tabs inside string values). No
//! single substitution handles both, so repair is split into three passes:
//!
//! 1. [`normalize_escapes`]: substitution rules for known corruption patterns.
//! 2. [`rescan_quotes`]: a scanner deciding, for each `\"` inside a string,
//!    whether the backslash is a real escape or a stray one before a
//!    closing quote.
//! 3. [`escape_specials`]: a scanner escaping raw control characters and
//!    interior quotes inside strings.
//!
//! None of the passes can fail or panic. Text they cannot fix comes back
//! in some form that will still fail structural validation downstream.

use std::sync::LazyLock;

use regex::Regex;

/// State of the character scanners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    OutsideString,
    InsideString,
    JustEscaped,
}

static OVER_ESCAPED_QUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\\\\\\""#).expect("over-escaped quote pattern is valid"));

static BACKSLASH_BEFORE_CLOSING_QUOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\\])\\"(\s*[,}\]])"#).expect("closing quote pattern is valid")
});

static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma pattern is valid"));

static ORPHAN_BACKSLASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^\\])\\([,}\]])").expect("orphan backslash pattern is valid"));

/// Applies the substitution rules once each.
///
/// A document whose quotes are all escaped is decoded as one JSON string
/// literal first. Then, in order: `\\\"` collapses to `\"`; a backslash
/// before a quote that is followed by `,` `}` or `]` is dropped; a
/// backslash directly before `,` `}` or `]` is dropped; a trailing comma
/// before `}` or `]` is dropped. Text that already
/// parses is returned unchanged, since the rules cannot tell a legitimate
/// escape from a stray one without context.
#[must_use]
pub fn normalize_escapes(text: &str) -> String {
    if parses(text) {
        return text.to_string();
    }
    let unwrapped = unwrap_double_encoded(text);
    let text = unwrapped.as_deref().unwrap_or(text);
    if unwrapped.is_some() && parses(text) {
        return text.to_string();
    }
    let text = OVER_ESCAPED_QUOTE_RE.replace_all(text, r#"\""#);
    let text = BACKSLASH_BEFORE_CLOSING_QUOTE_RE.replace_all(&text, "${1}\"${2}");
    let text = ORPHAN_BACKSLASH_RE.replace_all(&text, "${1}${2}");
    TRAILING_COMMA_RE.replace_all(&text, "${1}").into_owned()
}

/// Decides whether each backslash-quote inside a string is a real escape.
///
/// A raw quote toggles between outside and inside a string. After a
/// backslash inside a string, a following quote that looks like it closes
/// the value (see [`quote_looks_closing`]) has its backslash dropped.
/// Other valid escapes are kept; an invalid escape keeps its backslash as
/// a literal (`\\`). A backslash before a quote outside any string is
/// dropped.
#[must_use]
pub fn rescan_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = ScanState::OutsideString;

    for (i, &c) in chars.iter().enumerate() {
        state = match state {
            ScanState::OutsideString => {
                if c == '\\' && chars.get(i + 1) == Some(&'"') {
                    // stray escape on a key or value opening quote
                } else {
                    out.push(c);
                }
                if c == '"' {
                    ScanState::InsideString
                } else {
                    ScanState::OutsideString
                }
            }
            ScanState::InsideString => match c {
                '\\' => ScanState::JustEscaped,
                '"' => {
                    out.push(c);
                    ScanState::OutsideString
                }
                _ => {
                    out.push(c);
                    ScanState::InsideString
                }
            },
            ScanState::JustEscaped => match c {
                '"' if quote_looks_closing(&chars, i + 1) => {
                    out.push('"');
                    ScanState::OutsideString
                }
                'u' if is_unicode_escape(&chars, i + 1) => {
                    out.push_str("\\u");
                    ScanState::InsideString
                }
                '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' => {
                    out.push('\\');
                    out.push(c);
                    ScanState::InsideString
                }
                _ => {
                    out.push_str("\\\\");
                    out.push(c);
                    ScanState::InsideString
                }
            },
        };
    }

    if state == ScanState::JustEscaped {
        out.push_str("\\\\");
    }
    out
}

/// Escapes raw control characters and interior quotes inside strings.
///
/// Inside a string, newline, carriage return and tab become `\n`, `\r` and
/// `\t`; other control characters become `\u00XX`. A raw quote only closes
/// the string when the next significant character is a structural
/// delimiter or the end of input; otherwise it is escaped.
#[must_use]
pub fn escape_specials(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = ScanState::OutsideString;

    for (i, &c) in chars.iter().enumerate() {
        state = match state {
            ScanState::OutsideString => {
                out.push(c);
                if c == '"' {
                    ScanState::InsideString
                } else {
                    ScanState::OutsideString
                }
            }
            ScanState::InsideString => match c {
                '\\' => {
                    out.push(c);
                    ScanState::JustEscaped
                }
                '"' if closes_string(&chars, i + 1) => {
                    out.push(c);
                    ScanState::OutsideString
                }
                '"' => {
                    out.push_str("\\\"");
                    ScanState::InsideString
                }
                _ => {
                    push_escaped_control(&mut out, c);
                    ScanState::InsideString
                }
            },
            ScanState::JustEscaped => {
                match c {
                    '\n' => out.push('n'),
                    '\r' => out.push('r'),
                    '\t' => out.push('t'),
                    _ => out.push(c),
                }
                ScanState::InsideString
            }
        };
    }

    out
}

/// Runs the repair round used between structural parse attempts.
#[must_use]
pub fn repair_round(text: &str) -> String {
    rescan_quotes(&normalize_escapes(text))
}

/// Decodes a document that was JSON-encoded twice (`{\"a\": 1}`).
///
/// Only applies when the text has escaped quotes and no unescaped ones.
fn unwrap_double_encoded(text: &str) -> Option<String> {
    if !text.contains("\\\"") || has_unescaped_quote(text) {
        return None;
    }
    serde_json::from_str::<String>(&format!("\"{text}\"")).ok()
}

fn has_unescaped_quote(text: &str) -> bool {
    let mut backslashes = 0usize;
    for c in text.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' if backslashes % 2 == 0 => return true,
            _ => backslashes = 0,
        }
    }
    false
}

fn parses(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text).is_ok()
}

fn push_escaped_control(out: &mut String, c: char) {
    match c {
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c.is_control() && (c as u32) < 0x20 => {
            out.push_str(&format!("\\u{:04x}", c as u32));
        }
        c => out.push(c),
    }
}

fn next_significant(chars: &[char], from: usize) -> Option<(usize, char)> {
    chars
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, &c)| (i, c))
}

/// A raw quote closes a string when a delimiter or end of input follows.
fn closes_string(chars: &[char], from: usize) -> bool {
    match next_significant(chars, from) {
        None => true,
        Some((_, c)) => matches!(c, ',' | ':' | '}' | ']'),
    }
}

/// An escaped quote looks like a mis-escaped closing quote when the text
/// after it continues like JSON structure rather than string content.
fn quote_looks_closing(chars: &[char], from: usize) -> bool {
    let Some((i, c)) = next_significant(chars, from) else {
        return true;
    };
    match c {
        ':' => true,
        ',' => matches!(
            next_significant(chars, i + 1),
            None | Some((_, '"' | '{' | '[' | '}' | ']'))
        ),
        '}' | ']' => matches!(
            next_significant(chars, i + 1),
            None | Some((_, ',' | '}' | ']'))
        ),
        _ => false,
    }
}

fn is_unicode_escape(chars: &[char], from: usize) -> bool {
    chars.len() >= from + 4 && chars[from..from + 4].iter().all(char::is_ascii_hexdigit)
}
