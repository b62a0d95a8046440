//! Last-resort salvage of individual fields when structural decoding fails.
//!
//! Patterns tolerate escaped quotes inside values and a final value cut off
//! by truncation. `TaskList` has no rule: running half of a salvaged task
//! is worse than running none.

use std::sync::LazyLock;

use regex::Regex;

use crate::shapes::{
    Classification, ContextRetrieval, GeneralAnswer, Operation, PromptKind, ResponseShape,
    ShapeKind, SingleTask,
};

/// Explanation attached to a salvaged single-task response.
pub const RECOVERED_EXPLANATION: &str =
    "Recovered partial result: the response could not be decoded as structured data.";

const STRING_BODY: &str = r#"((?:[^"\\]|\\.)*)"#;

/// Salvages the fields of `kind` from `text`, if the shape has a rule and
/// its key field is present.
#[must_use]
pub fn recover(text: &str, kind: ShapeKind) -> Option<ResponseShape> {
    match kind {
        ShapeKind::SingleTask => recover_single_task(text).map(ResponseShape::SingleTask),
        ShapeKind::Classification => {
            let kind = TYPE.capture(text)?;
            Some(ResponseShape::Classification(Classification {
                kind: PromptKind::parse_lenient(&kind),
                reasoning: REASONING.capture(text).unwrap_or_default(),
            }))
        }
        ShapeKind::ContextRetrieval => {
            let relevant_files = RELEVANT_FILES.capture(text)?;
            Some(ResponseShape::ContextRetrieval(ContextRetrieval {
                relevant_files,
                reasoning: REASONING.capture(text).unwrap_or_default(),
            }))
        }
        ShapeKind::GeneralAnswer => {
            let answer = ANSWER.capture(text)?;
            Some(ResponseShape::GeneralAnswer(GeneralAnswer {
                answer,
                references: REFERENCES.capture(text).unwrap_or_default(),
            }))
        }
        ShapeKind::TaskList => None,
    }
}

fn recover_single_task(text: &str) -> Option<SingleTask> {
    let code = CODE.capture(text);
    let file_path = FILE_PATH.capture(text);
    if code.is_none() && file_path.is_none() {
        return None;
    }
    Some(SingleTask {
        code: code.unwrap_or_default(),
        file_path: file_path.unwrap_or_default(),
        operation: Operation::Update,
        explanation: RECOVERED_EXPLANATION.to_string(),
    })
}

/// Patterns for the string value of `"name": "..."`.
struct StringField {
    closed: Regex,
    truncated: Regex,
}

impl StringField {
    fn new(name: &str) -> Self {
        Self {
            closed: Regex::new(&format!(r#"(?is)"{name}"\s*:\s*"{STRING_BODY}""#))
                .expect("closed field pattern is valid"),
            truncated: Regex::new(&format!(r#"(?is)"{name}"\s*:\s*"{STRING_BODY}\\?\z"#))
                .expect("truncated field pattern is valid"),
        }
    }

    /// Captures the value, unescaped. Falls back to a value running to the
    /// end of the text when the closing quote was lost to truncation.
    fn capture(&self, text: &str) -> Option<String> {
        self.closed
            .captures(text)
            .or_else(|| self.truncated.captures(text))
            .map(|caps| unescape(&caps[1]))
    }
}

/// Pattern for the quoted strings inside `"name": [ ... ]`, tolerating a
/// missing closing bracket.
struct ListField(Regex);

impl ListField {
    fn new(name: &str) -> Self {
        Self(
            Regex::new(&format!(r#"(?is)"{name}"\s*:\s*\[(.*?)(?:\]|\z)"#))
                .expect("list field pattern is valid"),
        )
    }

    fn capture(&self, text: &str) -> Option<Vec<String>> {
        let caps = self.0.captures(text)?;
        Some(LIST_ITEM.captures_iter(&caps[1]).map(|c| unescape(&c[1])).collect())
    }
}

static CODE: LazyLock<StringField> = LazyLock::new(|| StringField::new("code"));
static FILE_PATH: LazyLock<StringField> = LazyLock::new(|| StringField::new("file_path"));
static TYPE: LazyLock<StringField> = LazyLock::new(|| StringField::new("type"));
static REASONING: LazyLock<StringField> = LazyLock::new(|| StringField::new("reasoning"));
static ANSWER: LazyLock<StringField> = LazyLock::new(|| StringField::new("answer"));
static RELEVANT_FILES: LazyLock<ListField> = LazyLock::new(|| ListField::new("relevant_files"));
static REFERENCES: LazyLock<ListField> = LazyLock::new(|| ListField::new("references"));

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#"(?s)"{STRING_BODY}""#)).expect("list item pattern is valid")
});

/// Decodes JSON string escapes in a captured fragment.
///
/// Tries an exact JSON decode first; otherwise decodes the common escapes
/// by hand and keeps unknown ones verbatim.
#[must_use]
pub fn unescape(fragment: &str) -> String {
    if let Ok(decoded) = serde_json::from_str::<String>(&format!("\"{fragment}\"")) {
        return decoded;
    }

    let chars: Vec<char> = fragment.chars().collect();
    let mut out = String::with_capacity(fragment.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c != '\\' || i + 1 == chars.len() {
            out.push(c);
            i += 1;
            continue;
        }
        let next = chars[i + 1];
        i += 2;
        match next {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'u' => match decode_unicode(&chars, i) {
                Some(decoded) => {
                    out.push(decoded);
                    i += 4;
                }
                None => out.push_str("\\u"),
            },
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

fn decode_unicode(chars: &[char], from: usize) -> Option<char> {
    let hex: String = chars.get(from..from + 4)?.iter().collect();
    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_single_task_from_unterminated_object() {
        let text = r#"{"code": "line1\nline2", "file_path": "a.txt", "operation": "Update""#;
        let Some(ResponseShape::SingleTask(task)) = recover(text, ShapeKind::SingleTask) else {
            panic!("expected recovered single task");
        };
        assert_eq!(task.code, "line1\nline2");
        assert_eq!(task.file_path, "a.txt");
        assert_eq!(task.operation, Operation::Update);
        assert_eq!(task.explanation, RECOVERED_EXPLANATION);
    }

    #[test]
    fn recovers_code_cut_off_mid_value() {
        let text = r#"{"file_path": "src/main.rs", "operation": "Delete", "code": "fn main() {\n    println!(\"hi"#;
        let Some(ResponseShape::SingleTask(task)) = recover(text, ShapeKind::SingleTask) else {
            panic!("expected recovered single task");
        };
        assert_eq!(task.code, "fn main() {\n    println!(\"hi");
        assert_eq!(task.file_path, "src/main.rs");
        assert_eq!(task.operation, Operation::Update);
    }

    #[test]
    fn keys_match_any_case() {
        let text = r#"{"Code": "x = 1", "FILE_PATH": "a.py""#;
        let Some(ResponseShape::SingleTask(task)) = recover(text, ShapeKind::SingleTask) else {
            panic!("expected recovered single task");
        };
        assert_eq!(task.code, "x = 1");
        assert_eq!(task.file_path, "a.py");
    }

    #[test]
    fn recovers_context_file_list() {
        let text = r#"{"reasoning": "models", "relevant_files": ["Models/Food.cs", "Data/Db.cs""#;
        let Some(ResponseShape::ContextRetrieval(ctx)) = recover(text, ShapeKind::ContextRetrieval)
        else {
            panic!("expected recovered context retrieval");
        };
        assert_eq!(ctx.relevant_files, vec!["Models/Food.cs", "Data/Db.cs"]);
        assert_eq!(ctx.reasoning, "models");
    }

    #[test]
    fn recovers_classification_and_answer() {
        let Some(ResponseShape::Classification(class)) =
            recover(r#"{"type": "General", "reasoning": "asks wh"#, ShapeKind::Classification)
        else {
            panic!("expected recovered classification");
        };
        assert_eq!(class.kind, PromptKind::General);
        assert_eq!(class.reasoning, "asks wh");

        let Some(ResponseShape::GeneralAnswer(answer)) =
            recover(r#"{"answer": "Use \"cargo test\"", "references": ["#, ShapeKind::GeneralAnswer)
        else {
            panic!("expected recovered answer");
        };
        assert_eq!(answer.answer, "Use \"cargo test\"");
        assert!(answer.references.is_empty());
    }

    #[test]
    fn task_list_is_never_salvaged() {
        let text = r#"{"tasks": [{"task_name": "a", "target_file": "b.cs""#;
        assert!(recover(text, ShapeKind::TaskList).is_none());
    }

    #[test]
    fn nothing_to_salvage() {
        for kind in ShapeKind::ALL {
            assert!(recover("plain prose, no fields", kind).is_none());
        }
    }

    #[test]
    fn field_patterns_compile() {
        for field in [&CODE, &FILE_PATH, &TYPE, &REASONING, &ANSWER] {
            assert!(field.capture(r#"{"x": 1}"#).is_none());
        }
        for list in [&RELEVANT_FILES, &REFERENCES] {
            assert!(list.capture(r#"{"x": 1}"#).is_none());
        }
        assert_eq!(REFERENCES.capture(r#""references": ["a.cs", "b\".cs"#), Some(vec!["a.cs".to_string()]));
    }

    #[test]
    fn unescape_handles_invalid_json_fragments() {
        assert_eq!(unescape(r"tab\there \d"), "tab\there \\d");
        assert_eq!(unescape(r"café \u12"), "café \\u12");
        assert_eq!(unescape("raw\nnewline \\\""), "raw\nnewline \"");
    }
}
