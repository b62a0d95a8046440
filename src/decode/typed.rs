//! Field-mapped decoding of a parsed JSON value into a response shape.
//!
//! Property names match case-insensitively, non-string scalars are
//! stringified, and enum-like fields fall back to a safe variant instead of
//! failing. Unknown fields are ignored.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::shapes::{
    Classification, ContextRetrieval, GeneralAnswer, Operation, PromptKind, ResponseShape,
    ShapeKind, SingleTask, TaskList, TaskRecord,
};

/// Why a parsed value could not be mapped onto the requested shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypedError {
    /// The root value is neither an object nor an accepted list.
    #[error("unexpected {0} at root")]
    UnexpectedRoot(&'static str),
    /// The object carries none of the shape's fields.
    #[error("object carries none of the shape's fields")]
    NoKnownFields,
}

/// Maps `value` onto the shape named by `kind`.
///
/// A bare array stands in for the list field of `TaskList`
/// (`tasks`) and `ContextRetrieval` (`relevant_files`).
///
/// # Errors
///
/// Returns [`TypedError`] when the root is not usable for `kind`.
pub fn decode_value(value: &Value, kind: ShapeKind) -> Result<ResponseShape, TypedError> {
    let obj = match value {
        Value::Object(obj) => obj,
        Value::Array(items) => return decode_bare_list(items, kind),
        other => return Err(TypedError::UnexpectedRoot(json_type(other))),
    };

    if !kind.field_names().iter().any(|name| field(obj, name).is_some()) {
        return Err(TypedError::NoKnownFields);
    }

    Ok(match kind {
        ShapeKind::Classification => ResponseShape::Classification(Classification {
            kind: PromptKind::parse_lenient(&text(obj, "type")),
            reasoning: text(obj, "reasoning"),
        }),
        ShapeKind::ContextRetrieval => ResponseShape::ContextRetrieval(ContextRetrieval {
            relevant_files: strings(obj, "relevant_files"),
            reasoning: text(obj, "reasoning"),
        }),
        ShapeKind::TaskList => ResponseShape::TaskList(TaskList {
            tasks: tasks(field(obj, "tasks")),
            summary: text(obj, "summary"),
        }),
        ShapeKind::SingleTask => ResponseShape::SingleTask(SingleTask {
            code: text(obj, "code"),
            file_path: text(obj, "file_path"),
            operation: Operation::parse_lenient(&text(obj, "operation")),
            explanation: text(obj, "explanation"),
        }),
        ShapeKind::GeneralAnswer => ResponseShape::GeneralAnswer(GeneralAnswer {
            answer: text(obj, "answer"),
            references: strings(obj, "references"),
        }),
    })
}

fn decode_bare_list(items: &[Value], kind: ShapeKind) -> Result<ResponseShape, TypedError> {
    match kind {
        ShapeKind::TaskList => Ok(ResponseShape::TaskList(TaskList {
            tasks: items.iter().filter_map(task_record).collect(),
            summary: String::new(),
        })),
        ShapeKind::ContextRetrieval => Ok(ResponseShape::ContextRetrieval(ContextRetrieval {
            relevant_files: items.iter().filter_map(scalar_text).collect(),
            reasoning: String::new(),
        })),
        _ => Err(TypedError::UnexpectedRoot("array")),
    }
}

fn tasks(value: Option<&Value>) -> Vec<TaskRecord> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(task_record).collect(),
        Some(Value::Object(_)) => value.and_then(task_record).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn task_record(value: &Value) -> Option<TaskRecord> {
    let obj = value.as_object()?;
    Some(TaskRecord {
        task_name: text(obj, "task_name"),
        target_file: text(obj, "target_file"),
        operation: Operation::parse_lenient(&text(obj, "operation")),
        detailed_prompt: text(obj, "detailed_prompt"),
        dependencies: strings(obj, "dependencies"),
    })
}

/// Looks up a property by case-insensitive name.
fn field<'a>(obj: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    obj.get(name)
        .or_else(|| obj.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, v)| v))
}

fn text(obj: &Map<String, Value>, name: &str) -> String {
    field(obj, name).and_then(scalar_text).unwrap_or_default()
}

fn strings(obj: &Map<String, Value>, name: &str) -> Vec<String> {
    match field(obj, name) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(single @ Value::String(_)) => scalar_text(single).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
