//! Response shapes the generator is asked to produce.
//!
//! Every decode call targets exactly one [`ShapeKind`] and always yields a
//! [`ResponseShape`] of that kind. Absent data is represented by empty
//! collections or placeholder strings, never by an error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies which response shape a decode call expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Decide whether a request needs code changes.
    Classification,
    /// Pick workspace files relevant to a request.
    ContextRetrieval,
    /// Plan a list of file mutations.
    TaskList,
    /// Produce the code for one file mutation.
    SingleTask,
    /// Answer a question without touching files.
    GeneralAnswer,
}

impl ShapeKind {
    /// All shapes, in declaration order.
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Classification,
        ShapeKind::ContextRetrieval,
        ShapeKind::TaskList,
        ShapeKind::SingleTask,
        ShapeKind::GeneralAnswer,
    ];

    /// Wire field names carried by this shape.
    #[must_use]
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            ShapeKind::Classification => &["type", "reasoning"],
            ShapeKind::ContextRetrieval => &["relevant_files", "reasoning"],
            ShapeKind::TaskList => &["tasks", "summary"],
            ShapeKind::SingleTask => &["code", "file_path", "operation", "explanation"],
            ShapeKind::GeneralAnswer => &["answer", "references"],
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Classification => "classification",
            ShapeKind::ContextRetrieval => "context_retrieval",
            ShapeKind::TaskList => "task_list",
            ShapeKind::SingleTask => "single_task",
            ShapeKind::GeneralAnswer => "general_answer",
        };
        f.write_str(name)
    }
}

/// Kind of request, as classified by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PromptKind {
    /// The request asks for file changes.
    #[default]
    Coding,
    /// The request is a question answered in prose.
    General,
}

impl PromptKind {
    /// Parses a kind case-insensitively, defaulting to [`PromptKind::Coding`].
    #[must_use]
    pub fn parse_lenient(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case("general") {
            PromptKind::General
        } else {
            PromptKind::Coding
        }
    }
}

/// File mutation requested for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operation {
    /// Write a new file.
    Create,
    /// Overwrite an existing file.
    #[default]
    Update,
    /// Remove a file.
    Delete,
}

impl Operation {
    /// Parses an operation case-insensitively.
    ///
    /// Unrecognized text maps to [`Operation::Update`] so a garbled field
    /// never fails the whole decode.
    #[must_use]
    pub fn parse_lenient(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case("create") {
            Operation::Create
        } else if text.eq_ignore_ascii_case("delete") {
            Operation::Delete
        } else {
            Operation::Update
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "Create",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
        };
        f.write_str(name)
    }
}

/// A single planned file mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Short human-readable task name.
    pub task_name: String,
    /// Relative path of the file to mutate; may lack an extension.
    pub target_file: String,
    /// Mutation to perform.
    pub operation: Operation,
    /// Instruction handed to the generator when producing the code.
    pub detailed_prompt: String,
    /// Names of tasks this one depends on. Recorded, not scheduled on.
    pub dependencies: Vec<String>,
}

/// Classification of a user request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// The request kind.
    #[serde(rename = "type")]
    pub kind: PromptKind,
    /// Why the generator chose this kind.
    pub reasoning: String,
}

/// Files the generator considers relevant to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRetrieval {
    /// Relative paths, in the generator's order.
    pub relevant_files: Vec<String>,
    /// Why these files were chosen.
    pub reasoning: String,
}

/// Planned list of file mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    /// Tasks, executed in list order.
    pub tasks: Vec<TaskRecord>,
    /// Summary of the plan.
    pub summary: String,
}

/// Code for a single file mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleTask {
    /// Full file contents to write.
    pub code: String,
    /// Path the generator wants to write, possibly blank.
    pub file_path: String,
    /// Mutation to perform.
    pub operation: Operation,
    /// Explanation of the change.
    pub explanation: String,
}

/// Prose answer to a general question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralAnswer {
    /// The answer text.
    pub answer: String,
    /// Files referenced by the answer.
    pub references: Vec<String>,
}

/// One decoded generator response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ResponseShape {
    /// See [`Classification`].
    Classification(Classification),
    /// See [`ContextRetrieval`].
    ContextRetrieval(ContextRetrieval),
    /// See [`TaskList`].
    TaskList(TaskList),
    /// See [`SingleTask`].
    SingleTask(SingleTask),
    /// See [`GeneralAnswer`].
    GeneralAnswer(GeneralAnswer),
}

impl ResponseShape {
    /// The kind of this response.
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            ResponseShape::Classification(_) => ShapeKind::Classification,
            ResponseShape::ContextRetrieval(_) => ShapeKind::ContextRetrieval,
            ResponseShape::TaskList(_) => ShapeKind::TaskList,
            ResponseShape::SingleTask(_) => ShapeKind::SingleTask,
            ResponseShape::GeneralAnswer(_) => ShapeKind::GeneralAnswer,
        }
    }
}

/// A concrete shape that can be pulled out of a [`ResponseShape`].
///
/// Callers that know statically which shape they asked for use this to get
/// the typed record without matching on the sum type themselves. `Default`
/// is the shape's safe placeholder.
pub trait Shape: Sized + Default {
    /// The kind requested from the decoder.
    const KIND: ShapeKind;

    /// Extracts this shape, or `None` when the response is another variant.
    fn from_response(response: ResponseShape) -> Option<Self>;
}

macro_rules! impl_shape {
    ($ty:ident) => {
        impl Shape for $ty {
            const KIND: ShapeKind = ShapeKind::$ty;

            fn from_response(response: ResponseShape) -> Option<Self> {
                match response {
                    ResponseShape::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_shape!(Classification);
impl_shape!(ContextRetrieval);
impl_shape!(TaskList);
impl_shape!(SingleTask);
impl_shape!(GeneralAnswer);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_parses_any_case() {
        for text in ["Create", "create", "CREATE", "  create "] {
            assert_eq!(Operation::parse_lenient(text), Operation::Create);
        }
        assert_eq!(Operation::parse_lenient("DeLeTe"), Operation::Delete);
        assert_eq!(Operation::parse_lenient("update"), Operation::Update);
    }

    #[test]
    fn unknown_operation_defaults_to_update() {
        for text in ["", "modify", "crate", "Create!", "\u{0}"] {
            assert_eq!(Operation::parse_lenient(text), Operation::Update);
        }
    }

    #[test]
    fn prompt_kind_defaults_to_coding() {
        assert_eq!(PromptKind::parse_lenient("GENERAL"), PromptKind::General);
        assert_eq!(PromptKind::parse_lenient("coding"), PromptKind::Coding);
        assert_eq!(PromptKind::parse_lenient("chit-chat"), PromptKind::Coding);
    }

    #[test]
    fn shape_extraction_matches_variant() {
        let response = ResponseShape::GeneralAnswer(GeneralAnswer {
            answer: "42".into(),
            references: vec![],
        });
        assert_eq!(response.kind(), ShapeKind::GeneralAnswer);
        assert!(SingleTask::from_response(response.clone()).is_none());
        let answer = GeneralAnswer::from_response(response).expect("general answer");
        assert_eq!(answer.answer, "42");
    }

    #[test]
    fn classification_serializes_kind_as_type() {
        let value = serde_json::to_value(Classification {
            kind: PromptKind::General,
            reasoning: "question".into(),
        })
        .unwrap();
        assert_eq!(value["type"], "General");
    }
}
