//! Safe placeholder values, one per shape.
//!
//! Each record's `Default` is its placeholder. Every text field a caller
//! might display is non-empty and collections are empty. The default single
//! task has no code and no path, so executing it fails the task rather than
//! writing anything.

use crate::shapes::{
    Classification, ContextRetrieval, GeneralAnswer, Operation, PromptKind, ResponseShape,
    ShapeKind, SingleTask, TaskList,
};

/// Explanation carried by the default single task.
pub const NO_RESPONSE_EXPLANATION: &str = "No usable response was produced.";

impl Default for Classification {
    fn default() -> Self {
        Classification {
            kind: PromptKind::Coding,
            reasoning: "Unable to classify the request; defaulting to coding.".into(),
        }
    }
}

impl Default for ContextRetrieval {
    fn default() -> Self {
        ContextRetrieval {
            relevant_files: Vec::new(),
            reasoning: "No relevant files could be determined.".into(),
        }
    }
}

impl Default for TaskList {
    fn default() -> Self {
        TaskList {
            tasks: Vec::new(),
            summary: "No tasks could be planned from the response.".into(),
        }
    }
}

impl Default for SingleTask {
    fn default() -> Self {
        SingleTask {
            code: String::new(),
            file_path: String::new(),
            operation: Operation::Update,
            explanation: NO_RESPONSE_EXPLANATION.into(),
        }
    }
}

impl Default for GeneralAnswer {
    fn default() -> Self {
        GeneralAnswer {
            answer: "I could not produce an answer for this request.".into(),
            references: Vec::new(),
        }
    }
}

/// Builds the default value for `kind`.
#[must_use]
pub fn default_response(kind: ShapeKind) -> ResponseShape {
    match kind {
        ShapeKind::Classification => ResponseShape::Classification(Classification::default()),
        ShapeKind::ContextRetrieval => {
            ResponseShape::ContextRetrieval(ContextRetrieval::default())
        }
        ShapeKind::TaskList => ResponseShape::TaskList(TaskList::default()),
        ShapeKind::SingleTask => ResponseShape::SingleTask(SingleTask::default()),
        ShapeKind::GeneralAnswer => ResponseShape::GeneralAnswer(GeneralAnswer::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_requested_kind() {
        for kind in ShapeKind::ALL {
            assert_eq!(default_response(kind).kind(), kind);
        }
    }

    #[test]
    fn displayable_text_is_never_empty() {
        for kind in ShapeKind::ALL {
            match default_response(kind) {
                ResponseShape::Classification(c) => {
                    assert_eq!(c.kind, PromptKind::Coding);
                    assert!(!c.reasoning.is_empty());
                }
                ResponseShape::ContextRetrieval(c) => {
                    assert!(c.relevant_files.is_empty());
                    assert!(!c.reasoning.is_empty());
                }
                ResponseShape::TaskList(t) => {
                    assert!(t.tasks.is_empty());
                    assert!(!t.summary.is_empty());
                }
                ResponseShape::SingleTask(t) => {
                    assert!(t.code.is_empty());
                    assert!(t.file_path.is_empty());
                    assert_eq!(t.operation, Operation::Update);
                    assert!(!t.explanation.is_empty());
                }
                ResponseShape::GeneralAnswer(a) => assert!(!a.answer.is_empty()),
            }
        }
    }
}
