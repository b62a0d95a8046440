//! Prompt text for each step of a session.

use std::fmt::Write as _;

use crate::shapes::{ShapeKind, TaskRecord};

/// JSON skeleton the generator is asked to fill in for `kind`.
#[must_use]
pub fn json_skeleton(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Classification => r#"{"type": "Coding" or "General", "reasoning": "..."}"#,
        ShapeKind::ContextRetrieval => {
            r#"{"relevant_files": ["relative/path.ext", ...], "reasoning": "..."}"#
        }
        ShapeKind::TaskList => {
            r#"{"tasks": [{"task_name": "...", "target_file": "relative/path.ext", "operation": "Create" or "Update" or "Delete", "detailed_prompt": "...", "dependencies": ["task_name", ...]}], "summary": "..."}"#
        }
        ShapeKind::SingleTask => {
            r#"{"code": "complete file contents", "file_path": "relative/path.ext", "operation": "Create" or "Update" or "Delete", "explanation": "..."}"#
        }
        ShapeKind::GeneralAnswer => r#"{"answer": "...", "references": ["relative/path.ext", ...]}"#,
    }
}

/// Appends the strict formatting reminder for `kind` to `prompt`.
#[must_use]
pub fn with_format_reminder(prompt: &str, kind: ShapeKind) -> String {
    format!(
        "{prompt}\n\n\
         IMPORTANT: Respond with a single JSON object and nothing else.\n\
         - No markdown code fences and no text before or after the JSON.\n\
         - Escape newlines as \\n, tabs as \\t and double quotes as \\\" inside strings.\n\
         - Use exactly this structure:\n{}\n",
        json_skeleton(kind)
    )
}

/// Asks whether `request` needs file changes.
#[must_use]
pub fn classification(request: &str) -> String {
    format!(
        "Classify the following request.\n\
         Use \"Coding\" if it asks to create, change or delete files in the project, \
         and \"General\" if it is a question that can be answered in prose.\n\n\
         Request:\n{request}"
    )
}

/// Asks for a prose answer to `request`.
#[must_use]
pub fn general_answer(request: &str, files: &[String]) -> String {
    let mut prompt = format!("Answer the following question about the project.\n\nQuestion:\n{request}\n");
    if !files.is_empty() {
        prompt.push_str("\nProject files:\n");
        push_list(&mut prompt, files);
    }
    prompt
}

/// Asks which of `files` are relevant to `request`.
#[must_use]
pub fn context_retrieval(request: &str, files: &[String]) -> String {
    let mut prompt = format!(
        "Select the project files needed to carry out the request below. \
         Only choose paths from the list.\n\nRequest:\n{request}\n\nProject files:\n"
    );
    if files.is_empty() {
        prompt.push_str("(the project is empty)\n");
    }
    push_list(&mut prompt, files);
    prompt
}

/// Asks for a task plan given the contents of the relevant files.
#[must_use]
pub fn task_list(request: &str, context: &[(String, String)]) -> String {
    let mut prompt = format!(
        "Plan the file changes needed to carry out the request below. \
         Each task changes exactly one file. Give every target_file a path \
         relative to the project root, including its extension.\n\nRequest:\n{request}\n"
    );
    for (path, contents) in context {
        let _ = write!(prompt, "\n--- {path} ---\n{contents}\n");
    }
    prompt
}

/// Asks for the full code of one task's target file.
///
/// Attempts after the first carry a reminder that the previous response
/// was unusable.
#[must_use]
pub fn single_task(task: &TaskRecord, target: &str, existing: Option<&str>, attempt: u32) -> String {
    let mut prompt = format!(
        "Carry out this task.\n\nTask: {}\nTarget file: {target}\nOperation: {}\n\nInstructions:\n{}\n",
        task.task_name, task.operation, task.detailed_prompt
    );
    match existing {
        Some(contents) => {
            let _ = write!(prompt, "\nCurrent contents of {target}:\n{contents}\n");
        }
        None => prompt.push_str("\nThe target file does not exist yet.\n"),
    }
    prompt.push_str("\nReturn the complete file contents in \"code\", not a diff or excerpt.\n");
    if attempt >= 2 {
        let _ = write!(
            prompt,
            "\nThis is retry attempt {attempt}: the previous response could not be used. \
             Ensure the response is complete, includes the full code, and names a file path \
             with an extension.\n"
        );
    }
    prompt
}

fn push_list(prompt: &mut String, items: &[String]) {
    for item in items {
        let _ = writeln!(prompt, "- {item}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Operation;

    #[test]
    fn reminder_carries_skeleton() {
        let prompt = with_format_reminder("Do it.", ShapeKind::SingleTask);
        assert!(prompt.starts_with("Do it."));
        assert!(prompt.contains("\"file_path\""));
        assert!(prompt.contains("No markdown code fences"));
    }

    #[test]
    fn every_skeleton_names_its_fields() {
        for kind in ShapeKind::ALL {
            let skeleton = json_skeleton(kind);
            for field in kind.field_names() {
                assert!(skeleton.contains(&format!("\"{field}\"")), "{kind} lacks {field}");
            }
        }
    }

    #[test]
    fn retry_clause_only_after_first_attempt() {
        let task = TaskRecord {
            task_name: "model".into(),
            target_file: "Models/Food".into(),
            operation: Operation::Create,
            detailed_prompt: "Add a Food model.".into(),
            dependencies: vec![],
        };
        let first = single_task(&task, "Models/Food.cs", None, 1);
        let second = single_task(&task, "Models/Food.cs", Some("class Food {}"), 2);
        assert!(!first.contains("retry attempt"));
        assert!(first.contains("does not exist yet"));
        assert!(second.contains("retry attempt 2"));
        assert!(second.contains("class Food {}"));
        assert!(second.contains("Operation: Create"));
    }

    #[test]
    fn context_prompt_lists_files() {
        let prompt = context_retrieval("add a model", &["a.cs".into(), "b.cs".into()]);
        assert!(prompt.contains("- a.cs\n- b.cs\n"));
        assert!(context_retrieval("x", &[]).contains("the project is empty"));
    }
}
