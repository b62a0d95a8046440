//! `patchwright ask` command.

use std::fmt::Write as _;

use crate::assistant::{Assistant, Outcome};
use crate::config::AssistantConfig;
use crate::context::ServiceContext;

/// Handle `request` and print the answer or the per-task reports.
///
/// # Errors
///
/// Returns an error string naming the failed tasks when any planned task
/// could not be applied.
pub async fn run(ctx: &ServiceContext, config: &AssistantConfig, request: &str) -> Result<(), String> {
    let outcome = Assistant::new(ctx, config).handle(request).await;
    print!("{}", render(&outcome));
    failures(&outcome)
}

/// Human-readable rendering of an outcome.
#[must_use]
pub fn render(outcome: &Outcome) -> String {
    let mut out = String::new();
    match outcome {
        Outcome::Answer(answer) => {
            out.push_str(&answer.answer);
            out.push('\n');
            if !answer.references.is_empty() {
                out.push_str("\nReferences:\n");
                for reference in &answer.references {
                    let _ = writeln!(out, "- {reference}");
                }
            }
        }
        Outcome::Executed { plan, reports } => {
            let _ = writeln!(out, "{}", plan.summary);
            for report in reports {
                let _ = writeln!(out, "{report}");
            }
        }
    }
    out
}

fn failures(outcome: &Outcome) -> Result<(), String> {
    let Outcome::Executed { reports, .. } = outcome else {
        return Ok(());
    };
    let failed: Vec<&str> =
        reports.iter().filter(|r| !r.succeeded()).map(|r| r.task_name.as_str()).collect();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("{} task(s) failed: {}", failed.len(), failed.join(", ")))
    }
}
