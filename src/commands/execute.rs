//! `patchwright execute` command.

use std::path::Path;

use tracing::warn;

use crate::assistant::{KeywordExtensionPolicy, TaskExecutionController, TaskReport};
use crate::config::AssistantConfig;
use crate::context::ServiceContext;
use crate::decode::decode_as;
use crate::shapes::TaskList;

/// Decode the task list in `plan` and execute it.
///
/// # Errors
///
/// Returns an error string if the plan file cannot be read or any task
/// fails.
pub async fn run(ctx: &ServiceContext, config: &AssistantConfig, plan: &Path) -> Result<(), String> {
    let raw = std::fs::read_to_string(plan)
        .map_err(|e| format!("Failed to read plan {}: {e}", plan.display()))?;
    let decoded = decode_as::<TaskList>(&raw);
    if !decoded.quality.is_structured() {
        warn!(quality = %decoded.quality, path = %plan.display(), "plan file decoded leniently");
    }
    let tasks = decoded.shape.tasks;
    if tasks.is_empty() {
        println!("plan has no tasks");
        return Ok(());
    }

    let policy = KeywordExtensionPolicy::new(config.extensions.clone());
    let reports = TaskExecutionController::new(ctx, config, &policy).execute_all(&tasks).await;
    for report in &reports {
        println!("{report}");
    }
    summarize(&reports)
}

fn summarize(reports: &[TaskReport]) -> Result<(), String> {
    let failed = reports.iter().filter(|r| !r.succeeded()).count();
    if failed == 0 {
        Ok(())
    } else {
        Err(format!("{failed} of {} task(s) failed", reports.len()))
    }
}
