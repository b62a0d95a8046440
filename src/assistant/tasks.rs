//! Bounded-retry execution of planned file mutations.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::code::clean_code;
use super::paths::{normalize_target, ExtensionPolicy};
use super::prompts;
use super::retry::RetryController;
use crate::config::AssistantConfig;
use crate::context::ServiceContext;
use crate::error::TaskError;
use crate::ports::filesystem::check_write_target;
use crate::ports::WriteTargetError;
use crate::shapes::{Operation, SingleTask, TaskRecord};

/// Outcome of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    /// The file-store operation was applied.
    Succeeded {
        /// Operation performed.
        operation: Operation,
    },
    /// Every attempt failed, or the task was rejected outright.
    Failed {
        /// Error from the last attempt.
        reason: String,
    },
}

/// Per-task result reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    /// Name from the task record.
    pub task_name: String,
    /// Path the last attempt resolved to, if any.
    pub path: Option<String>,
    /// Attempts used; zero when the task was rejected before generation.
    pub attempts: u32,
    /// Outcome.
    pub status: TaskStatus,
}

impl TaskReport {
    /// Whether the task succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self.status, TaskStatus::Succeeded { .. })
    }
}

impl fmt::Display for TaskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.as_deref().unwrap_or("-");
        match &self.status {
            TaskStatus::Succeeded { operation } => write!(
                f,
                "ok      {operation} {path} ({} attempt{})",
                self.attempts,
                if self.attempts == 1 { "" } else { "s" }
            ),
            TaskStatus::Failed { reason } => {
                write!(f, "failed  {} {path}: {reason}", self.task_name)
            }
        }
    }
}

/// Executes task records in list order against the file-store.
///
/// Each task gets up to `max_attempts` attempts. Between attempts the
/// controller sleeps `attempt × base_delay` on the context clock. A task
/// with a blank target is rejected without contacting the generator or
/// the file-store. Failed tasks are reported and the batch continues.
pub struct TaskExecutionController<'a> {
    ctx: &'a ServiceContext,
    retry: RetryController<'a>,
    policy: &'a dyn ExtensionPolicy,
    max_attempts: u32,
    base_delay: Duration,
}

impl<'a> TaskExecutionController<'a> {
    /// Creates a controller over `ctx` using the attempt limits in `config`.
    #[must_use]
    pub fn new(
        ctx: &'a ServiceContext,
        config: &AssistantConfig,
        policy: &'a dyn ExtensionPolicy,
    ) -> Self {
        Self {
            ctx,
            retry: RetryController::new(ctx.llm.as_ref(), config),
            policy,
            max_attempts: config.task_max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Executes every task in order. `dependencies` are not consulted.
    pub async fn execute_all(&self, tasks: &[TaskRecord]) -> Vec<TaskReport> {
        let mut reports = Vec::with_capacity(tasks.len());
        for task in tasks {
            reports.push(self.execute(task).await);
        }
        reports
    }

    /// Executes one task with bounded retry.
    #[instrument(skip_all, fields(task = %task.task_name))]
    pub async fn execute(&self, task: &TaskRecord) -> TaskReport {
        if task.target_file.trim().is_empty() {
            warn!("task rejected: blank target");
            return TaskReport {
                task_name: task.task_name.clone(),
                path: None,
                attempts: 0,
                status: TaskStatus::Failed { reason: TaskError::BlankTarget.to_string() },
            };
        }

        let planned = normalize_target(&task.target_file, self.policy);
        let mut last_path = planned.as_ref().ok().cloned();
        let mut last_error = None;
        let mut used = 0;

        for attempt in 1..=self.max_attempts {
            used = attempt;
            let (path, result) = self.attempt(task, &planned, attempt).await;
            if path.is_some() {
                last_path = path;
            }
            match result {
                Ok(operation) => {
                    return TaskReport {
                        task_name: task.task_name.clone(),
                        path: last_path,
                        attempts: attempt,
                        status: TaskStatus::Succeeded { operation },
                    };
                }
                Err(err) => {
                    warn!(attempt, %err, "task attempt failed");
                    last_error = Some(err);
                }
            }
            if attempt < self.max_attempts {
                self.ctx.clock.sleep(self.base_delay * attempt).await;
            }
        }

        let reason = last_error.map_or_else(|| "no attempts made".to_string(), |e| e.to_string());
        TaskReport {
            task_name: task.task_name.clone(),
            path: last_path,
            attempts: used,
            status: TaskStatus::Failed { reason },
        }
    }

    /// One generate-then-apply attempt. Returns the resolved path, if the
    /// attempt got that far, alongside the outcome.
    async fn attempt(
        &self,
        task: &TaskRecord,
        planned: &Result<String, WriteTargetError>,
        attempt: u32,
    ) -> (Option<String>, Result<Operation, TaskError>) {
        let shown = planned.as_deref().unwrap_or(task.target_file.trim());
        let existing = planned.as_ref().ok().and_then(|path| self.ctx.fs.read(path));
        let prompt = prompts::single_task(task, shown, existing.as_deref(), attempt);
        let response: SingleTask = self.retry.request_as::<SingleTask>(&prompt).await.shape;

        let path = if response.file_path.trim().is_empty() {
            planned.clone()
        } else {
            normalize_target(&response.file_path, self.policy)
        };
        let path = match path.and_then(|p| check_write_target(&p).map(|()| p)) {
            Ok(path) => path,
            Err(err) => return (None, Err(err.into())),
        };

        let result = self.apply(response.operation, &path, &response.code);
        (Some(path), result)
    }

    fn apply(&self, operation: Operation, path: &str, code: &str) -> Result<Operation, TaskError> {
        let store_error = |source| TaskError::FileStore { path: path.to_string(), source };
        match operation {
            Operation::Delete => {
                self.ctx.fs.delete(path).map_err(store_error)?;
            }
            Operation::Create | Operation::Update => {
                if code.trim().is_empty() {
                    return Err(TaskError::MissingCode(path.to_string()));
                }
                self.ctx.fs.write(path, &clean_code(code)).map_err(store_error)?;
            }
        }
        info!(%operation, path, "task applied");
        Ok(operation)
    }
}
