//! End-to-end handling of one user request.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::paths::{ExtensionPolicy, KeywordExtensionPolicy};
use super::prompts;
use super::retry::RetryController;
use super::tasks::{TaskExecutionController, TaskReport};
use crate::config::AssistantConfig;
use crate::context::ServiceContext;
use crate::shapes::{Classification, ContextRetrieval, GeneralAnswer, PromptKind, TaskList};

/// Result of handling a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The request was a question.
    Answer(GeneralAnswer),
    /// The request was a coding request; the plan was executed.
    Executed {
        /// Plan produced by the generator.
        plan: TaskList,
        /// One report per planned task, in plan order.
        reports: Vec<TaskReport>,
    },
}

impl Outcome {
    /// Whether every planned task succeeded. Answers always count as success.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        match self {
            Outcome::Answer(_) => true,
            Outcome::Executed { reports, .. } => reports.iter().all(TaskReport::succeeded),
        }
    }
}

/// Runs requests against a service context.
pub struct Assistant<'a> {
    ctx: &'a ServiceContext,
    config: &'a AssistantConfig,
    policy: Box<dyn ExtensionPolicy>,
}

impl<'a> Assistant<'a> {
    /// Creates an assistant using the keyword extension policy from `config`.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, config: &'a AssistantConfig) -> Self {
        let policy = KeywordExtensionPolicy::new(config.extensions.clone());
        Self::with_policy(ctx, config, Box::new(policy))
    }

    /// Creates an assistant with a custom extension policy.
    #[must_use]
    pub fn with_policy(
        ctx: &'a ServiceContext,
        config: &'a AssistantConfig,
        policy: Box<dyn ExtensionPolicy>,
    ) -> Self {
        Self { ctx, config, policy }
    }

    fn retry(&self) -> RetryController<'_> {
        RetryController::new(self.ctx.llm.as_ref(), self.config)
    }

    /// Classifies `request` and either answers it or plans and executes
    /// file changes.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
    pub async fn handle(&self, request: &str) -> Outcome {
        let started = self.ctx.clock.now();
        let outcome = self.dispatch(request).await;
        let elapsed = self.ctx.clock.now() - started;
        info!(
            elapsed_ms = elapsed.num_milliseconds(),
            succeeded = outcome.succeeded(),
            "request handled"
        );
        outcome
    }

    async fn dispatch(&self, request: &str) -> Outcome {
        let classification = self
            .retry()
            .request_as::<Classification>(&prompts::classification(request))
            .await;
        info!(kind = ?classification.shape.kind, quality = %classification.quality, "classified");

        match classification.shape.kind {
            PromptKind::General => Outcome::Answer(self.answer(request).await),
            PromptKind::Coding => {
                let plan = self.plan(request).await;
                let executor =
                    TaskExecutionController::new(self.ctx, self.config, self.policy.as_ref());
                let reports = executor.execute_all(&plan.tasks).await;
                Outcome::Executed { plan, reports }
            }
        }
    }

    /// Answers a general question, listing the workspace for reference.
    pub async fn answer(&self, request: &str) -> GeneralAnswer {
        let files = self.list_files();
        self.retry()
            .request_as::<GeneralAnswer>(&prompts::general_answer(request, &files))
            .await
            .shape
    }

    /// Picks relevant files, reads them and asks for a task plan.
    pub async fn plan(&self, request: &str) -> TaskList {
        let files = self.list_files();
        let retrieval = self
            .retry()
            .request_as::<ContextRetrieval>(&prompts::context_retrieval(request, &files))
            .await
            .shape;
        let context = self.read_context(&retrieval.relevant_files);
        debug!(files = context.len(), "context loaded");

        let plan = self
            .retry()
            .request_as::<TaskList>(&prompts::task_list(request, &context))
            .await;
        info!(tasks = plan.shape.tasks.len(), quality = %plan.quality, "planned");
        plan.shape
    }

    fn list_files(&self) -> Vec<String> {
        self.ctx.fs.list().unwrap_or_else(|err| {
            warn!(%err, "failed to list workspace");
            Vec::new()
        })
    }

    /// Reads up to `max_context_files` of `paths`, skipping unreadable ones.
    fn read_context(&self, paths: &[String]) -> Vec<(String, String)> {
        paths
            .iter()
            .filter_map(|path| match self.ctx.fs.read(path) {
                Some(contents) => Some((path.clone(), contents)),
                None => {
                    debug!(path = %path, "relevant file missing; skipped");
                    None
                }
            })
            .take(self.config.max_context_files)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{FsOp, ManualClock, MemoryFileSystem};
    use crate::test_support::{context, ScriptedLlm};
    use serde_json::json;

    fn classified(kind: &str) -> String {
        json!({"type": kind, "reasoning": "because"}).to_string()
    }

    #[tokio::test]
    async fn general_request_is_answered() {
        let llm = ScriptedLlm::ok([
            classified("General"),
            json!({"answer": "It is a web app.", "references": ["Program.cs"]}).to_string(),
        ]);
        let fs = MemoryFileSystem::with_files([("Program.cs", "")]);
        let clock = ManualClock::default();
        let ctx = context(&llm, &fs, &clock);
        let config = AssistantConfig::default();

        let outcome = Assistant::new(&ctx, &config).handle("What is this?").await;

        let Outcome::Answer(answer) = outcome else { panic!("expected an answer") };
        assert_eq!(answer.answer, "It is a web app.");
        assert!(llm.requests()[1].prompt.contains("- Program.cs"));
        assert!(fs.ops().is_empty());
    }

    #[tokio::test]
    async fn coding_request_reads_context_and_executes_plan() {
        let llm = ScriptedLlm::ok([
            classified("Coding"),
            json!({"relevant_files": ["Models/Food.cs", "Gone.cs"], "reasoning": "model"})
                .to_string(),
            json!({
                "tasks": [{
                    "task_name": "Add price",
                    "target_file": "Models/Food",
                    "operation": "Update",
                    "detailed_prompt": "Add a Price property",
                    "dependencies": []
                }],
                "summary": "one change"
            })
            .to_string(),
            json!({
                "code": "class Food { decimal Price; }",
                "file_path": "Models/Food.cs",
                "operation": "Update",
                "explanation": "added"
            })
            .to_string(),
        ]);
        let fs = MemoryFileSystem::with_files([("Models/Food.cs", "class Food {}")]);
        let clock = ManualClock::default();
        let ctx = context(&llm, &fs, &clock);
        let config = AssistantConfig::default();

        let outcome = Assistant::new(&ctx, &config).handle("Add a price to food").await;

        assert!(outcome.succeeded());
        let requests = llm.requests();
        assert!(requests[2].prompt.contains("--- Models/Food.cs ---\nclass Food {}"));
        assert!(!requests[2].prompt.contains("Gone.cs ---"));
        assert_eq!(
            fs.ops(),
            vec![FsOp::Write {
                path: "Models/Food.cs".into(),
                contents: "class Food { decimal Price; }".into()
            }]
        );
    }

    #[tokio::test]
    async fn context_is_bounded() {
        let llm = ScriptedLlm::ok([
            classified("Coding"),
            json!({"relevant_files": ["a.cs", "b.cs", "c.cs"], "reasoning": ""}).to_string(),
            json!({"tasks": [], "summary": "nothing"}).to_string(),
        ]);
        let fs = MemoryFileSystem::with_files([("a.cs", "A"), ("b.cs", "B"), ("c.cs", "C")]);
        let clock = ManualClock::default();
        let ctx = context(&llm, &fs, &clock);
        let config = AssistantConfig { max_context_files: 2, ..AssistantConfig::default() };

        let outcome = Assistant::new(&ctx, &config).handle("refactor").await;

        let Outcome::Executed { plan, reports } = outcome else { panic!("expected execution") };
        assert!(plan.tasks.is_empty());
        assert!(reports.is_empty());
        let prompt = &llm.requests()[2].prompt;
        assert!(prompt.contains("--- b.cs ---"));
        assert!(!prompt.contains("--- c.cs ---"));
    }

    #[tokio::test]
    async fn silent_generator_falls_back_to_defaults() {
        let llm = ScriptedLlm::default();
        let (fs, clock) = (MemoryFileSystem::new(), ManualClock::default());
        let ctx = context(&llm, &fs, &clock);
        let config = AssistantConfig::default();

        let outcome = Assistant::new(&ctx, &config).handle("anything").await;

        // The default classification is Coding, whose default plan is empty.
        let Outcome::Executed { plan, reports } = outcome else { panic!("expected execution") };
        assert!(plan.tasks.is_empty());
        assert!(reports.is_empty());
        assert!(fs.ops().is_empty());
    }
}
