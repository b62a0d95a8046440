//! Test-only fakes for the generator port and task records.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::adapters::memory::{ManualClock, MemoryFileSystem};
use crate::context::ServiceContext;
use crate::ports::{CompletionRequest, CompletionResponse, LlmClient, LlmFuture};
use crate::shapes::{Operation, TaskRecord};

/// Generator that serves a fixed script of replies and records requests.
///
/// `Err` entries become transport failures. Running off the end of the
/// script is a transport failure too.
#[derive(Clone, Default)]
pub struct ScriptedLlm {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedLlm {
    /// Creates a generator that replies with `replies` in order.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<S, S>>,
        S: Into<String>,
    {
        let replies = replies.into_iter().map(|r| r.map(Into::into).map_err(Into::into)).collect();
        Self { replies: Arc::new(Mutex::new(replies)), requests: Arc::default() }
    }

    /// Creates a generator whose every scripted reply succeeds.
    pub fn ok<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(Ok::<S, S>))
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LlmClient for ScriptedLlm {
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front();
        Box::pin(async move {
            match reply {
                Some(Ok(text)) => {
                    Ok(CompletionResponse { text, prompt_tokens: 0, completion_tokens: 0 })
                }
                Some(Err(err)) => Err(err.into()),
                None => Err("script exhausted".into()),
            }
        })
    }
}

/// Context over a scripted generator, an in-memory store and a manual clock.
pub fn context(
    llm: &ScriptedLlm,
    fs: &MemoryFileSystem,
    clock: &ManualClock,
) -> ServiceContext {
    ServiceContext::new(Box::new(llm.clone()), Box::new(fs.clone()), Box::new(clock.clone()))
}

/// A task record with the given target and operation.
pub fn task(name: &str, target: &str, operation: Operation) -> TaskRecord {
    TaskRecord {
        task_name: name.to_string(),
        target_file: target.to_string(),
        operation,
        detailed_prompt: format!("{name} instructions"),
        dependencies: Vec::new(),
    }
}
