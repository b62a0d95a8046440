//! Replaying adapter for the `LlmClient` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::cassette::format::{COMPLETE_METHOD, LLM_PORT};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{CompletionRequest, LlmClient, LlmFuture};

/// Serves recorded completions from a cassette.
///
/// An exhausted cassette surfaces as a failed completion, like any other
/// transport failure.
pub struct ReplayingLlmClient {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingLlmClient {
    /// Create a replaying client backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl LlmClient for ReplayingLlmClient {
    fn complete(&self, _request: &CompletionRequest) -> LlmFuture<'_> {
        let output = next_output(&self.replayer, LLM_PORT, COMPLETE_METHOD);
        Box::pin(async move { replay_result(output?) })
    }
}
