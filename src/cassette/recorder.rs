//! Captures generator completions into a cassette file.

use std::path::PathBuf;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::format::{Cassette, Interaction, COMPLETE_METHOD, LLM_PORT};
use super::CassetteError;
use crate::ports::{CompletionRequest, CompletionResponse, PortError};

/// Accumulates completions and saves them as a YAML cassette.
///
/// Each completion becomes one `llm::complete` interaction. A success is
/// stored as `{"ok": <response>}` and a failure as `{"err": "<message>"}`,
/// the form the replaying client reads back.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    cassette: Cassette,
}

impl CassetteRecorder {
    /// Creates a recorder that will save to `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            cassette: Cassette {
                name: name.into(),
                recorded_at: Utc::now(),
                source: source.into(),
                interactions: Vec::new(),
            },
        }
    }

    /// Appends one completion and its outcome.
    ///
    /// A request or response that cannot be serialized is logged and
    /// skipped; recording never fails the completion it observes.
    pub fn record_completion(
        &mut self,
        request: &CompletionRequest,
        result: &Result<CompletionResponse, PortError>,
    ) {
        let output = match result {
            Ok(response) => serde_json::to_value(response).map(|ok| json!({ "ok": ok })),
            Err(err) => Ok(json!({ "err": err.to_string() })),
        };
        match (serde_json::to_value(request), output) {
            (Ok(input), Ok(output)) => self.push(input, output),
            (Err(err), _) | (_, Err(err)) => warn!(%err, "completion not recorded"),
        }
    }

    fn push(&mut self, input: Value, output: Value) {
        let seq = self.cassette.interactions.len() as u64;
        self.cassette.interactions.push(Interaction {
            seq,
            port: LLM_PORT.to_string(),
            method: COMPLETE_METHOD.to_string(),
            input,
            output,
        });
    }

    /// Stamps the recording time and saves the cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be encoded or written.
    pub fn finish(mut self) -> Result<PathBuf, CassetteError> {
        self.cassette.recorded_at = Utc::now();
        self.cassette.save(&self.path)?;
        info!(
            path = %self.path.display(),
            interactions = self.cassette.interactions.len(),
            "cassette saved"
        );
        Ok(self.path)
    }
}
