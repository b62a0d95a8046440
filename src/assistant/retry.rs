//! Two-attempt request/decode loop.

use tracing::{debug, instrument, warn};

use super::prompts;
use crate::config::AssistantConfig;
use crate::decode::{decode, fallback, DecodeQuality, Decoded};
use crate::ports::{CompletionRequest, FormatHint, LlmClient};
use crate::shapes::{Shape, ShapeKind};

/// Format hints for each attempt, in order.
pub const ATTEMPT_FORMATS: [Option<FormatHint>; 2] = [None, Some(FormatHint::Json)];

/// Requests a shape from the generator with one structured-output retry.
///
/// The first attempt carries no format hint, the second asks for JSON. The
/// loop stops at the first structured or repaired decode. Otherwise the
/// best degraded value is returned: recovered beats defaulted, and a tie
/// goes to the later attempt. Transport failures count as failed attempts.
/// Never returns an error.
pub struct RetryController<'a> {
    llm: &'a dyn LlmClient,
    model: String,
    max_tokens: u32,
}

impl<'a> RetryController<'a> {
    /// Creates a controller sending requests through `llm`.
    #[must_use]
    pub fn new(llm: &'a dyn LlmClient, config: &AssistantConfig) -> Self {
        Self { llm, model: config.model.clone(), max_tokens: config.max_tokens }
    }

    /// Requests `kind` for `prompt`, appending the formatting reminder.
    #[instrument(skip_all, fields(%kind))]
    pub async fn request(&self, prompt: &str, kind: ShapeKind) -> Decoded {
        let prompt = prompts::with_format_reminder(prompt, kind);
        let mut best: Option<Decoded> = None;

        for (index, format) in ATTEMPT_FORMATS.into_iter().enumerate() {
            let attempt = index + 1;
            let request = CompletionRequest {
                model: self.model.clone(),
                prompt: prompt.clone(),
                max_tokens: self.max_tokens,
                format,
            };
            let response = match self.llm.complete(&request).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(attempt, %err, "completion failed");
                    continue;
                }
            };
            debug!(
                attempt,
                prompt_tokens = response.prompt_tokens,
                completion_tokens = response.completion_tokens,
                "completion received"
            );

            let decoded = decode(&response.text, kind);
            if decoded.quality.is_structured() {
                return decoded;
            }
            warn!(attempt, quality = %decoded.quality, "degraded decode");
            best = match best {
                Some(previous) if previous.quality < decoded.quality => Some(previous),
                _ => Some(decoded),
            };
        }

        best.unwrap_or_else(|| {
            warn!("no completion succeeded; using default");
            Decoded { shape: fallback::default_response(kind), quality: DecodeQuality::Defaulted }
        })
    }

    /// Requests the statically known shape `T`.
    pub async fn request_as<T: Shape>(&self, prompt: &str) -> Decoded<T> {
        self.request(prompt, T::KIND).await.into_shape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::recovery::RECOVERED_EXPLANATION;
    use crate::shapes::{Classification, PromptKind, SingleTask};
    use crate::test_support::ScriptedLlm;

    fn controller(llm: &ScriptedLlm) -> RetryController<'_> {
        RetryController::new(llm, &AssistantConfig::default())
    }

    const CLASSIFIED: &str = r#"{"type": "General", "reasoning": "a question"}"#;

    #[tokio::test]
    async fn structured_first_attempt_stops() {
        let llm = ScriptedLlm::ok([CLASSIFIED]);
        let decoded = controller(&llm).request_as::<Classification>("what is x?").await;

        assert_eq!(decoded.quality, DecodeQuality::Structured);
        assert_eq!(decoded.shape.kind, PromptKind::General);
        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].format, None);
        assert!(requests[0].prompt.contains("\"reasoning\""));
    }

    #[tokio::test]
    async fn degraded_first_attempt_retries_with_json_hint() {
        let llm = ScriptedLlm::ok(["I think it's a question.", CLASSIFIED]);
        let decoded = controller(&llm).request_as::<Classification>("what is x?").await;

        assert_eq!(decoded.quality, DecodeQuality::Structured);
        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].format, Some(FormatHint::Json));
    }

    #[tokio::test]
    async fn transport_failure_counts_as_attempt() {
        let llm = ScriptedLlm::new([Err("timeout"), Ok(CLASSIFIED)]);
        let decoded = controller(&llm).request_as::<Classification>("q").await;
        assert_eq!(decoded.quality, DecodeQuality::Structured);
        assert_eq!(llm.requests().len(), 2);
    }

    #[tokio::test]
    async fn recovered_beats_later_default() {
        let truncated = r#"{"code": "x = 1", "file_path": "a.py""#;
        let llm = ScriptedLlm::ok([truncated, "no json at all"]);
        let decoded = controller(&llm).request_as::<SingleTask>("write a.py").await;

        assert_eq!(decoded.quality, DecodeQuality::Recovered);
        assert_eq!(decoded.shape.code, "x = 1");
        assert_eq!(decoded.shape.explanation, RECOVERED_EXPLANATION);
    }

    #[tokio::test]
    async fn later_recovery_wins_a_tie() {
        let first = r#"{"code": "first", "file_path": "a.py""#;
        let second = r#"{"code": "second", "file_path": "a.py""#;
        let llm = ScriptedLlm::ok([first, second]);
        let decoded = controller(&llm).request_as::<SingleTask>("write a.py").await;
        assert_eq!(decoded.shape.code, "second");
    }

    #[tokio::test]
    async fn all_failures_yield_default() {
        let llm = ScriptedLlm::new([Err("down"), Err("still down")]);
        let decoded = controller(&llm).request(&"q".repeat(3), ShapeKind::GeneralAnswer).await;
        assert_eq!(decoded.quality, DecodeQuality::Defaulted);
        assert_eq!(decoded.shape.kind(), ShapeKind::GeneralAnswer);
    }
}
