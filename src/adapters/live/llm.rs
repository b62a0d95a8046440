//! Live adapter for the `LlmClient` port using the Anthropic messages API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AssistantConfig;
use crate::ports::llm::{CompletionRequest, CompletionResponse, FormatHint, LlmClient, LlmFuture};
use crate::ports::PortError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Assistant-turn prefix that commits the model to a JSON object.
const JSON_PREFILL: &str = "{";

/// Live LLM client that calls the Anthropic Claude API.
pub struct LiveLlmClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl LiveLlmClient {
    /// Creates a client using the endpoint, key and timeout from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AssistantConfig) -> Result<Self, PortError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

/// Request body sent to the Anthropic messages API.
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
}

/// A single message in the Anthropic API request.
#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Top-level response from the Anthropic messages API.
#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

/// A content block in the Anthropic response.
#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Token usage reported by the Anthropic API.
#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Error response from the Anthropic API.
#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

/// Detail inside an Anthropic error response.
#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

/// Builds the message list, prefilling the assistant turn for JSON output.
fn messages(request: &CompletionRequest) -> Vec<AnthropicMessage<'_>> {
    let mut messages = vec![AnthropicMessage { role: "user", content: &request.prompt }];
    if request.format == Some(FormatHint::Json) {
        messages.push(AnthropicMessage { role: "assistant", content: JSON_PREFILL });
    }
    messages
}

/// Reattaches the prefill, which the API does not echo back.
fn completed_text(request: &CompletionRequest, generated: String) -> String {
    if request.format == Some(FormatHint::Json) {
        format!("{JSON_PREFILL}{generated}")
    } else {
        generated
    }
}

impl LlmClient for LiveLlmClient {
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let api_key = self
                .api_key
                .as_deref()
                .ok_or_else(|| PortError::from("ANTHROPIC_API_KEY is not set"))?;

            let body = AnthropicRequest {
                model: &request.model,
                max_tokens: request.max_tokens,
                messages: messages(&request),
            };

            debug!(model = %request.model, format = ?request.format, "sending completion");
            let response = self
                .client
                .post(&self.api_url)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
                .send()
                .await
                .map_err(|e| -> PortError { format!("Anthropic API request failed: {e}").into() })?;

            let status = response.status();
            let response_text = response.text().await.map_err(|e| -> PortError {
                format!("Failed to read Anthropic API response: {e}").into()
            })?;

            if !status.is_success() {
                let msg = serde_json::from_str::<AnthropicError>(&response_text)
                    .map(|e| e.error.message)
                    .unwrap_or(response_text);
                return Err(format!("Anthropic API error ({}): {msg}", status.as_u16()).into());
            }

            let api_response: AnthropicResponse =
                serde_json::from_str(&response_text).map_err(|e| -> PortError {
                    format!("Failed to parse Anthropic API response: {e}").into()
                })?;

            let text = api_response.content.into_iter().map(|block| block.text).collect::<String>();

            Ok(CompletionResponse {
                text: completed_text(&request, text),
                prompt_tokens: api_response.usage.input_tokens,
                completion_tokens: api_response.usage.output_tokens,
            })
        })
    }
}
