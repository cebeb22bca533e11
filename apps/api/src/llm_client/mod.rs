/// LLM Client — the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Pipeline stages depend on the `TextGenerator` trait; `LlmClient` is the production backend.
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GenerationSettings;

pub mod prompts;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const MAX_BACKOFF_SHIFT: u32 = 5;
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Binary payload forwarded verbatim to the model (e.g. a PDF résumé).
#[derive(Debug, Clone)]
pub struct Attachment {
    pub media_type: String,
    pub data: Bytes,
}

/// One instruction (plus optional attachment) sent to the generation service.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub attachment: Option<Attachment>,
}

/// Anything that can turn an instruction into raw model text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        settings: &GenerationSettings,
        request: &GenerationRequest,
    ) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Document { source: DocumentSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct DocumentSource<'a> {
    #[serde(rename = "type")]
    source_type: &'a str,
    media_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// How many attempts a call gets and how long to wait between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): base, 2x, 4x, ... capped at `MAX_BACKOFF`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        self.base_delay.saturating_mul(1 << shift).min(MAX_BACKOFF)
    }
}

/// Outcome of one request against the API.
enum Attempt<T> {
    Done(Result<T, LlmError>),
    Retry(LlmError),
}

/// Runs `attempt_once` up to `policy.max_attempts` times, sleeping between retryable failures.
async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut attempt_once: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            warn!(
                "LLM call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        match attempt_once().await {
            Attempt::Done(result) => return result,
            Attempt::Retry(e) => last_error = Some(e),
        }
    }

    Err(last_error.unwrap_or(LlmError::RateLimited {
        retries: policy.max_attempts,
    }))
}

/// Wraps the Anthropic Messages API with bounded retry on rate limits and server errors.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(api_key: String, api_url: String, retry: RetryPolicy) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            api_url,
            retry: RetryPolicy {
                max_attempts: retry.max_attempts.max(1),
                ..retry
            },
        })
    }

    /// Makes a raw call to the Messages API, returning the full response object.
    /// Retries on 429 (rate limit), 5xx and transport errors with exponential backoff.
    pub async fn call(
        &self,
        settings: &GenerationSettings,
        request: &GenerationRequest,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = build_request(settings, request);
        let body = &request_body;

        retry_with_backoff(self.retry, || self.send_once(&settings.model, body)).await
    }

    async fn send_once(&self, model: &str, body: &AnthropicRequest<'_>) -> Attempt<LlmResponse> {
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return Attempt::Retry(LlmError::Http(e)),
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            return Attempt::Retry(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Attempt::Done(Err(LlmError::Api {
                status: status.as_u16(),
                message,
            }));
        }

        let result = response.json::<LlmResponse>().await.map_err(LlmError::from);
        if let Ok(llm_response) = &result {
            debug!(
                "LLM call succeeded: model={}, input_tokens={}, output_tokens={}",
                model, llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );
        }
        Attempt::Done(result)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(
        &self,
        settings: &GenerationSettings,
        request: &GenerationRequest,
    ) -> Result<String, LlmError> {
        let response = self.call(settings, request).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

fn build_request<'a>(
    settings: &'a GenerationSettings,
    request: &'a GenerationRequest,
) -> AnthropicRequest<'a> {
    let mut content = Vec::with_capacity(2);
    if let Some(attachment) = &request.attachment {
        content.push(ContentPart::Document {
            source: DocumentSource {
                source_type: "base64",
                media_type: &attachment.media_type,
                data: BASE64.encode(&attachment.data),
            },
        });
    }
    content.push(ContentPart::Text {
        text: &request.prompt,
    });

    AnthropicRequest {
        model: &settings.model,
        max_tokens: settings.max_output_tokens,
        temperature: settings.temperature,
        system: &request.system,
        messages: vec![AnthropicMessage {
            role: "user",
            content,
        }],
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
