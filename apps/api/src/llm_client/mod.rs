//! LLM Client: the single point of entry for all model calls.
//!
//! ARCHITECTURAL RULE: No other module may talk to the completion endpoint directly.
//! Screening, interviewing and recommendations all depend on `LanguageModel`.
//!
//! Speaks the OpenAI-compatible Chat Completions protocol, so the same client
//! drives a self-hosted vLLM server or a hosted provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmSettings;

pub mod prompts;

/// Total attempts per call, the first included.
const MAX_ATTEMPTS: u32 = 3;
/// Wait before the first retry; doubles for each one after.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// One prompt plus its sampling parameters.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: Option<&'a str>,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl<'a> CompletionRequest<'a> {
    pub fn new(prompt: &'a str, temperature: f32, max_tokens: u32) -> Self {
        Self {
            system: None,
            prompt,
            temperature,
            max_tokens,
        }
    }

    pub fn with_system(mut self, system: &'a str) -> Self {
        self.system = Some(system);
        self
    }
}

/// The text-completion seam. `LlmClient` is the production backend; tests
/// substitute a scripted model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
pub struct ReplyMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the text of the first choice, if it has any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

/// OpenAI returns `{"error":{"message":..}}`, vLLM returns `{"message":..}`.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiErrorBody>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint,
/// with retry on rate limits and server errors.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    retry_base_delay: Duration,
}

impl LlmClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: chat_completions_url(&settings.base_url),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            retry_base_delay: RETRY_BASE_DELAY,
        })
    }

    #[cfg(test)]
    fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes a raw chat-completion call, returning the full response object.
    /// Retries on 429 (rate limit), 5xx and transport errors with exponential
    /// backoff, up to three attempts; the last failure is returned as-is.
    pub async fn call(&self, request: CompletionRequest<'_>) -> Result<ChatResponse, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt,
        });

        let request_body = ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut attempt = 0;
        loop {
            let error = match self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await
            {
                Err(e) => LlmError::Http(e),
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let chat_response: ChatResponse = response.json().await?;
                        if let Some(usage) = &chat_response.usage {
                            debug!(
                                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                                usage.prompt_tokens, usage.completion_tokens
                            );
                        }
                        return Ok(chat_response);
                    }

                    let body = response.text().await.unwrap_or_default();
                    let error = LlmError::Api {
                        status: status.as_u16(),
                        message: api_error_message(body),
                    };
                    if !is_retryable(status) {
                        return Err(error);
                    }
                    warn!("LLM API returned {status}: {error}");
                    error
                }
            };

            attempt += 1;
            if attempt >= MAX_ATTEMPTS {
                return Err(error);
            }
            let delay = backoff_delay(self.retry_base_delay, attempt);
            warn!(
                "LLM call attempt {attempt} failed ({error}), retrying after {}ms...",
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Wait before retry number `retry` (1-based): `base`, then `2 * base`, ...
fn backoff_delay(base: Duration, retry: u32) -> Duration {
    base * (1 << retry.saturating_sub(1))
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        let response = self.call(request).await?;
        response
            .text()
            .map(|t| t.trim().to_string())
            .ok_or(LlmError::EmptyContent)
    }
}

fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn api_error_message(body: String) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(&body) {
        Ok(ApiErrorEnvelope {
            error: Some(err), ..
        }) => err.message,
        Ok(ApiErrorEnvelope {
            message: Some(message),
            ..
        }) => message,
        _ => body,
    }
}

/// Deserializes a JSON object out of free-form model output.
///
/// Code fences are stripped, then the slice between the first `{` and the
/// last `}` is parsed. Output without braces is parsed as-is.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let text = strip_json_fences(text);
    let candidate = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    };
    serde_json::from_str(candidate).map_err(LlmError::Parse)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
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
