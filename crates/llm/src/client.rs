//! OpenAI-compatible chat client with bounded retry.
//!
//! Works with any endpoint exposing `/v1/chat/completions` (OpenAI,
//! vLLM, Ollama, OpenRouter). Retriable failures (rate limit, timeout,
//! network, 5xx) are retried with exponential backoff; everything else
//! surfaces immediately.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use kurort_core::{ChatMessage, LlmClient, LlmError, Role};

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Chat client for an OpenAI-compatible endpoint.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    max_attempts: u32,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
            max_attempts: MAX_ATTEMPTS,
        })
    }

    async fn complete_once(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": to_api_messages(messages),
            "temperature": temperature,
            "max_tokens": max_tokens,
            "stream": false,
        });

        debug!(model = %self.model, temperature, max_tokens, "sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(e.to_string())
                } else {
                    LlmError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(LlmError::RateLimited { retry_after_secs: 5 });
        }
        if status == 401 || status == 403 {
            return Err(LlmError::AuthenticationFailed(
                "invalid API key or insufficient permissions".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "LLM endpoint returned error");
            return Err(LlmError::ApiError { status_code: status, message: error_body });
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| LlmError::ApiError {
            status_code: 200,
            message: format!("failed to parse response: {e}"),
        })?;

        let choice = api_response.choices.into_iter().next().ok_or(LlmError::ApiError {
            status_code: 200,
            message: "no choices in response".into(),
        })?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

fn to_api_messages(messages: &[ChatMessage]) -> Vec<ApiMessage> {
    messages
        .iter()
        .map(|m| ApiMessage {
            role: match m.role {
                Role::System => "system".into(),
                Role::User => "user".into(),
                Role::Assistant => "assistant".into(),
            },
            content: Some(m.content.clone()),
        })
        .collect()
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let mut backoff = std::time::Duration::from_millis(INITIAL_BACKOFF_MS);

        for attempt in 1..=self.max_attempts {
            match self.complete_once(messages, temperature, max_tokens).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retriable() && attempt < self.max_attempts => {
                    let delay = match &e {
                        LlmError::RateLimited { retry_after_secs } => {
                            std::time::Duration::from_secs(*retry_after_secs)
                        }
                        _ => backoff,
                    };
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "completion failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }

        unreachable!("retry loop always returns")
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}
