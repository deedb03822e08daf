//! OpenAI-compatible embedding backend.
//!
//! Works with any endpoint exposing `/v1/embeddings`: OpenAI, vLLM,
//! Ollama, LM Studio, Text Embeddings Inference.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use kurort_core::{EmbeddingError, TextEmbedder};

/// Remote embedder talking to an OpenAI-compatible `/embeddings` endpoint.
pub struct ApiEmbedder {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl ApiEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| EmbeddingError::Backend(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl TextEmbedder for ApiEmbedder {
    fn name(&self) -> &str {
        "api"
    }

    async fn embed_batch(
        &self,
        texts: &[String],
    ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
            "encoding_format": "float",
        });

        debug!(model = %self.model, count = texts.len(), "sending embedding request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Backend(format!("embedding request failed: {e}")))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Backend(format!(
                "embedding endpoint returned {status}: {error_body}"
            )));
        }

        let api_resp: EmbeddingApiResponse = response.json().await.map_err(|e| {
            EmbeddingError::Backend(format!("failed to parse embedding response: {e}"))
        })?;

        if api_resp.data.len() != texts.len() {
            return Err(EmbeddingError::Backend(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                api_resp.data.len()
            )));
        }

        Ok(api_resp.data.into_iter().map(|d| d.embedding).collect())
    }
}
