//! Wikipedia content source (Russian-language MediaWiki API).
//!
//! Two extract queries per city: one intro-only for the summary, one
//! full for the article text. The full text is split into bounded
//! chunks on paragraph boundaries for the RAG stage. A missing page is
//! `Ok(None)` so sibling fetches proceed; transport problems go through
//! the retry policy first.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use kurort_core::{Chunk, CityContent, ContentSource, SourceError};

use crate::retry::RetryPolicy;

const DEFAULT_API_URL: &str = "https://ru.wikipedia.org/w/api.php";
const USER_AGENT: &str = "kurort/0.1 (travel advisor)";
/// Target chunk size in characters. Chunks end on paragraph boundaries,
/// so real sizes vary around this.
const CHUNK_CHARS: usize = 1_000;

pub struct WikiSource {
    api_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl WikiSource {
    pub fn new(api_url: Option<&str>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_url: api_url.unwrap_or(DEFAULT_API_URL).to_string(),
            client,
            retry: RetryPolicy::default(),
        })
    }

    async fn extract(&self, city: &str, intro_only: bool) -> Result<Option<String>, SourceError> {
        let mut params = vec![
            ("action", "query"),
            ("prop", "extracts"),
            ("explaintext", "1"),
            ("format", "json"),
            ("redirects", "1"),
            ("titles", city),
        ];
        if intro_only {
            params.push(("exintro", "1"));
        }

        let response = self
            .client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Network(format!(
                "wikipedia returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: ExtractResponse = response.json().await.map_err(|e| {
            SourceError::InvalidPayload { origin: "wikipedia".into(), reason: e.to_string() }
        })?;

        let page = body.query.pages.into_values().next().ok_or_else(|| {
            SourceError::InvalidPayload {
                origin: "wikipedia".into(),
                reason: "no pages in response".into(),
            }
        })?;

        if page.missing.is_some() {
            return Ok(None);
        }
        Ok(page.extract.filter(|text| !text.trim().is_empty()))
    }

}

/// Split text into chunks of roughly `target` characters, breaking on
/// blank-line paragraph boundaries.
fn chunk_text(text: &str, city: &str, target: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        if !current.is_empty() && current.chars().count() + paragraph.chars().count() > target {
            chunks.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk { city: city.to_string(), index, content })
        .collect()
}

#[async_trait]
impl ContentSource for WikiSource {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn fetch(&self, city: &str) -> Result<Option<CityContent>, SourceError> {
        let summary = self.retry.run("wiki summary", || self.extract(city, true)).await?;
        let Some(summary) = summary else {
            return Ok(None);
        };

        let full_text = self
            .retry
            .run("wiki full text", || self.extract(city, false))
            .await?
            .unwrap_or_else(|| summary.clone());

        let chunks = chunk_text(&full_text, city, CHUNK_CHARS);
        debug!(city = %city, chunks = chunks.len(), "wikipedia content fetched");

        Ok(Some(CityContent { summary, full_text, chunks, pois: None }))
    }
}

// --- MediaWiki API types (internal) ---

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    pages: std::collections::HashMap<String, ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: Option<serde_json::Value>,
}
