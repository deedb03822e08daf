//! Shared test helpers for the advisor pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use kurort_core::{
    ChatMessage, Chunk, CityContent, ContentSource, EmbeddingError, LlmClient, LlmError,
    SourceError, TextEmbedder, TokenCounter,
};

/// A mock client that returns a sequence of scripted responses, one per
/// `complete` call. Panics when the queue runs dry.
pub struct ScriptedClient {
    responses: Mutex<Vec<String>>,
    call_count: Mutex<usize>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            call_count: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        if *count >= responses.len() {
            panic!(
                "ScriptedClient: no more responses (call #{}, have {})",
                *count,
                responses.len()
            );
        }
        let response = responses[*count].clone();
        *count += 1;
        Ok(response)
    }
}

/// In-memory content source: a fixed map of city name to content.
/// Unknown cities report no content; cities in `failing` error out.
pub struct StaticContent {
    pub cities: HashMap<String, CityContent>,
    pub failing: Vec<String>,
}

impl StaticContent {
    pub fn new(cities: Vec<(&str, &str)>) -> Self {
        let cities = cities
            .into_iter()
            .map(|(city, summary)| (city.to_string(), content_for(city, summary)))
            .collect();
        Self { cities, failing: Vec::new() }
    }
}

/// Build a one-chunk `CityContent` from a summary string.
pub fn content_for(city: &str, summary: &str) -> CityContent {
    CityContent {
        summary: summary.to_string(),
        full_text: summary.to_string(),
        chunks: vec![Chunk { city: city.to_string(), index: 0, content: summary.to_string() }],
        pois: None,
    }
}

#[async_trait]
impl ContentSource for StaticContent {
    fn name(&self) -> &str {
        "static_mock"
    }

    async fn fetch(&self, city: &str) -> Result<Option<CityContent>, SourceError> {
        if self.failing.iter().any(|c| c == city) {
            return Err(SourceError::Network("mock outage".into()));
        }
        Ok(self.cities.get(city).cloned())
    }
}

/// Deterministic embedder: a 2-d vector leaning toward axis 0 when the
/// text mentions a beach, axis 1 otherwise. Preference texts that talk
/// about beaches therefore rank beach summaries first.
pub struct KeywordEmbedder;

#[async_trait]
impl TextEmbedder for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword_mock"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                if lower.contains("пляж") || lower.contains("море") {
                    vec![1.0, 0.2]
                } else {
                    vec![0.2, 1.0]
                }
            })
            .collect())
    }
}

/// Token counter for budget math in tests: one token per whitespace word.
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}
