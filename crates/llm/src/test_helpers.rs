//! Shared test helpers for the LLM-side tests.

use std::sync::Mutex;

use async_trait::async_trait;

use kurort_core::{ChatMessage, LlmClient, LlmError, TokenCounter};

/// A mock client that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue.
/// Panics if more calls are made than responses provided.
pub struct ScriptedClient {
    responses: Mutex<Vec<String>>,
    call_count: Mutex<usize>,
    temperatures: Mutex<Vec<f32>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            call_count: Mutex::new(0),
            temperatures: Mutex::new(Vec::new()),
        }
    }

    pub fn single(text: &str) -> Self {
        Self::new(vec![text])
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Temperatures seen so far, in call order.
    pub fn temperatures(&self) -> Vec<f32> {
        self.temperatures.lock().unwrap().clone()
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
        temperature: f32,
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
        self.temperatures.lock().unwrap().push(temperature);
        Ok(response)
    }
}

/// A mock client that always fails.
pub struct FailingClient {
    pub error: LlmError,
}

#[async_trait]
impl LlmClient for FailingClient {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        Err(self.error.clone())
    }
}

/// Counts whitespace-separated words. Only for tests where exact model
/// tokenization does not matter.
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}
