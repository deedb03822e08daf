//! Two-phase grounded answering over the assembled document set.
//!
//! Phase one extracts the relevant passages at temperature 0.0; phase
//! two generates the final natural-language answer at 0.3 with the
//! relevant-passages turn prepended as assistant context.

use std::sync::Arc;

use tracing::debug;

use kurort_core::{ChatMessage, Document, LlmClient, LlmError};

use crate::budget::{MAX_FINAL_TOKENS, MAX_SUMMARY_TOKENS};
use crate::prompts::GROUNDED_SYSTEM_PROMPT;
use crate::summarize::Summarizer;

/// The two texts a grounded exchange produces.
#[derive(Debug, Clone)]
pub struct GroundedAnswer {
    /// Relevant passages the model selected from the documents.
    pub relevant: String,
    /// Final natural-language answer.
    pub answer: String,
}

/// Runs the grounded two-phase completion.
pub struct RagResponder {
    client: Arc<dyn LlmClient>,
    summarizer: Summarizer,
}

impl RagResponder {
    pub fn new(client: Arc<dyn LlmClient>, summarizer: Summarizer) -> Self {
        Self { client, summarizer }
    }

    /// Answer the user's preferences over the document set.
    ///
    /// When the serialized documents take more than 70% of the available
    /// RAG budget, every document is recompressed first so the two
    /// response phases keep their token room.
    pub async fn respond(
        &self,
        preferences: &str,
        documents: Vec<Document>,
    ) -> Result<GroundedAnswer, LlmError> {
        let budget = self.summarizer.budget();
        let available = budget.available_tokens(preferences, true).max(0) as usize;

        let mut documents = documents;
        let serialized = serde_json::to_string(&documents)
            .map_err(|e| LlmError::ApiError {
                status_code: 0,
                message: format!("failed to serialize documents: {e}"),
            })?;
        let docs_tokens = budget.count(&serialized);

        let docs_budget = available * 7 / 10;
        if docs_tokens > docs_budget && !documents.is_empty() {
            debug!(docs_tokens, docs_budget, "documents over RAG budget, recompressing");
            let per_doc = (docs_budget / documents.len()).max(1);
            let mut compressed = Vec::with_capacity(documents.len());
            for doc in documents {
                let content = self.summarizer.compress_chunk(&doc.content, per_doc).await?;
                compressed.push(Document { id: doc.id, title: doc.title, content });
            }
            documents = compressed;
        }

        let docs_json = serde_json::to_string(&documents).map_err(|e| LlmError::ApiError {
            status_code: 0,
            message: format!("failed to serialize documents: {e}"),
        })?;

        let base = [
            ChatMessage::system(GROUNDED_SYSTEM_PROMPT),
            ChatMessage::user(preferences),
            ChatMessage::user(format!("Available information:\n{docs_json}")),
        ];

        let relevant = self.client.complete(&base, 0.0, MAX_SUMMARY_TOKENS).await?;

        let mut follow_up = base.to_vec();
        follow_up.push(ChatMessage::assistant(relevant.clone()));
        let answer = self.client.complete(&follow_up, 0.3, MAX_FINAL_TOKENS).await?;

        Ok(GroundedAnswer { relevant, answer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::ContextBudget;
    use crate::test_helpers::{ScriptedClient, WordCounter};

    fn responder(client: Arc<ScriptedClient>) -> RagResponder {
        let budget = ContextBudget::new(Arc::new(WordCounter));
        let summarizer = Summarizer::new(client.clone(), budget);
        RagResponder::new(client, summarizer)
    }

    fn docs() -> Vec<Document> {
        vec![
            Document { id: 0, title: "Сочи".into(), content: "пляжи и горы".into() },
            Document { id: 1, title: "Анапа".into(), content: "песчаные пляжи".into() },
        ]
    }

    #[tokio::test]
    async fn two_phases_with_expected_temperatures() {
        let client = Arc::new(ScriptedClient::new(vec![
            "Сочи: пляжи и горы",
            "Рекомендую Сочи: пляжи рядом с горами.",
        ]));
        let result = responder(client.clone())
            .respond("хочу на море", docs())
            .await
            .unwrap();

        assert_eq!(result.relevant, "Сочи: пляжи и горы");
        assert!(result.answer.contains("Сочи"));
        assert_eq!(client.temperatures(), vec![0.0, 0.3]);
    }

    #[tokio::test]
    async fn small_documents_are_not_recompressed() {
        let client = Arc::new(ScriptedClient::new(vec!["релевантно", "ответ"]));
        responder(client.clone()).respond("море", docs()).await.unwrap();
        // Only the two response phases, no compression calls
        assert_eq!(client.call_count(), 2);
    }
}
