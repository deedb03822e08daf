//! Chunk compression and per-city document assembly.
//!
//! All compression calls run at temperature 0.0 so repeated runs over
//! the same content converge to the same summaries.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use kurort_core::{ChatMessage, Document, LlmClient, LlmError};

use crate::budget::{ContextBudget, MAX_FINAL_TOKENS};
use crate::prompts::{COMPRESS_PROMPT, MERGE_PROMPT};

/// Upper bound on repeated compression rounds for one text. The model
/// occasionally overshoots max_tokens slightly; without a cap a
/// non-shrinking response would loop forever.
const MAX_COMPRESSION_PASSES: u32 = 3;

/// Compresses chunks and assembles the per-city RAG document set within
/// the token budget.
#[derive(Clone)]
pub struct Summarizer {
    client: Arc<dyn LlmClient>,
    budget: ContextBudget,
}

impl Summarizer {
    pub fn new(client: Arc<dyn LlmClient>, budget: ContextBudget) -> Self {
        Self { client, budget }
    }

    pub fn budget(&self) -> &ContextBudget {
        &self.budget
    }

    /// Shrink a text until it fits `max_tokens`, at most
    /// [`MAX_COMPRESSION_PASSES`] rounds. A text already under the limit
    /// is returned untouched without an LLM call.
    pub async fn compress_chunk(&self, text: &str, max_tokens: usize) -> Result<String, LlmError> {
        let mut current = text.to_string();
        let mut passes = 0;

        while self.budget.count(&current) > max_tokens {
            if passes >= MAX_COMPRESSION_PASSES {
                warn!(
                    passes,
                    tokens = self.budget.count(&current),
                    max_tokens,
                    "compression did not converge, keeping oversized text"
                );
                break;
            }
            let messages =
                [ChatMessage::system(COMPRESS_PROMPT), ChatMessage::user(current.clone())];
            current = self.client.complete(&messages, 0.0, max_tokens.max(1) as u32).await?;
            passes += 1;
        }

        Ok(current)
    }

    /// Join per-chunk summaries into one city description, compressing
    /// via the LLM only when the plain concatenation is over budget.
    pub async fn merge_summaries(
        &self,
        summaries: &[String],
        city: &str,
        max_tokens: usize,
    ) -> Result<String, LlmError> {
        let combined = format!("Информация о {city}:\n{}", summaries.join("\n"));

        if self.budget.count(&combined) <= max_tokens {
            return Ok(combined);
        }

        let messages = [ChatMessage::system(MERGE_PROMPT), ChatMessage::user(combined)];
        self.client.complete(&messages, 0.0, max_tokens.max(1) as u32).await
    }

    /// Build the RAG document set for the selected cities.
    ///
    /// The per-city token allocation divides the remaining RAG budget
    /// evenly. A city whose compression fails is skipped with a warning;
    /// the others still produce documents. Document order follows the
    /// input order, and doc ids are assigned in that order.
    pub async fn prepare_rag_documents(
        &self,
        cities_chunks: &[(String, Vec<String>)],
        preferences: &str,
    ) -> Result<Vec<Document>, LlmError> {
        if cities_chunks.is_empty() {
            return Ok(Vec::new());
        }

        let available = self.budget.available_tokens(preferences, true);
        let working = (available - MAX_FINAL_TOKENS as i64).max(0) as usize;
        let tokens_per_city = (working / cities_chunks.len()).max(1);

        let mut documents = Vec::new();

        for (city, chunks) in cities_chunks {
            let tokens_per_chunk = (tokens_per_city / chunks.len().max(1)).max(1);

            let compressed: Result<Vec<String>, LlmError> =
                join_all(chunks.iter().map(|chunk| self.compress_chunk(chunk, tokens_per_chunk)))
                    .await
                    .into_iter()
                    .collect();

            let summary = match compressed {
                Ok(parts) => match self.merge_summaries(&parts, city, tokens_per_city).await {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(city = %city, error = %e, "failed to merge summaries, skipping city");
                        continue;
                    }
                },
                Err(e) => {
                    warn!(city = %city, error = %e, "failed to compress chunks, skipping city");
                    continue;
                }
            };

            let summary = if self.budget.count(&summary) > tokens_per_city {
                self.compress_chunk(&summary, tokens_per_city).await?
            } else {
                summary
            };

            documents.push(Document { id: documents.len(), title: city.clone(), content: summary });
        }

        // Safety net: recompress everything when the combined set still
        // exceeds the working budget
        let total: usize = documents.iter().map(|d| self.budget.count(&d.content)).sum();
        if total > working && !documents.is_empty() {
            debug!(total, working, "documents over budget, emergency recompression");
            let per_city = (working / documents.len()).max(1);
            let mut compressed_docs = Vec::with_capacity(documents.len());
            for doc in documents {
                let content = self.compress_chunk(&doc.content, per_city).await?;
                compressed_docs.push(Document { id: doc.id, title: doc.title, content });
            }
            documents = compressed_docs;
        }

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedClient, WordCounter};

    fn summarizer(client: ScriptedClient) -> (Arc<ScriptedClient>, Summarizer) {
        let client = Arc::new(client);
        let budget = ContextBudget::new(Arc::new(WordCounter));
        (client.clone(), Summarizer::new(client, budget))
    }

    #[tokio::test]
    async fn short_text_is_not_compressed() {
        let (client, summarizer) = summarizer(ScriptedClient::new(vec![]));
        let result = summarizer.compress_chunk("короткий текст", 10).await.unwrap();
        assert_eq!(result, "короткий текст");
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn long_text_is_compressed_until_it_fits() {
        let long = "слово ".repeat(20);
        let (client, summarizer) =
            summarizer(ScriptedClient::new(vec!["все еще длинный текст лишние слова", "кратко"]));
        let result = summarizer.compress_chunk(&long, 3).await.unwrap();
        assert_eq!(result, "кратко");
        assert_eq!(client.call_count(), 2);
        // Compression always runs deterministic
        assert!(client.temperatures().iter().all(|t| *t == 0.0));
    }

    #[tokio::test]
    async fn compression_gives_up_after_pass_cap() {
        let long = "слово ".repeat(20);
        // The mock never shrinks below the limit
        let stubborn = "десять слов десять слов десять слов десять слов десять слов";
        let (client, summarizer) =
            summarizer(ScriptedClient::new(vec![stubborn, stubborn, stubborn]));
        let result = summarizer.compress_chunk(&long, 3).await.unwrap();
        assert_eq!(result, stubborn);
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn merge_keeps_fitting_concatenation() {
        let (client, summarizer) = summarizer(ScriptedClient::new(vec![]));
        let merged = summarizer
            .merge_summaries(&["пляжи".to_string(), "музеи".to_string()], "Сочи", 100)
            .await
            .unwrap();
        assert!(merged.starts_with("Информация о Сочи:"));
        assert!(merged.contains("пляжи"));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn merge_compresses_when_over_budget() {
        let (client, summarizer) = summarizer(ScriptedClient::single("связное описание"));
        let summaries: Vec<String> = (0..10).map(|i| format!("факт номер {i}")).collect();
        let merged = summarizer.merge_summaries(&summaries, "Ялта", 5).await.unwrap();
        assert_eq!(merged, "связное описание");
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn documents_follow_input_order_with_sequential_ids() {
        let (_, summarizer) = summarizer(ScriptedClient::new(vec![]));
        let cities = vec![
            ("Сочи".to_string(), vec!["пляж".to_string()]),
            ("Анапа".to_string(), vec!["песок".to_string()]),
        ];
        let docs = summarizer.prepare_rag_documents(&cities, "море").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "Сочи");
        assert_eq!(docs[0].id, 0);
        assert_eq!(docs[1].title, "Анапа");
        assert_eq!(docs[1].id, 1);
    }

    #[tokio::test]
    async fn empty_city_set_yields_no_documents() {
        let (_, summarizer) = summarizer(ScriptedClient::new(vec![]));
        let docs = summarizer.prepare_rag_documents(&[], "море").await.unwrap();
        assert!(docs.is_empty());
    }
}
