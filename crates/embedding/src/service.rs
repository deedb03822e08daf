//! Cache-aware batch embedding.

use std::sync::Arc;

use tracing::debug;

use kurort_core::{EmbeddingError, TextEmbedder};

use crate::cache::EmbeddingCache;

/// Front door for embedding work: checks the persistent cache first,
/// sends all misses to the backend as one batch, and flushes the cache
/// once per call.
pub struct EmbeddingService {
    embedder: Arc<dyn TextEmbedder>,
    cache: EmbeddingCache,
}

impl EmbeddingService {
    pub fn new(embedder: Arc<dyn TextEmbedder>, cache: EmbeddingCache) -> Self {
        Self { embedder, cache }
    }

    /// Embed all texts, in input order. Cached texts are not recomputed.
    pub async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut missing: Vec<usize> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match self.cache.get(text).await {
                Some(vector) => results.push(Some(vector)),
                None => {
                    results.push(None);
                    missing.push(i);
                }
            }
        }

        if !missing.is_empty() {
            let batch: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            debug!(
                backend = self.embedder.name(),
                total = texts.len(),
                misses = missing.len(),
                "embedding cache misses"
            );
            let vectors = self.embedder.embed_batch(&batch).await?;
            if vectors.len() != batch.len() {
                return Err(EmbeddingError::Backend(format!(
                    "backend returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            for (&i, vector) in missing.iter().zip(vectors) {
                self.cache.insert(&texts[i], vector.clone()).await;
                results[i] = Some(vector);
            }
            self.cache.flush().await?;
        }

        Ok(results.into_iter().map(|v| v.unwrap_or_default()).collect())
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_all(std::slice::from_ref(&text.to_string())).await?;
        Ok(vectors.pop().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::NamedTempFile;

    /// Deterministic fake backend: vector = [len, 1.0], counts calls.
    struct CountingEmbedder {
        calls: AtomicUsize,
        embedded: AtomicUsize,
    }

    impl CountingEmbedder {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0), embedded: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl TextEmbedder for CountingEmbedder {
        fn name(&self) -> &str {
            "counting"
        }

        async fn embed_batch(
            &self,
            texts: &[String],
        ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.embedded.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.chars().count() as f32, 1.0]).collect())
        }
    }

    fn temp_path() -> PathBuf {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp);
        path
    }

    #[tokio::test]
    async fn misses_go_to_backend_in_one_batch() {
        let embedder = Arc::new(CountingEmbedder::new());
        let service =
            EmbeddingService::new(embedder.clone(), EmbeddingCache::open(temp_path()));

        let texts = vec!["Сочи".to_string(), "Анапа".to_string(), "Ялта".to_string()];
        let vectors = service.embed_all(&texts).await.unwrap();

        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0], vec![4.0, 1.0]);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_hits_skip_backend() {
        let embedder = Arc::new(CountingEmbedder::new());
        let path = temp_path();
        let service =
            EmbeddingService::new(embedder.clone(), EmbeddingCache::open(path.clone()));

        let texts = vec!["Сочи".to_string(), "Анапа".to_string()];
        service.embed_all(&texts).await.unwrap();

        // Second call with one known and one new text
        let texts2 = vec!["Сочи".to_string(), "Геленджик".to_string()];
        let vectors = service.embed_all(&texts2).await.unwrap();

        assert_eq!(vectors[0], vec![4.0, 1.0]);
        assert_eq!(embedder.embedded.load(Ordering::SeqCst), 3); // only misses
    }

    #[tokio::test]
    async fn results_persist_across_reopen() {
        let embedder = Arc::new(CountingEmbedder::new());
        let path = temp_path();
        {
            let service =
                EmbeddingService::new(embedder.clone(), EmbeddingCache::open(path.clone()));
            service.embed_one("Евпатория").await.unwrap();
        }

        let service2 = EmbeddingService::new(embedder.clone(), EmbeddingCache::open(path));
        let vector = service2.embed_one("Евпатория").await.unwrap();
        assert_eq!(vector, vec![9.0, 1.0]);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fully_cached_request_makes_no_backend_call() {
        let embedder = Arc::new(CountingEmbedder::new());
        let service = EmbeddingService::new(embedder.clone(), EmbeddingCache::open(temp_path()));

        let texts = vec!["а".to_string(), "б".to_string()];
        service.embed_all(&texts).await.unwrap();
        service.embed_all(&texts).await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }
}
