//! Persistent embedding cache — append-only JSONL storage.
//!
//! Each line is a JSON-encoded `CacheEntry` keyed by a truncated SHA-256
//! of the exact input text. Lookup is exact-match via that hash; a hit
//! returns the same vector a fresh computation would (the model is
//! deterministic). Inserts accumulate in a pending buffer and hit disk
//! once per `flush`, not per item; the flush step appends under a write
//! lock so concurrent writers cannot interleave partial lines.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use kurort_core::EmbeddingError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    key: String,
    text: String,
    vector: Vec<f32>,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Vec<f32>>,
    pending: Vec<CacheEntry>,
}

/// A file-backed embedding cache using JSONL (one JSON object per line).
///
/// Entries are loaded into memory on creation; mutations stage in memory
/// and persist on `flush`.
pub struct EmbeddingCache {
    path: PathBuf,
    state: RwLock<CacheState>,
}

impl EmbeddingCache {
    /// Open a cache at the given path, loading any existing entries.
    /// A missing file means an empty cache; the file is created on the
    /// first flush.
    pub fn open(path: PathBuf) -> Self {
        let entries = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = entries.len(), "embedding cache loaded");
        Self {
            path,
            state: RwLock::new(CacheState { entries, pending: Vec::new() }),
        }
    }

    /// Cache key: first 16 hex chars of SHA-256 over the exact text.
    /// Stable across processes, unlike the std hasher.
    pub fn key(text: &str) -> String {
        let digest = Sha256::digest(text.as_bytes());
        let mut key = String::with_capacity(16);
        for byte in &digest[..8] {
            key.push_str(&format!("{byte:02x}"));
        }
        key
    }

    fn load_from_disk(path: &PathBuf) -> HashMap<String, Vec<f32>> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return HashMap::new(),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<CacheEntry>(line) {
                Ok(entry) => Some((entry.key, entry.vector)),
                Err(e) => {
                    warn!(error = %e, "skipping corrupted cache entry");
                    None
                }
            })
            .collect()
    }

    /// Look up the vector for an exact text.
    pub async fn get(&self, text: &str) -> Option<Vec<f32>> {
        let key = Self::key(text);
        self.state.read().await.entries.get(&key).cloned()
    }

    /// Stage a vector for the given text. Not persisted until `flush`.
    pub async fn insert(&self, text: &str, vector: Vec<f32>) {
        let key = Self::key(text);
        let mut state = self.state.write().await;
        if state.entries.contains_key(&key) {
            return;
        }
        state.entries.insert(key.clone(), vector.clone());
        state.pending.push(CacheEntry {
            key,
            text: text.to_string(),
            vector,
            created_at: Utc::now(),
        });
    }

    /// Append all pending entries to disk in one write.
    pub async fn flush(&self) -> Result<(), EmbeddingError> {
        let mut state = self.state.write().await;
        if state.pending.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                EmbeddingError::Cache(format!("failed to create cache directory: {e}"))
            })?;
        }

        let mut buffer = String::new();
        for entry in &state.pending {
            let line = serde_json::to_string(entry).map_err(|e| {
                EmbeddingError::Cache(format!("failed to serialize cache entry: {e}"))
            })?;
            buffer.push_str(&line);
            buffer.push('\n');
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| EmbeddingError::Cache(format!("failed to open cache file: {e}")))?;
        file.write_all(buffer.as_bytes())
            .map_err(|e| EmbeddingError::Cache(format!("failed to write cache file: {e}")))?;

        let flushed = state.pending.len();
        state.pending.clear();
        debug!(count = flushed, path = %self.path.display(), "embedding cache flushed");
        Ok(())
    }

    /// Number of cached vectors (staged ones included).
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
