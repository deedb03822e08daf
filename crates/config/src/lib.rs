//! Configuration loading and validation for Kurort.
//!
//! Loads configuration from `~/.kurort/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use kurort_rules::LocationKind;

/// The root configuration structure.
///
/// Maps directly to `~/.kurort/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the LLM/embedding endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// LLM endpoint configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding backend configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Candidate city rosters per location category
    #[serde(default)]
    pub cities: CityRosters,

    /// POI cache file path (defaults to ~/.kurort/poi_cache.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poi_cache_path: Option<PathBuf>,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("llm", &self.llm)
            .field("embedding", &self.embedding)
            .field("cities", &self.cities)
            .field("poi_cache_path", &self.poi_cache_path)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible endpoint base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Chat model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// HF repo for the exact tokenizer of the chat model. Defaults to
    /// the model id itself, which works for HF-hosted models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_repo: Option<String>,
}

fn default_api_url() -> String {
    "http://localhost:8000/v1".into()
}
fn default_model() -> String {
    "Vikhrmodels/Vikhr-Nemo-12B-Instruct-R-21-09-24".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            tokenizer_repo: None,
        }
    }
}

impl LlmConfig {
    /// The tokenizer repo to download, falling back to the model id.
    pub fn tokenizer_repo(&self) -> &str {
        self.tokenizer_repo.as_deref().unwrap_or(&self.model)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backend kind: "api" or "local"
    #[serde(default = "default_embedding_backend")]
    pub backend: String,

    /// Endpoint for the "api" backend. Defaults to the LLM endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Embedding model: API model name, or HF repo for "local"
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector cache file (defaults to ~/.kurort/embeddings.jsonl)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,
}

fn default_embedding_backend() -> String {
    "api".into()
}
fn default_embedding_model() -> String {
    "sberbank-ai/ruBert-base".into()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            api_url: None,
            model: default_embedding_model(),
            cache_path: None,
        }
    }
}

/// Candidate resort cities grouped by location category. The advisor's
/// location routing narrows the fetch to one roster; no signal means the
/// union of all of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityRosters {
    #[serde(default = "default_sea_cities")]
    pub sea: Vec<String>,

    #[serde(default = "default_mountain_cities")]
    pub mountains: Vec<String>,

    #[serde(default = "default_spa_cities")]
    pub spa: Vec<String>,

    #[serde(default = "default_city_cities")]
    pub city: Vec<String>,
}

fn default_sea_cities() -> Vec<String> {
    ["Сочи", "Анапа", "Геленджик", "Ялта", "Алушта", "Евпатория"]
        .map(String::from)
        .to_vec()
}
fn default_mountain_cities() -> Vec<String> {
    ["Красная Поляна", "Домбай", "Шерегеш", "Архыз"].map(String::from).to_vec()
}
fn default_spa_cities() -> Vec<String> {
    ["Кисловодск", "Пятигорск", "Ессентуки", "Железноводск"].map(String::from).to_vec()
}
fn default_city_cities() -> Vec<String> {
    ["Калининград", "Казань", "Ярославль"].map(String::from).to_vec()
}

impl Default for CityRosters {
    fn default() -> Self {
        Self {
            sea: default_sea_cities(),
            mountains: default_mountain_cities(),
            spa: default_spa_cities(),
            city: default_city_cities(),
        }
    }
}

impl CityRosters {
    /// The roster for one location category.
    pub fn roster(&self, kind: LocationKind) -> &[String] {
        match kind {
            LocationKind::Sea => &self.sea,
            LocationKind::Mountains => &self.mountains,
            LocationKind::Spa => &self.spa,
            LocationKind::City => &self.city,
        }
    }

    /// Union of every roster, first occurrence wins, insertion order kept.
    pub fn all(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        [&self.sea, &self.mountains, &self.spa, &self.city]
            .into_iter()
            .flatten()
            .filter(|city| seen.insert(city.as_str()))
            .cloned()
            .collect()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.kurort/config.toml).
    ///
    /// Also checks environment variables:
    /// - `KURORT_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `KURORT_ENDPOINT` overrides the LLM endpoint
    /// - `KURORT_MODEL` overrides the chat model
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("KURORT_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(endpoint) = std::env::var("KURORT_ENDPOINT") {
            config.llm.api_url = endpoint;
        }

        if let Ok(model) = std::env::var("KURORT_MODEL") {
            config.llm.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".kurort")
    }

    /// Resolved embedding-cache path.
    pub fn embedding_cache_path(&self) -> PathBuf {
        self.embedding
            .cache_path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("embeddings.jsonl"))
    }

    /// Resolved POI-cache path.
    pub fn poi_cache_path(&self) -> PathBuf {
        self.poi_cache_path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("poi_cache.json"))
    }

    /// Resolved embedding endpoint: the dedicated one, or the LLM one.
    pub fn embedding_api_url(&self) -> &str {
        self.embedding.api_url.as_deref().unwrap_or(&self.llm.api_url)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.embedding.backend.as_str() {
            "api" | "local" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "embedding.backend must be \"api\" or \"local\", got \"{other}\""
                )));
            }
        }

        if self.cities.all().is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one candidate city must be configured".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            cities: CityRosters::default(),
            poi_cache_path: None,
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
