//! Local ruBERT embedding backend via Candle.
//!
//! Downloads the model from HuggingFace Hub on first use and runs CPU
//! inference. Texts are tokenized with truncation at 512 tokens, padded
//! into a single batch, and mean-pooled over the attention mask.

use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::api::sync::Api;
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};
use tokio::sync::Mutex;
use tracing::{debug, info};

use kurort_core::{EmbeddingError, TextEmbedder};

const DEFAULT_MODEL: &str = "sberbank-ai/ruBert-base";
const MAX_SEQ_LEN: usize = 512;

struct BertState {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Local BERT embedder. The model loads lazily on the first batch;
/// inference runs on a blocking thread since Candle is CPU-bound.
pub struct BertEmbedder {
    inner: Arc<Mutex<Option<BertState>>>,
    model_repo: String,
}

impl BertEmbedder {
    pub fn new(model_repo: Option<&str>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
            model_repo: model_repo.unwrap_or(DEFAULT_MODEL).to_string(),
        }
    }
}

impl BertState {
    fn load(model_repo: &str) -> Result<Self, EmbeddingError> {
        let device = Device::Cpu;

        info!(repo = model_repo, "downloading/loading embedding model");

        let api = Api::new().map_err(|e| {
            EmbeddingError::Backend(format!("failed to initialize HuggingFace Hub API: {e}"))
        })?;
        let repo = api.model(model_repo.to_string());

        let config_path = repo
            .get("config.json")
            .map_err(|e| EmbeddingError::Backend(format!("failed to download config: {e}")))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| EmbeddingError::Backend(format!("failed to download tokenizer: {e}")))?;
        let weights_path = repo
            .get("model.safetensors")
            .or_else(|_| repo.get("pytorch_model.bin"))
            .map_err(|e| EmbeddingError::Backend(format!("failed to download weights: {e}")))?;

        let config: Config = serde_json::from_str(
            &std::fs::read_to_string(&config_path)
                .map_err(|e| EmbeddingError::Backend(format!("failed to read config: {e}")))?,
        )
        .map_err(|e| EmbeddingError::Backend(format!("failed to parse config: {e}")))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbeddingError::Tokenizer(format!("failed to load tokenizer: {e}")))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::Tokenizer(format!("failed to set truncation: {e}")))?;
        tokenizer.with_padding(Some(PaddingParams::default()));

        let vb = if weights_path.extension().is_some_and(|ext| ext == "safetensors") {
            unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                    .map_err(map_candle_err)?
            }
        } else {
            VarBuilder::from_pth(&weights_path, DTYPE, &device).map_err(map_candle_err)?
        };

        let model = BertModel::load(vb, &config).map_err(map_candle_err)?;

        info!(repo = model_repo, "embedding model loaded");

        Ok(Self { model, tokenizer, device })
    }

    /// Encode one padded batch and mean-pool over the attention mask.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::Tokenizer(format!("tokenization failed: {e}")))?;

        let ids: Vec<Vec<u32>> = encodings.iter().map(|e| e.get_ids().to_vec()).collect();
        let masks: Vec<Vec<u32>> =
            encodings.iter().map(|e| e.get_attention_mask().to_vec()).collect();

        let input_ids = Tensor::new(ids, &self.device).map_err(map_candle_err)?;
        let attention_mask = Tensor::new(masks, &self.device).map_err(map_candle_err)?;
        let token_type_ids = input_ids.zeros_like().map_err(map_candle_err)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(map_candle_err)?;

        // Mean pooling: sum of attended token vectors / attended count,
        // with a floor against division by zero
        let mask = attention_mask
            .unsqueeze(2)
            .map_err(map_candle_err)?
            .to_dtype(DType::F32)
            .map_err(map_candle_err)?
            .broadcast_as(hidden.shape())
            .map_err(map_candle_err)?;
        let summed = hidden
            .mul(&mask)
            .map_err(map_candle_err)?
            .sum(1)
            .map_err(map_candle_err)?;
        let counts = mask
            .sum(1)
            .map_err(map_candle_err)?
            .clamp(1e-9, f64::INFINITY)
            .map_err(map_candle_err)?;
        let pooled = summed.div(&counts).map_err(map_candle_err)?;

        pooled.to_vec2::<f32>().map_err(map_candle_err)
    }
}

fn map_candle_err(e: candle_core::Error) -> EmbeddingError {
    EmbeddingError::Backend(format!("candle inference error: {e}"))
}

#[async_trait]
impl TextEmbedder for BertEmbedder {
    fn name(&self) -> &str {
        "rubert"
    }

    async fn embed_batch(
        &self,
        texts: &[String],
    ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        {
            let state = self.inner.lock().await;
            if state.is_none() {
                drop(state);
                let repo = self.model_repo.clone();
                let loaded = tokio::task::spawn_blocking(move || BertState::load(&repo))
                    .await
                    .map_err(|e| EmbeddingError::Backend(format!("model loading task failed: {e}")))??;
                let mut state = self.inner.lock().await;
                *state = Some(loaded);
            }
        }

        debug!(count = texts.len(), "embedding batch locally");

        let inner = self.inner.clone();
        let batch = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            let guard = inner.blocking_lock();
            let state = guard.as_ref().expect("model must be loaded");
            state.encode_batch(&batch)
        })
        .await
        .map_err(|e| EmbeddingError::Backend(format!("inference task panicked: {e}")))?
    }
}
