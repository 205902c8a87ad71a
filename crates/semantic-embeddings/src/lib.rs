#![deny(clippy::all)]

mod embedding;
mod model;

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

// Re-export for external use
pub use embedding::{cosine_similarity, l2_norm, l2_normalize};
pub use model::{ModelInfo, ModelManager};

/// Number of texts sent through the encoder at once.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Type alias for an embedding vector.
pub type Embedding = Vec<f32>;

/// Optional `sentence_bert_config.json` shipped with sentence-transformers checkpoints.
#[derive(Debug, Deserialize)]
struct SentenceBertConfig {
    max_seq_length: Option<usize>,
}

/// Semantic embedding generator for text content.
///
/// Wraps ModelManager with a convenient API for loading models from files
/// and encoding in fixed-size batches.
///
/// # Example
/// ```ignore
/// use semantic_embeddings::SemanticEmbeddings;
/// use std::path::Path;
///
/// let embeddings = SemanticEmbeddings::load_from_dir(Path::new("all-distilroberta-v1"), None)?;
///
/// let embedding = embeddings.encode("Hello world")?;
/// println!("Embedding dimension: {}", embedding.len());
/// ```
pub struct SemanticEmbeddings {
    model: ModelManager,
    batch_size: usize,
}

impl SemanticEmbeddings {
    /// Load model from a directory containing config.json, tokenizer.json, and model.safetensors.
    ///
    /// # Arguments
    /// * `model_dir` - Path to directory containing model files
    /// * `max_seq_length` - Overrides the truncation length from `sentence_bert_config.json`
    ///
    /// # Expected files
    /// - `config.json` - Model configuration
    /// - `tokenizer.json` - Tokenizer configuration
    /// - `model.safetensors` - Model weights
    /// - `sentence_bert_config.json` - Optional, supplies `max_seq_length`
    pub fn load_from_dir(model_dir: &Path, max_seq_length: Option<usize>) -> anyhow::Result<Self> {
        let config_path = model_dir.join("config.json");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let weights_path = model_dir.join("model.safetensors");

        let config_json = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let tokenizer_json = fs::read_to_string(&tokenizer_path)
            .with_context(|| format!("Failed to read {}", tokenizer_path.display()))?;

        let model_weights = fs::read(&weights_path)
            .with_context(|| format!("Failed to read {}", weights_path.display()))?;

        let max_seq_length = match max_seq_length {
            Some(len) => Some(len),
            None => read_max_seq_length(model_dir)?,
        };

        Self::load(&config_json, &tokenizer_json, &model_weights, max_seq_length)
    }

    /// Load model from provided data (for cases where you have the data in memory).
    ///
    /// # Arguments
    /// * `config_json` - JSON string containing model config
    /// * `tokenizer_json` - JSON string containing tokenizer config
    /// * `model_weights` - Byte slice containing model weights (safetensors format)
    /// * `max_seq_length` - Truncation length, clamped to the model's position table
    pub fn load(
        config_json: &str,
        tokenizer_json: &str,
        model_weights: &[u8],
        max_seq_length: Option<usize>,
    ) -> anyhow::Result<Self> {
        let model = ModelManager::load(config_json, tokenizer_json, model_weights, max_seq_length)?;
        Ok(Self {
            model,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Change how many texts go through the encoder per forward pass.
    ///
    /// A size of zero is rejected at encode time.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Width of every embedding (the model's hidden size).
    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }

    pub fn max_seq_length(&self) -> usize {
        self.model.max_seq_length()
    }

    /// Encode a single text into a unit-length embedding vector.
    pub fn encode(&self, text: &str) -> anyhow::Result<Embedding> {
        self.model.encode_single(text)
    }

    /// Encode multiple texts, `batch_size` at a time.
    ///
    /// Returns one unit-length vector per input, in input order.
    pub fn encode_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Embedding>> {
        self.model.encode_batch(texts, self.batch_size)
    }
}

/// Read `max_seq_length` from `sentence_bert_config.json` if the file exists.
fn read_max_seq_length(model_dir: &Path) -> anyhow::Result<Option<usize>> {
    let path = model_dir.join("sentence_bert_config.json");
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: SentenceBertConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(config.max_seq_length)
}
