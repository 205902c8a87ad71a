use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use serde::Deserialize;
use std::collections::HashMap;
use tokenizers::{Tokenizer, TruncationParams};

use crate::embedding::l2_normalize;

/// Suffix of the position embedding table in BERT and RoBERTa checkpoints,
/// with or without a `bert.` / `roberta.` prefix.
const POSITION_EMBEDDINGS_SUFFIX: &str = "embeddings.position_embeddings.weight";

/// The parts of `config.json` that pooling, padding and truncation depend on.
///
/// candle's `bert::Config` keeps these fields private, so they are read
/// separately from the same document.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub hidden_size: usize,
    pub max_position_embeddings: usize,
    #[serde(default)]
    pub pad_token_id: u32,
    #[serde(default)]
    pub model_type: Option<String>,
}

impl ModelInfo {
    /// RoBERTa-style models number positions from `pad_token_id + 1`.
    fn is_roberta(&self) -> bool {
        matches!(
            self.model_type.as_deref(),
            Some("roberta" | "xlm-roberta" | "camembert")
        )
    }

    /// Number of leading rows in the position table that real tokens never use.
    pub fn position_offset(&self) -> usize {
        if self.is_roberta() {
            self.pad_token_id as usize + 1
        } else {
            0
        }
    }

    /// Longest token sequence the position table can address.
    pub fn max_positions(&self) -> usize {
        self.max_position_embeddings
            .saturating_sub(self.position_offset())
    }
}

/// A loaded sentence-transformer: tokenizer, encoder, mean pooling and
/// L2 normalization.
///
/// Inference only needs `&self`, so one instance can be shared across threads.
pub struct ModelManager {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    info: ModelInfo,
    max_seq_length: usize,
}

impl ModelManager {
    /// Build the model from the raw checkpoint files.
    ///
    /// # Arguments
    /// * `config_json` - JSON string containing model config
    /// * `tokenizer_json` - JSON string containing tokenizer config
    /// * `model_weights` - Byte array containing model weights (safetensors format)
    /// * `max_seq_length` - Truncation length; defaults to what the position table allows
    pub fn load(
        config_json: &str,
        tokenizer_json: &str,
        model_weights: &[u8],
        max_seq_length: Option<usize>,
    ) -> Result<Self> {
        // CPU only; the service has no GPU requirement.
        let device = Device::Cpu;

        let mut raw_config: serde_json::Value =
            serde_json::from_str(config_json).context("Failed to parse config.json")?;
        let info: ModelInfo = serde_json::from_value(raw_config.clone())
            .context("config.json is missing hidden_size or max_position_embeddings")?;

        let mut tensors = candle_core::safetensors::load_buffer(model_weights, &device)
            .context("Failed to read model weights")?;

        let offset = info.position_offset();
        if offset > 0 {
            shift_position_embeddings(&mut tensors, offset)?;
            raw_config["max_position_embeddings"] = serde_json::json!(info.max_positions());
            tracing::debug!(
                "Shifted position embeddings by {} for {:?} model",
                offset,
                info.model_type
            );
        }

        let config: Config =
            serde_json::from_value(raw_config).context("Unsupported model config")?;

        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);
        let model = BertModel::load(vb, &config).context("Failed to build encoder")?;

        let max_positions = info.max_positions();
        let max_seq_length = max_seq_length.unwrap_or(max_positions).min(max_positions);
        if max_seq_length == 0 {
            anyhow::bail!("max_seq_length must be at least 1");
        }

        let mut tokenizer = Tokenizer::from_bytes(tokenizer_json.as_bytes())
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        // Batches are padded here with the model's pad id, not by the tokenizer.
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_seq_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        tracing::info!(
            "Loaded {} model: dim={}, max_seq_length={}",
            info.model_type.as_deref().unwrap_or("bert"),
            info.hidden_size,
            max_seq_length
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            info,
            max_seq_length,
        })
    }

    /// Width of every embedding this model produces.
    pub fn dimension(&self) -> usize {
        self.info.hidden_size
    }

    pub fn max_seq_length(&self) -> usize {
        self.max_seq_length
    }

    /// Encode a single text into embedding vector
    pub fn encode_single(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.encode_chunk(&[text.to_string()])?;
        batch
            .pop()
            .context("Encoder returned no embedding for a single text")
    }

    /// Encode texts in consecutive batches of at most `batch_size`.
    ///
    /// Output order matches input order.
    pub fn encode_batch(&self, texts: &[String], batch_size: usize) -> Result<Vec<Vec<f32>>> {
        if batch_size == 0 {
            anyhow::bail!("batch_size must be at least 1");
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, chunk) in texts.chunks(batch_size).enumerate() {
            tracing::debug!("Encoding batch {} ({} texts)", i, chunk.len());
            embeddings.extend(self.encode_chunk(chunk)?);
        }
        Ok(embeddings)
    }

    /// Run one padded batch through the encoder.
    fn encode_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);
        if max_len == 0 {
            anyhow::bail!("Tokenizer produced no tokens");
        }

        let mut all_token_ids = Vec::with_capacity(encodings.len());
        let mut all_masks = Vec::with_capacity(encodings.len());

        for encoding in &encodings {
            let mut tokens = encoding.get_ids().to_vec();
            let mut mask = encoding.get_attention_mask().to_vec();
            tokens.resize(max_len, self.info.pad_token_id);
            mask.resize(max_len, 0);
            all_token_ids.push(tokens);
            all_masks.push(mask);
        }

        // Mask stays U32; BertModel converts it when building the extended mask.
        let token_ids = Tensor::new(all_token_ids, &self.device)?;
        let attention_mask = Tensor::new(all_masks, &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let output = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;

        let pooled = mean_pool(&output, &attention_mask)?;
        let mut rows: Vec<Vec<f32>> = pooled
            .to_vec2()
            .context("Failed to convert tensor to vec")?;

        for row in rows.iter_mut() {
            l2_normalize(row);
        }

        Ok(rows)
    }
}

/// Drop the first `offset` rows of every position embedding table so that
/// candle's zero-based position ids land on the rows RoBERTa would use.
fn shift_position_embeddings(tensors: &mut HashMap<String, Tensor>, offset: usize) -> Result<()> {
    let keys: Vec<String> = tensors
        .keys()
        .filter(|k| k.ends_with(POSITION_EMBEDDINGS_SUFFIX))
        .cloned()
        .collect();

    if keys.is_empty() {
        anyhow::bail!("Model weights have no {}", POSITION_EMBEDDINGS_SUFFIX);
    }

    for key in keys {
        let Some(table) = tensors.remove(&key) else {
            continue;
        };
        let rows = table.dim(0)?;
        if rows <= offset {
            anyhow::bail!(
                "Position table {} has {} rows, fewer than offset {}",
                key,
                rows,
                offset
            );
        }
        tensors.insert(key, table.narrow(0, offset, rows - offset)?);
    }

    Ok(())
}

/// Mean pooling: average token embeddings weighted by attention mask
///
/// token_embeddings: `[batch, seq_len, hidden]`, attention_mask: `[batch, seq_len]`.
/// Padding positions contribute nothing to the average.
///
/// See: https://www.sbert.net/docs/usage/computing_sentence_embeddings.html
fn mean_pool(token_embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, seq_len, hidden) = token_embeddings.dims3()?;
    let mask_expanded = attention_mask
        .to_dtype(DType::F32)?
        .unsqueeze(2)?
        .broadcast_as((batch, seq_len, hidden))?;

    let sum_embeddings = token_embeddings.mul(&mask_expanded)?.sum(1)?;

    // All-padding rows would otherwise divide by zero.
    let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

    Ok(sum_embeddings.broadcast_div(&sum_mask)?)
}
