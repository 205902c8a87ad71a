//! Model downloading from Hugging Face.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// Default Hugging Face endpoint; `HF_ENDPOINT` points elsewhere for mirrors.
pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// Default model repository
pub const DEFAULT_REPO: &str = "sentence-transformers/all-distilroberta-v1";

/// Files a sentence-transformer checkpoint needs, relative to the repo root.
pub const MODEL_FILES: &[&str] = &[
    "config.json",
    "tokenizer.json",
    "tokenizer_config.json",
    "special_tokens_map.json",
    "vocab.json",
    "merges.txt",
    "modules.json",
    "sentence_bert_config.json",
    "1_Pooling/config.json",
    "model.safetensors",
];

/// Where a model is fetched from.
#[derive(Debug, Clone)]
pub struct HubSource {
    pub endpoint: String,
    pub repo: String,
    pub revision: String,
}

impl HubSource {
    pub fn new(endpoint: impl Into<String>, repo: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            repo: repo.into(),
            revision: revision.into(),
        }
    }

    /// Download URL for one file of the repo.
    pub fn file_url(&self, file: &str) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.repo,
            self.revision,
            file
        )
    }
}

impl Default for HubSource {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, DEFAULT_REPO, "main")
    }
}

/// Directory inside `cache_root` that holds `repo`, named the way
/// sentence-transformers names its cache folders (`org_name`).
pub fn model_cache_dir(cache_root: &Path, repo: &str) -> PathBuf {
    cache_root.join(repo.replace('/', "_"))
}

/// Make sure every model file is present in `model_dir`, downloading what is missing.
///
/// With `offline` set nothing is downloaded: the call succeeds only if the
/// cache is already complete.
///
/// Returns the path to the model directory.
pub async fn fetch_model(source: &HubSource, model_dir: &Path, offline: bool) -> Result<PathBuf> {
    let missing = missing_model_files(model_dir).await;
    if missing.is_empty() {
        tracing::info!("Model already cached at {}", model_dir.display());
        return Ok(model_dir.to_path_buf());
    }

    if offline {
        anyhow::bail!(
            "Offline mode is enabled and {} is missing: {}",
            model_dir.display(),
            missing.join(", ")
        );
    }

    if !model_dir.exists() {
        fs::create_dir_all(model_dir).await?;
        tracing::info!("Created model directory: {}", model_dir.display());
    }

    tracing::info!("Downloading {} from {}...", source.repo, source.endpoint);

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;

    for file in missing {
        let dest_path = model_dir.join(file);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        tracing::debug!("GET {}", source.file_url(file));
        let bytes = download_file(&client, &source.file_url(file), &dest_path)
            .await
            .with_context(|| format!("Failed to download {}", file))?;
        tracing::info!("Downloaded {} ({} bytes)", file, bytes);
    }

    strip_tokenizer_padding(model_dir).await?;

    tracing::info!("Model download complete!");
    Ok(model_dir.to_path_buf())
}

/// Model files that are absent or empty.
async fn missing_model_files(model_dir: &Path) -> Vec<&'static str> {
    let mut missing = Vec::new();
    for file in MODEL_FILES {
        match fs::metadata(model_dir.join(file)).await {
            Ok(meta) if meta.len() > 0 => continue,
            _ => missing.push(*file),
        }
    }
    missing
}

/// Percent between two progress lines.
const PROGRESS_STEP: u64 = 10;

/// Files smaller than this are not worth progress lines.
const PROGRESS_MIN_BYTES: u64 = 1_000_000;

/// Byte count and progress logging for one download.
struct Progress<'a> {
    name: &'a str,
    total: Option<u64>,
    received: u64,
    next_step: u64,
}

impl<'a> Progress<'a> {
    fn new(name: &'a str, total: Option<u64>) -> Self {
        Self {
            name,
            total: total.filter(|&t| t >= PROGRESS_MIN_BYTES),
            received: 0,
            next_step: PROGRESS_STEP,
        }
    }

    fn advance(&mut self, bytes: usize) {
        self.received += bytes as u64;
        let Some(total) = self.total else { return };

        let percent = self.received.saturating_mul(100) / total;
        if percent >= self.next_step {
            tracing::info!(
                "  {}: {}% ({} / {} bytes)",
                self.name,
                percent,
                self.received,
                total
            );
            self.next_step = (percent / PROGRESS_STEP + 1) * PROGRESS_STEP;
        }
    }
}

/// Stream one file to disk and return the number of bytes written.
///
/// Bytes go to `<dest>.incomplete`, which is renamed to `dest` only once the
/// body is complete. A body shorter than the advertised length is an error.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> Result<u64> {
    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .with_context(|| format!("HTTP error downloading {}", url))?;

    let expected = response.content_length();
    let name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");
    let mut progress = Progress::new(name, expected);

    let partial = partial_path(dest);
    let mut out = File::create(&partial)
        .await
        .with_context(|| format!("Failed to create {}", partial.display()))?;

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.with_context(|| format!("Connection lost while downloading {}", url))?;
        out.write_all(&chunk).await?;
        progress.advance(chunk.len());
    }
    out.sync_all().await?;
    drop(out);

    if let Some(expected) = expected {
        if progress.received != expected {
            anyhow::bail!(
                "{} ended after {} of {} bytes",
                url,
                progress.received,
                expected
            );
        }
    }

    fs::rename(&partial, dest)
        .await
        .with_context(|| format!("Failed to move {} into place", partial.display()))?;
    tracing::debug!("Wrote {} ({} bytes)", dest.display(), progress.received);
    Ok(progress.received)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".incomplete");
    PathBuf::from(name)
}

/// Drop a fixed `padding` block from `tokenizer.json`.
///
/// Embeddings are computed on batches padded to their longest member, and a
/// fixed pad length changes candle's output even under the attention mask.
/// Returns whether the file was rewritten.
async fn strip_tokenizer_padding(model_dir: &Path) -> Result<bool> {
    let path = model_dir.join("tokenizer.json");
    let raw = fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut tokenizer: serde_json::Value = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let removed = match tokenizer.as_object_mut() {
        Some(fields) => fields.remove("padding").is_some_and(|p| !p.is_null()),
        None => false,
    };
    if !removed {
        tracing::debug!("{} has no fixed padding", path.display());
        return Ok(false);
    }

    tracing::info!("Removed fixed padding from {}", path.display());
    fs::write(&path, serde_json::to_vec_pretty(&tokenizer)?).await?;
    Ok(true)
}
