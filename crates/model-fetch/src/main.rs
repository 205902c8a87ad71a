//! model-fetch: download a sentence-transformer checkpoint once so the
//! embedding server can run offline.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use semantic_embeddings::SemanticEmbeddings;

use model_fetch::{
    default_cache_root, fetch_model, model_cache_dir, offline_mode_from_env, HubSource,
    DEFAULT_ENDPOINT, DEFAULT_REPO,
};

#[derive(Parser, Debug)]
#[command(name = "model-fetch")]
#[command(about = "Pre-download a sentence-transformer model into the local cache")]
struct Args {
    /// Hugging Face model repository
    #[arg(long, default_value = DEFAULT_REPO, env = "MODEL_REPO")]
    repo: String,

    /// Branch, tag or commit to download
    #[arg(long, default_value = "main")]
    revision: String,

    /// Cache root; the model lands in <cache-dir>/<org>_<name>
    #[arg(long, env = "SENTENCE_TRANSFORMERS_HOME")]
    cache_dir: Option<PathBuf>,

    /// Write the model into exactly this directory instead of the cache
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Hub endpoint (for mirrors)
    #[arg(long, default_value = DEFAULT_ENDPOINT, env = "HF_ENDPOINT")]
    endpoint: String,

    /// Load the model after downloading to make sure it is usable
    #[arg(long)]
    verify: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let model_dir = match args.output_dir {
        Some(dir) => dir,
        None => {
            let root = args.cache_dir.unwrap_or_else(default_cache_root);
            model_cache_dir(&root, &args.repo)
        }
    };

    let offline = offline_mode_from_env();
    if offline {
        info!("Offline mode enabled; only checking the cache");
    }

    let source = HubSource::new(args.endpoint, args.repo, args.revision);
    let dir = fetch_model(&source, &model_dir, offline).await?;

    info!("Model directory: {}", dir.display());

    if args.verify {
        let model_dir = dir.clone();
        let model = tokio::task::spawn_blocking(move || {
            SemanticEmbeddings::load_from_dir(&model_dir, None)
        })
        .await?
        .context("Downloaded model failed to load")?;
        info!("Model verified: dim={}", model.dimension());
    }

    println!("Model downloaded successfully.");
    Ok(())
}
