//! Offline embedding service.
//!
//! Loads a sentence-transformer checkpoint from disk once, then serves
//! `POST /embed` and `GET /health`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use embedding_server::config::{DEFAULT_MODEL_DIR, DEFAULT_PORT};
use embedding_server::{router, AppState, ServerConfig};
use semantic_embeddings::{SemanticEmbeddings, DEFAULT_BATCH_SIZE};

#[derive(Parser, Debug)]
#[command(name = "embedding-server")]
#[command(about = "Offline sentence embedding service")]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT, env = "EMBED_PORT")]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "EMBED_BIND")]
    bind: String,

    /// Directory with config.json, tokenizer.json and model.safetensors
    #[arg(long, default_value = DEFAULT_MODEL_DIR, env = "EMBED_MODEL_DIR")]
    model_dir: PathBuf,

    /// Texts per encoder forward pass
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, env = "EMBED_BATCH_SIZE")]
    batch_size: usize,

    /// Truncate inputs to this many tokens (defaults to the model's own setting)
    #[arg(long, env = "EMBED_MAX_SEQ_LENGTH")]
    max_seq_length: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "embedding_server=info,semantic_embeddings=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::new(
        &cli.bind,
        cli.port,
        cli.model_dir,
        cli.batch_size,
        cli.max_seq_length,
    )?;

    tracing::info!("Loading embedding model from {} ...", config.model_dir.display());
    let model_dir = config.model_dir.clone();
    let max_seq_length = config.max_seq_length;
    let model = tokio::task::spawn_blocking(move || {
        SemanticEmbeddings::load_from_dir(&model_dir, max_seq_length)
    })
    .await?
    .context("Failed to load embedding model")?
    .with_batch_size(config.batch_size);
    tracing::info!(
        "Model loaded: dim={}, batch_size={}",
        model.dimension(),
        model.batch_size()
    );

    let state = Arc::new(AppState::new(Arc::new(model)));
    let app = router(state);

    tracing::info!("Starting embedding-server on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Embedding server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
