//! Server configuration, validated from the command line.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8087;

/// Default model directory, relative to the working directory.
pub const DEFAULT_MODEL_DIR: &str = "./all-distilroberta-v1";

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub addr: SocketAddr,
    /// Directory containing config.json, tokenizer.json and model.safetensors
    pub model_dir: PathBuf,
    /// Texts per encoder forward pass
    pub batch_size: usize,
    /// Overrides the checkpoint's own truncation length
    pub max_seq_length: Option<usize>,
}

impl ServerConfig {
    pub fn new(
        bind: &str,
        port: u16,
        model_dir: PathBuf,
        batch_size: usize,
        max_seq_length: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let ip: IpAddr = bind
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(bind.to_string()))?;
        let addr = SocketAddr::new(ip, port);

        if batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }

        if max_seq_length == Some(0) {
            return Err(ConfigError::ZeroSeqLength);
        }

        if !model_dir.is_dir() {
            return Err(ConfigError::MissingModelDir(model_dir));
        }

        Ok(Self {
            addr,
            model_dir,
            batch_size,
            max_seq_length,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    #[error("max sequence length must be at least 1")]
    ZeroSeqLength,

    #[error("Model directory not found: {} (run model-fetch first; the server does not download)", .0.display())]
    MissingModelDir(PathBuf),
}
