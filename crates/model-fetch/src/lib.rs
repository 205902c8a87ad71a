//! Cache warming for sentence-transformer checkpoints.
//!
//! This crate handles:
//! - Resolving the local cache directory for a Hugging Face repo
//! - Downloading the checkpoint files that are not cached yet
//! - Honouring the hub's offline switches

mod download;

use std::path::PathBuf;

pub use download::{
    fetch_model, model_cache_dir, HubSource, DEFAULT_ENDPOINT, DEFAULT_REPO, MODEL_FILES,
};

/// Environment variables that force offline mode, as understood by the
/// Hugging Face libraries.
pub const OFFLINE_ENV_VARS: &[&str] = &["HF_HUB_OFFLINE", "TRANSFORMERS_OFFLINE"];

/// Whether any offline switch is set in the process environment.
pub fn offline_mode_from_env() -> bool {
    offline_mode(|name| std::env::var(name).ok())
}

/// Whether any offline switch is set, reading variables through `lookup`.
pub fn offline_mode(lookup: impl Fn(&str) -> Option<String>) -> bool {
    OFFLINE_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .any(|value| is_truthy(&value))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Default cache root: `<platform cache dir>/sentence-transformers`.
///
/// Falls back to `./.cache/sentence-transformers` when the platform has no
/// cache directory.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("sentence-transformers")
}
