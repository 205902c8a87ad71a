use once_cell::sync::Lazy;
use semantic_embeddings::SemanticEmbeddings;
use std::path::PathBuf;

/// Directory holding a downloaded checkpoint (e.g. the output of `model-fetch`).
///
/// Model-backed tests are skipped when this is unset, since the weights are
/// too large to check in.
pub const MODEL_DIR_ENV: &str = "EMBEDDING_TEST_MODEL_DIR";

// Shared model instance loaded once for all tests (improves test performance)
pub static TEST_MODEL: Lazy<Option<SemanticEmbeddings>> = Lazy::new(|| {
    let model_dir = PathBuf::from(std::env::var_os(MODEL_DIR_ENV)?);
    let model = SemanticEmbeddings::load_from_dir(&model_dir, None)
        .expect("Failed to load model from EMBEDDING_TEST_MODEL_DIR");
    Some(model)
});

/// Returns the shared model, or `None` (after logging why) when no model is configured.
pub fn test_model() -> Option<&'static SemanticEmbeddings> {
    let model = TEST_MODEL.as_ref();
    if model.is_none() {
        eprintln!("{} not set, skipping model-backed test", MODEL_DIR_ENV);
    }
    model
}
