//! The seam between the HTTP layer and the model.

use semantic_embeddings::SemanticEmbeddings;

/// Anything that can turn texts into fixed-width vectors.
///
/// Implementations are called from tokio's blocking pool, so `encode` may do
/// heavy synchronous work.
pub trait TextEncoder: Send + Sync {
    /// Width of every vector returned by `encode`.
    fn dimension(&self) -> usize;

    /// Encode texts, returning one vector per input in input order.
    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

impl TextEncoder for SemanticEmbeddings {
    fn dimension(&self) -> usize {
        SemanticEmbeddings::dimension(self)
    }

    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.encode_batch(texts)
    }
}
