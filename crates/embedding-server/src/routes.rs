//! Request handlers and their wire types.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

/// Body of `POST /embed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub texts: Vec<String>,
}

/// Response of `POST /embed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    /// One unit-length vector per input text, in request order
    pub embeddings: Vec<Vec<f32>>,
    /// Shared width of every vector
    pub dim: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Encode every text in the request.
///
/// Inference runs on the blocking pool so it doesn't stall the async workers.
pub async fn embed(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmbedRequest>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let count = request.texts.len();
    tracing::debug!("Embedding {} text(s)", count);

    let encoder = Arc::clone(&state.encoder);
    let embeddings =
        tokio::task::spawn_blocking(move || encoder.encode(&request.texts)).await??;

    if embeddings.len() != count {
        return Err(anyhow::anyhow!(
            "Encoder returned {} embeddings for {} texts",
            embeddings.len(),
            count
        )
        .into());
    }

    let dim = embeddings
        .first()
        .map(Vec::len)
        .unwrap_or_else(|| state.encoder.dimension());

    Ok(Json(EmbedResponse { embeddings, dim }))
}

/// Liveness check. Never touches the model.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
