//! Offline sentence-embedding HTTP service.
//!
//! Provides:
//! - `POST /embed` - encode a list of texts into unit-length vectors
//! - `GET /health` - static liveness check
//!
//! The model is loaded once at startup and handed to the handlers through
//! [`AppState`]. The service never reaches out to the network.

pub mod config;
pub mod encoder;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ServerConfig};
pub use encoder::TextEncoder;
pub use error::ApiError;
pub use routes::{EmbedRequest, EmbedResponse, HealthResponse};

/// Shared application state
pub struct AppState {
    pub encoder: Arc<dyn TextEncoder>,
}

impl AppState {
    pub fn new(encoder: Arc<dyn TextEncoder>) -> Self {
        Self { encoder }
    }
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/embed", post(routes::embed))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
