//! Drives the router in-process with stand-in encoders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use embedding_server::{router, AppState, EmbedResponse, HealthResponse, TextEncoder};
use semantic_embeddings::{l2_norm, l2_normalize};
use tower::ServiceExt;

const DIM: usize = 8;

/// Deterministic encoder: derives each vector from the text's bytes.
#[derive(Default)]
struct HashEncoder {
    calls: AtomicUsize,
}

impl TextEncoder for HashEncoder {
    fn dimension(&self) -> usize {
        DIM
    }

    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![1.0f32; DIM];
                for (i, b) in text.bytes().enumerate() {
                    v[i % DIM] += b as f32;
                }
                l2_normalize(&mut v);
                v
            })
            .collect())
    }
}

struct FailingEncoder;

impl TextEncoder for FailingEncoder {
    fn dimension(&self) -> usize {
        DIM
    }

    fn encode(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("Tokenization failed: boom")
    }
}

fn app(encoder: Arc<dyn TextEncoder>) -> Router {
    router(Arc::new(AppState::new(encoder)))
}

fn post_embed(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/embed")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_embed_returns_one_unit_vector_per_text() {
    let response = app(Arc::new(HashEncoder::default()))
        .oneshot(post_embed(r#"{"texts": ["a", "b"]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: EmbedResponse = body_json(response).await;
    assert_eq!(body.embeddings.len(), 2);
    assert_eq!(body.dim, DIM);
    for embedding in &body.embeddings {
        assert_eq!(embedding.len(), DIM);
        assert!((l2_norm(embedding) - 1.0).abs() < 1e-5);
    }
    assert_ne!(body.embeddings[0], body.embeddings[1]);
}

#[tokio::test]
async fn test_embed_empty_list_reports_model_width() {
    let response = app(Arc::new(HashEncoder::default()))
        .oneshot(post_embed(r#"{"texts": []}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: EmbedResponse = body_json(response).await;
    assert!(body.embeddings.is_empty());
    assert_eq!(body.dim, DIM);
}

#[tokio::test]
async fn test_embed_rejects_wrong_shape() {
    let response = app(Arc::new(HashEncoder::default()))
        .oneshot(post_embed(r#"{"text": "a"}"#))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_embed_rejects_non_string_items() {
    let response = app(Arc::new(HashEncoder::default()))
        .oneshot(post_embed(r#"{"texts": [1, 2]}"#))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_encoder_failure_is_internal_error() {
    let response = app(Arc::new(FailingEncoder))
        .oneshot(post_embed(r#"{"texts": ["a"]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("boom"));
}

#[tokio::test]
async fn test_health_is_static() {
    let encoder = Arc::new(HashEncoder::default());
    let response = app(encoder.clone())
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: HealthResponse = body_json(response).await;
    assert_eq!(body.status, "ok");
    assert_eq!(encoder.calls.load(Ordering::SeqCst), 0, "Health must not touch the model");
}

#[tokio::test]
async fn test_health_ok_even_when_model_fails() {
    let response = app(Arc::new(FailingEncoder))
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
