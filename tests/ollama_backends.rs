//! The Ollama clients against a fake Ollama served by axum.

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use ai_pediatrician::config::{EmbeddingConfig, GenerationConfig};
use ai_pediatrician::ollama::{OllamaEmbedder, OllamaGenerator};
use ai_pediatrician::PediatricianError;
use pediatrician_core::embedding::{EmbeddingProvider, GenerationProvider};

type Seen = Arc<Mutex<Vec<Value>>>;

/// Serve a fake Ollama and return its base URL plus every request body it saw.
async fn fake_ollama(healthy: bool) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));

    let embed_seen = seen.clone();
    let generate_seen = seen.clone();
    let app = Router::new()
        .route(
            "/api/embed",
            post(move |Json(body): Json<Value>| {
                let seen = embed_seen.clone();
                async move {
                    let n = body["input"].as_array().map(|a| a.len()).unwrap_or(0);
                    seen.lock().unwrap().push(body);
                    if !healthy {
                        return (StatusCode::NOT_FOUND, Json(json!({"error": "model not found"})));
                    }
                    let embeddings: Vec<Vec<f32>> =
                        (0..n).map(|i| vec![i as f32, 1.0, 0.5]).collect();
                    (StatusCode::OK, Json(json!({ "embeddings": embeddings })))
                }
            }),
        )
        .route(
            "/api/generate",
            post(move |Json(body): Json<Value>| {
                let seen = generate_seen.clone();
                async move {
                    seen.lock().unwrap().push(body);
                    if !healthy {
                        return (StatusCode::NOT_FOUND, Json(json!({"error": "model not found"})));
                    }
                    (
                        StatusCode::OK,
                        Json(json!({"model": "llama3", "response": "Offer fluids.", "done": true})),
                    )
                }
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{}/", addr), seen)
}

fn embedder(url: &str) -> OllamaEmbedder {
    OllamaEmbedder::new(&EmbeddingConfig {
        url: url.to_string(),
        model: "llama3".to_string(),
        batch_size: 64,
    })
    .unwrap()
}

fn generator(url: &str) -> OllamaGenerator {
    OllamaGenerator::new(&GenerationConfig {
        url: url.to_string(),
        model: "llama3".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn test_embed_sends_batch_and_keeps_order() {
    let (url, seen) = fake_ollama(true).await;

    let vectors = embedder(&url)
        .embed(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors, vec![vec![0.0, 1.0, 0.5], vec![1.0, 1.0, 0.5]]);
    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["model"], "llama3");
    assert_eq!(requests[0]["input"], json!(["first", "second"]));
}

#[tokio::test]
async fn test_generate_is_non_streaming() {
    let (url, seen) = fake_ollama(true).await;

    let answer = generator(&url).generate("Why is my baby warm?").await.unwrap();

    assert_eq!(answer, "Offer fluids.");
    let requests = seen.lock().unwrap();
    assert_eq!(requests[0]["prompt"], "Why is my baby warm?");
    assert_eq!(requests[0]["stream"], false);
}

#[tokio::test]
async fn test_error_status_is_backend_response() {
    let (url, _) = fake_ollama(false).await;

    let err = generator(&url).generate("anything").await.unwrap_err();
    match err.downcast_ref::<PediatricianError>() {
        Some(PediatricianError::BackendResponse {
            backend,
            status,
            body,
        }) => {
            assert_eq!(*backend, "generation");
            assert_eq!(*status, 404);
            assert!(body.contains("model not found"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let err = embedder(&url)
        .embed(&["anything".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PediatricianError>(),
        Some(PediatricianError::BackendResponse { status: 404, .. })
    ));
}
