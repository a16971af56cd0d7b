//! Ollama backends for embedding and generation.
//!
//! - **[`OllamaEmbedder`]** calls `POST {url}/api/embed` with a batch of inputs.
//! - **[`OllamaGenerator`]** calls `POST {url}/api/generate` with `stream: false`.
//!
//! Neither retries and neither sets a request timeout: a slow model stalls
//! only the request waiting on it, and a failure surfaces immediately.
//! Connection failures map to [`PediatricianError::BackendUnavailable`];
//! non-success statuses and malformed bodies map to
//! [`PediatricianError::BackendResponse`].

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;

use pediatrician_core::embedding::{EmbeddingProvider, GenerationProvider};

use crate::config::{EmbeddingConfig, GenerationConfig};
use crate::error::PediatricianError;

/// Embedding backend backed by a local Ollama instance.
///
/// Requires Ollama to be running with the model pulled
/// (e.g. `ollama pull llama3`).
pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&body)
            .send()
            .await
            .map_err(|e| PediatricianError::unavailable("embedding", &self.url, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(PediatricianError::BackendResponse {
                backend: "embedding",
                status: status.as_u16(),
                body: body_text,
            }
            .into());
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            PediatricianError::BackendResponse {
                backend: "embedding",
                status: status.as_u16(),
                body: format!("invalid response body: {}", e),
            }
        })?;

        if parsed.embeddings.len() != texts.len() {
            return Err(anyhow!(
                "Ollama returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            ));
        }

        Ok(parsed.embeddings)
    }
}

/// Generation backend backed by a local Ollama instance.
pub struct OllamaGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl GenerationProvider for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.url))
            .json(&body)
            .send()
            .await
            .map_err(|e| PediatricianError::unavailable("generation", &self.url, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(PediatricianError::BackendResponse {
                backend: "generation",
                status: status.as_u16(),
                body: body_text,
            }
            .into());
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            PediatricianError::BackendResponse {
                backend: "generation",
                status: status.as_u16(),
                body: format!("invalid response body: {}", e),
            }
        })?;

        Ok(parsed.response)
    }
}
