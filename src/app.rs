//! The single application context shared by every request.
//!
//! [`AppContext`] bundles the index with both backend handles and the
//! retrieval depth. It is built once at startup and handed to handlers
//! behind an `Arc`; there is no global state.

use anyhow::Result;
use std::sync::Arc;

use pediatrician_core::context::ProfileContext;
use pediatrician_core::embedding::{EmbeddingProvider, GenerationProvider};
use pediatrician_core::store::VectorStore;

use crate::answer;
use crate::config::Config;
use crate::ingest::{self, AddContextOutcome};
use crate::knowledge_base::{self, LoadOutcome};
use crate::ollama::{OllamaEmbedder, OllamaGenerator};

#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub generator: Arc<dyn GenerationProvider>,
    /// Passages retrieved per question.
    pub k: usize,
}

impl AppContext {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        k: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            k,
        }
    }

    /// Load (or build) the persisted index with the given backends.
    pub async fn load(
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Result<(Self, LoadOutcome)> {
        let (store, outcome) = knowledge_base::load(config, embedder.as_ref()).await?;
        let ctx = Self::new(Arc::new(store), embedder, generator, config.retrieval.k);
        Ok((ctx, outcome))
    }

    /// Load the index using the Ollama backends named in `config`.
    pub async fn from_config(config: &Config) -> Result<(Self, LoadOutcome)> {
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(OllamaEmbedder::new(&config.embedding)?);
        let generator: Arc<dyn GenerationProvider> =
            Arc::new(OllamaGenerator::new(&config.generation)?);
        Self::load(config, embedder, generator).await
    }

    pub async fn answer(&self, question: &str) -> Result<String> {
        answer::answer(
            self.store.as_ref(),
            self.embedder.as_ref(),
            self.generator.as_ref(),
            question,
            self.k,
        )
        .await
    }

    pub async fn add_context(&self, profiles: &[ProfileContext]) -> Result<AddContextOutcome> {
        ingest::add_context(self.store.as_ref(), self.embedder.as_ref(), profiles).await
    }
}
