//! Retrieval-augmented answering.
//!
//! One question produces exactly one query embedding, one similarity
//! search and one generation call. Nothing is cached or retried.

use anyhow::Result;

use pediatrician_core::embedding::{embed_query, EmbeddingProvider, GenerationProvider};
use pediatrician_core::models::ScoredEntry;
use pediatrician_core::prompt::{build_prompt, join_context};
use pediatrician_core::store::VectorStore;

/// The `k` entries most similar to `question`, best first.
pub async fn retrieve(
    store: &dyn VectorStore,
    embedder: &dyn EmbeddingProvider,
    question: &str,
    k: usize,
) -> Result<Vec<ScoredEntry>> {
    let query_vec = embed_query(embedder, question).await?;
    store.similarity_search(&query_vec, k).await
}

/// Answer `question` from the top `k` passages.
///
/// Any string is accepted, including an empty one; what the model makes of
/// it is up to the model.
pub async fn answer(
    store: &dyn VectorStore,
    embedder: &dyn EmbeddingProvider,
    generator: &dyn GenerationProvider,
    question: &str,
    k: usize,
) -> Result<String> {
    let hits = retrieve(store, embedder, question, k).await?;
    tracing::debug!(
        retrieved = hits.len(),
        top_score = hits.first().map(|h| h.score),
        "retrieved passages"
    );

    let prompt = build_prompt(&join_context(&hits), question);
    generator.generate(&prompt).await
}
