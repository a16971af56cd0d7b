//! Vector index abstraction.
//!
//! The [`VectorStore`] trait is everything the loader, the context
//! ingestion path and the answerer need from an index: append entries with
//! their vectors, count them, and run nearest-neighbour search.
//!
//! Implementations must be `Send + Sync`; one instance is shared by every
//! request handler. Concurrent appends and searches rely on whatever
//! isolation the backend provides.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{IndexEntry, ScoredEntry};

/// Append-only vector index.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`add_entries`](VectorStore::add_entries) | Append entries with their embeddings |
/// | [`similarity_search`](VectorStore::similarity_search) | Top-k entries by cosine similarity |
/// | [`count`](VectorStore::count) | Number of stored entries |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append `entries`, pairing each with the vector at the same position.
    ///
    /// Fails without writing anything if the two slices differ in length.
    async fn add_entries(&self, entries: &[IndexEntry], vectors: &[Vec<f32>]) -> Result<()>;

    /// Return at most `k` entries ordered by descending similarity to
    /// `query_vec`. Ties keep insertion order.
    async fn similarity_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredEntry>>;

    /// Number of stored entries.
    async fn count(&self) -> Result<usize>;
}

/// Sort scored entries by descending score and keep the first `k`.
///
/// The sort is stable, so equal scores keep the order they were stored in.
pub fn rank_top_k(mut scored: Vec<ScoredEntry>, k: usize) -> Vec<ScoredEntry> {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);
    scored
}
