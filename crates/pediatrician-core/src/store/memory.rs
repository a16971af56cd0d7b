//! In-memory [`VectorStore`] implementation for tests and ephemeral runs.
//!
//! Entries live in a `Vec` behind `std::sync::RwLock`. Search is
//! brute-force cosine similarity over every stored vector.

use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{IndexEntry, ScoredEntry};

use super::{rank_top_k, VectorStore};

struct StoredEntry {
    entry: IndexEntry,
    vector: Vec<f32>,
}

/// Non-persistent store. Contents vanish with the process.
pub struct InMemoryStore {
    entries: RwLock<Vec<StoredEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of every stored entry, in insertion order.
    pub fn entries(&self) -> Result<Vec<IndexEntry>> {
        let guard = self
            .entries
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        Ok(guard.iter().map(|s| s.entry.clone()).collect())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn add_entries(&self, entries: &[IndexEntry], vectors: &[Vec<f32>]) -> Result<()> {
        if entries.len() != vectors.len() {
            bail!(
                "got {} entries but {} vectors",
                entries.len(),
                vectors.len()
            );
        }
        let mut guard = self
            .entries
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        for (entry, vector) in entries.iter().zip(vectors.iter()) {
            guard.push(StoredEntry {
                entry: entry.clone(),
                vector: vector.clone(),
            });
        }
        Ok(())
    }

    async fn similarity_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredEntry>> {
        let guard = self
            .entries
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        let scored = guard
            .iter()
            .map(|s| ScoredEntry {
                id: s.entry.id.clone(),
                text: s.entry.text.clone(),
                score: cosine_similarity(query_vec, &s.vector),
            })
            .collect();
        Ok(rank_top_k(scored, k))
    }

    async fn count(&self) -> Result<usize> {
        let guard = self
            .entries
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        Ok(guard.len())
    }
}
