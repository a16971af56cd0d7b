//! SQLite-backed [`VectorStore`]: the persisted index.
//!
//! Each row holds an entry's text, bookkeeping columns and its embedding
//! as a little-endian `f32` BLOB. Search loads every vector and ranks by
//! cosine similarity in process.

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use pediatrician_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use pediatrician_core::models::{IndexEntry, ScoredEntry};
use pediatrician_core::store::{rank_top_k, VectorStore};

use crate::db;
use crate::migrate;

#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
    /// Embedding model recorded on every row this handle writes.
    model: String,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, model: impl Into<String>) -> Self {
        Self {
            pool,
            model: model.into(),
        }
    }

    /// Connect to `db_path` and ensure the schema exists.
    pub async fn open(db_path: &Path, model: impl Into<String>) -> Result<Self> {
        let pool = db::connect(db_path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self::new(pool, model))
    }

    /// Distinct embedding models present in the index.
    pub async fn stored_models(&self) -> Result<Vec<String>> {
        let models: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT model FROM entries ORDER BY model")
                .fetch_all(&self.pool)
                .await?;
        Ok(models)
    }

    /// Every stored entry, in insertion order.
    pub async fn entries(&self) -> Result<Vec<IndexEntry>> {
        let rows = sqlx::query(
            "SELECT id, text, hash, source, created_at FROM entries ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| IndexEntry {
                id: row.get("id"),
                text: row.get("text"),
                hash: row.get("hash"),
                source: row.get("source"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn add_entries(&self, entries: &[IndexEntry], vectors: &[Vec<f32>]) -> Result<()> {
        if entries.len() != vectors.len() {
            bail!(
                "got {} entries but {} vectors",
                entries.len(),
                vectors.len()
            );
        }

        let mut tx = self.pool.begin().await?;

        for (entry, vector) in entries.iter().zip(vectors.iter()) {
            sqlx::query(
                r#"
                INSERT INTO entries (id, text, hash, source, created_at, model, dims, embedding)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&entry.id)
            .bind(&entry.text)
            .bind(&entry.hash)
            .bind(&entry.source)
            .bind(entry.created_at)
            .bind(&self.model)
            .bind(vector.len() as i64)
            .bind(vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn similarity_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredEntry>> {
        let rows = sqlx::query("SELECT id, text, embedding FROM entries ORDER BY seq ASC")
            .fetch_all(&self.pool)
            .await?;

        let scored = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                ScoredEntry {
                    id: row.get("id"),
                    text: row.get("text"),
                    score: cosine_similarity(query_vec, &blob_to_vec(&blob)),
                }
            })
            .collect();

        Ok(rank_top_k(scored, k))
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
