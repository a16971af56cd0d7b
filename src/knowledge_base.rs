//! Knowledge base loading: open the persisted index, or build it.
//!
//! On a warm start (index file present with at least one entry) the
//! source document is never read and nothing is embedded. On a cold start
//! the document is split with [`RecursiveSplitter`], embedded in batches
//! of `embedding.batch_size`, and written in a single transaction, so a
//! failed build leaves the index empty rather than half-filled.

use anyhow::{Context, Result};
use std::path::Path;

use pediatrician_core::chunk::RecursiveSplitter;
use pediatrician_core::embedding::EmbeddingProvider;
use pediatrician_core::models::IndexEntry;
use pediatrician_core::store::VectorStore;

use crate::config::Config;
use crate::error::PediatricianError;
use crate::sqlite_store::SqliteStore;

/// How [`load`] obtained the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// An existing, non-empty index was opened as is.
    Opened { entries: usize },
    /// The index was built from the knowledge base file.
    Built { chunks: usize },
}

/// Open the configured index, building it from the knowledge base first
/// if it is absent or empty.
///
/// # Errors
///
/// - [`PediatricianError::KnowledgeBaseMissing`] if a build is needed and
///   the source file does not exist.
/// - [`PediatricianError::BackendUnavailable`] if the embedding backend
///   cannot be reached during a build.
pub async fn load(
    config: &Config,
    embedder: &dyn EmbeddingProvider,
) -> Result<(SqliteStore, LoadOutcome)> {
    let db_path = config.index.database_path();
    tracing::info!(index = %db_path.display(), "preparing vector index");

    if db_path.exists() {
        let store = SqliteStore::open(&db_path, embedder.model_name()).await?;
        let entries = store.count().await?;
        if entries > 0 {
            let models = store.stored_models().await?;
            if models.iter().any(|m| m != embedder.model_name()) {
                tracing::warn!(
                    stored = ?models,
                    configured = embedder.model_name(),
                    "index was built with a different embedding model"
                );
            }
            tracing::info!(entries, "loaded existing vector index");
            return Ok((store, LoadOutcome::Opened { entries }));
        }
        tracing::info!("index file exists but is empty, rebuilding");
        let text = read_knowledge_base(&config.knowledge_base.path)?;
        let chunks = build(config, &store, embedder, &text).await?;
        return Ok((store, LoadOutcome::Built { chunks }));
    }

    // Read the source before creating the database so a missing file
    // leaves no empty index behind.
    let text = read_knowledge_base(&config.knowledge_base.path)?;
    let store = SqliteStore::open(&db_path, embedder.model_name()).await?;
    let chunks = build(config, &store, embedder, &text).await?;
    Ok((store, LoadOutcome::Built { chunks }))
}

async fn build(
    config: &Config,
    store: &dyn VectorStore,
    embedder: &dyn EmbeddingProvider,
    text: &str,
) -> Result<usize> {
    tracing::info!(
        source = %config.knowledge_base.path.display(),
        "creating new vector index from knowledge base"
    );
    let splitter =
        RecursiveSplitter::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
    let chunks = build_index(
        store,
        embedder,
        &splitter,
        text,
        config.embedding.batch_size,
    )
    .await?;
    tracing::info!(chunks, "vector index created");
    Ok(chunks)
}

/// Split `text`, embed every chunk and append them all to `store`.
///
/// Returns the number of chunks written. Nothing is written unless every
/// batch embeds successfully.
pub async fn build_index(
    store: &dyn VectorStore,
    embedder: &dyn EmbeddingProvider,
    splitter: &RecursiveSplitter,
    text: &str,
    batch_size: usize,
) -> Result<usize> {
    let chunks = splitter.split(text);
    if chunks.is_empty() {
        tracing::warn!("knowledge base is empty, index will only hold user context");
        return Ok(0);
    }

    let entries: Vec<IndexEntry> = chunks.iter().map(IndexEntry::from_chunk).collect();
    let texts: Vec<String> = chunks.into_iter().map(|c| c.text).collect();

    let mut vectors = Vec::with_capacity(texts.len());
    let total_batches = texts.len().div_ceil(batch_size.max(1));
    for (i, batch) in texts.chunks(batch_size.max(1)).enumerate() {
        tracing::debug!(batch = i + 1, total_batches, "embedding chunk batch");
        let batch_vectors = embedder
            .embed(batch)
            .await
            .with_context(|| format!("embedding batch {}/{} failed", i + 1, total_batches))?;
        vectors.extend(batch_vectors);
    }

    store.add_entries(&entries, &vectors).await?;
    Ok(entries.len())
}

fn read_knowledge_base(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PediatricianError::KnowledgeBaseMissing(path.to_path_buf()).into())
        }
        Err(e) => Err(e)
            .with_context(|| format!("Failed to read knowledge base: {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pediatrician_core::store::memory::InMemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        fn model_name(&self) -> &str {
            "counting"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(PediatricianError::BackendUnavailable {
                backend: "embedding",
                url: "http://localhost:11434".into(),
                reason: "connection refused".into(),
            }
            .into())
        }
    }

    fn long_text() -> String {
        (0..40)
            .map(|i| format!("Paragraph {} about infant sleep and feeding.", i))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[tokio::test]
    async fn test_build_batches_embedding_calls() {
        let store = InMemoryStore::new();
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
        };
        let splitter = RecursiveSplitter::new(100, 20).unwrap();

        let written = build_index(&store, &embedder, &splitter, &long_text(), 4)
            .await
            .unwrap();

        assert!(written > 4);
        assert_eq!(store.count().await.unwrap(), written);
        assert_eq!(
            embedder.calls.load(Ordering::SeqCst),
            written.div_ceil(4)
        );
        let entries = store.entries().unwrap();
        assert!(entries.iter().all(|e| e.source == "knowledge_base"));
    }

    #[tokio::test]
    async fn test_failed_embedding_writes_nothing() {
        let store = InMemoryStore::new();
        let splitter = RecursiveSplitter::new(100, 20).unwrap();

        let err = build_index(&store, &FailingEmbedder, &splitter, &long_text(), 4)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PediatricianError>(),
            Some(PediatricianError::BackendUnavailable { .. })
        ));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_knowledge_base_builds_nothing() {
        let store = InMemoryStore::new();
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
        };
        let splitter = RecursiveSplitter::new(100, 20).unwrap();

        let written = build_index(&store, &embedder, &splitter, "  \n", 4)
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_file_is_classified() {
        let err = read_knowledge_base(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PediatricianError>(),
            Some(PediatricianError::KnowledgeBaseMissing(_))
        ));
    }
}
