//! Data types that flow between the loader, the ingestion path and the
//! answerer.

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Source label for entries produced by chunking the knowledge base.
pub const KNOWLEDGE_BASE_SOURCE: &str = "knowledge_base";

/// A slice of the source document produced by the splitter.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// A single row of the vector index: a document chunk or a context entry.
///
/// Retrieval only ever looks at `text`; the remaining fields are
/// bookkeeping for the persisted index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Opaque UUID.
    pub id: String,
    pub text: String,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
    /// `knowledge_base` or `context:<profile>`.
    pub source: String,
    /// Unix seconds.
    pub created_at: i64,
}

impl IndexEntry {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: Uuid::new_v4().to_string(),
            hash: content_hash(&text),
            text,
            source: source.into(),
            created_at: Utc::now().timestamp(),
        }
    }

    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self::new(chunk.text.clone(), KNOWLEDGE_BASE_SOURCE)
    }
}

/// An entry returned from similarity search with its cosine score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredEntry {
    pub id: String,
    pub text: String,
    pub score: f32,
}

/// Hex-encoded SHA-256 of a text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
