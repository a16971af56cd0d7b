//! Context ingestion: append profile notes to the live index.
//!
//! Formatted entries are embedded in one call and appended in one write.
//! Existing entries are never touched and nothing is re-chunked.

use anyhow::{bail, Result};

use pediatrician_core::context::{format_context_entries, ProfileContext};
use pediatrician_core::embedding::EmbeddingProvider;
use pediatrician_core::models::IndexEntry;
use pediatrician_core::store::VectorStore;

/// Result of [`add_context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddContextOutcome {
    /// These formatted texts were embedded and appended, in input order.
    Added(Vec<String>),
    /// Every profile was null, empty or whitespace; the index is unchanged.
    NothingToAdd,
}

impl AddContextOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            AddContextOutcome::Added(_) => "Context added successfully",
            AddContextOutcome::NothingToAdd => "No new context provided",
        }
    }
}

/// Embed and append every non-blank profile note.
///
/// Profile names are accepted as given. When nothing is left after
/// filtering, neither the embedding backend nor the store is called.
pub async fn add_context(
    store: &dyn VectorStore,
    embedder: &dyn EmbeddingProvider,
    profiles: &[ProfileContext],
) -> Result<AddContextOutcome> {
    let formatted = format_context_entries(profiles);
    if formatted.is_empty() {
        tracing::debug!("no non-empty context submitted");
        return Ok(AddContextOutcome::NothingToAdd);
    }

    let texts: Vec<String> = formatted.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed(&texts).await?;
    if vectors.len() != texts.len() {
        bail!(
            "embedding backend returned {} vectors for {} context entries",
            vectors.len(),
            texts.len()
        );
    }

    let entries: Vec<IndexEntry> = formatted.iter().map(|c| c.to_index_entry()).collect();
    store.add_entries(&entries, &vectors).await?;

    for c in &formatted {
        tracing::info!(profile = %c.profile, "added user context");
    }

    Ok(AddContextOutcome::Added(texts))
}
