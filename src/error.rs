//! Classified failures.
//!
//! Most code propagates `anyhow::Error`. The variants here are the ones
//! callers need to tell apart: the HTTP layer downcasts to pick a status
//! code, and startup reports a missing knowledge base distinctly.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PediatricianError {
    /// The knowledge base file is absent and no persisted index exists.
    #[error("knowledge base file not found: {}", .0.display())]
    KnowledgeBaseMissing(PathBuf),

    /// The backend could not be reached at all.
    #[error("{backend} backend unavailable at {url}: {reason}")]
    BackendUnavailable {
        backend: &'static str,
        url: String,
        reason: String,
    },

    /// The backend answered with a non-success status or an unusable body.
    #[error("{backend} backend error {status}: {body}")]
    BackendResponse {
        backend: &'static str,
        status: u16,
        body: String,
    },
}

impl PediatricianError {
    pub fn unavailable(backend: &'static str, url: &str, err: &reqwest::Error) -> Self {
        PediatricianError::BackendUnavailable {
            backend,
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}
