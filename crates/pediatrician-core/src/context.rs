//! Formatting of user-supplied profile context into index entries.
//!
//! Context entries are plain sentences prefixed with the profile they
//! describe, so that they embed and retrieve like any other passage.
//! Profile names are not checked against any fixed list.

use crate::models::IndexEntry;

/// Optional free text submitted for one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileContext {
    pub profile: String,
    pub text: Option<String>,
}

impl ProfileContext {
    pub fn new(profile: impl Into<String>, text: Option<String>) -> Self {
        Self {
            profile: profile.into(),
            text,
        }
    }
}

/// A formatted context sentence ready to be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub profile: String,
    pub text: String,
}

impl ContextEntry {
    /// Source label recorded alongside the entry in the index.
    pub fn source(&self) -> String {
        format!("context:{}", self.profile)
    }

    pub fn to_index_entry(&self) -> IndexEntry {
        IndexEntry::new(self.text.clone(), self.source())
    }
}

/// Format every profile that carries non-blank text.
///
/// Input order is preserved. The submitted text is kept verbatim; only the
/// blank check trims it.
pub fn format_context_entries(profiles: &[ProfileContext]) -> Vec<ContextEntry> {
    profiles
        .iter()
        .filter_map(|p| {
            let text = p.text.as_deref()?;
            if text.trim().is_empty() {
                return None;
            }
            Some(ContextEntry {
                profile: p.profile.clone(),
                text: format!("User-provided context for {}: {}", p.profile, text),
            })
        })
        .collect()
}
