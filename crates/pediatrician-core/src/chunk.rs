//! Recursive, boundary-aware text splitter.
//!
//! Splits the knowledge base into overlapping [`Chunk`]s of at most
//! `chunk_size` characters. The splitter prefers paragraph breaks, then
//! line breaks, then spaces, and only falls back to cutting between
//! individual characters when nothing coarser fits.
//!
//! # Algorithm
//!
//! 1. Pick the first separator (`"\n\n"`, `"\n"`, `" "`, `""`) that occurs in
//!    the text. The empty separator always matches.
//! 2. Split on it, keeping each separator attached to the start of the piece
//!    that follows it.
//! 3. Pieces shorter than `chunk_size` are buffered. Oversized pieces flush
//!    the buffer and are split again with the remaining separators.
//! 4. Buffered pieces are merged greedily into chunks. After emitting a chunk,
//!    pieces are dropped from the front of the buffer until at most
//!    `chunk_overlap` characters remain, so consecutive chunks share a tail.
//! 5. Every emitted chunk is whitespace-trimmed; empty chunks are dropped.
//!
//! Lengths are measured in Unicode scalar values, never bytes, so
//! multi-byte text is never cut inside a character.
//!
//! # Example
//!
//! ```rust
//! use pediatrician_core::chunk::RecursiveSplitter;
//!
//! let splitter = RecursiveSplitter::new(1000, 200).unwrap();
//! let chunks = splitter.split("Fevers are common in infants.\n\nMost are harmless.");
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].index, 0);
//! ```

use std::collections::VecDeque;

use anyhow::{bail, Result};

use crate::models::Chunk;

/// Separators tried in order, coarsest first.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    /// Create a splitter with the default separator list.
    ///
    /// Fails if `chunk_size` is zero or `chunk_overlap` is not smaller
    /// than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            bail!("chunk size must be > 0");
        }
        if chunk_overlap >= chunk_size {
            bail!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap,
                chunk_size
            );
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into chunks with contiguous indices starting at 0.
    ///
    /// Empty or whitespace-only input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        self.split_recursive(text, &self.separators)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { index, text })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        let (separator, remaining) = pick_separator(text, separators);

        let mut pending: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                out.extend(self.merge_pieces(&pending));
                pending.clear();
            }

            if remaining.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            } else {
                out.extend(self.split_recursive(piece, remaining));
            }
        }

        if !pending.is_empty() {
            out.extend(self.merge_pieces(&pending));
        }

        out
    }

    /// Greedily merge small pieces into chunks, carrying an overlap tail
    /// from one chunk into the next.
    ///
    /// Separators stay attached to the pieces, so pieces are joined with
    /// nothing in between.
    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                if let Some(doc) = join_trimmed(&current) {
                    docs.push(doc);
                }
                while !current.is_empty()
                    && (total > self.chunk_overlap || total + len > self.chunk_size)
                {
                    if let Some((_, dropped)) = current.pop_front() {
                        total -= dropped;
                    }
                }
            }

            current.push_back((piece, len));
            total += len;
        }

        if let Some(doc) = join_trimmed(&current) {
            docs.push(doc);
        }

        docs
    }
}

/// Return the first separator present in `text` and the finer separators
/// left to try after it.
fn pick_separator<'a>(text: &str, separators: &'a [String]) -> (&'a str, &'a [String]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return ("", &[]);
        }
        if text.contains(sep.as_str()) {
            return (sep.as_str(), &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Split on `separator`, attaching each occurrence to the start of the
/// following piece. An empty separator splits into single characters.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn join_trimmed(pieces: &VecDeque<(&str, usize)>) -> Option<String> {
    let joined: String = pieces.iter().map(|(p, _)| *p).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
