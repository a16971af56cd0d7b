//! # Pediatrician Core
//!
//! Backend-agnostic logic for the AI Pediatrician: entry models, the
//! recursive text splitter, context-entry formatting, prompt assembly,
//! the vector store trait, and the embedding/generation backend traits.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem I/O. Concrete
//! backends (Ollama, SQLite) live in the `ai-pediatrician` app crate.

pub mod chunk;
pub mod context;
pub mod embedding;
pub mod models;
pub mod prompt;
pub mod store;
