//! # AI Pediatrician
//!
//! A retrieval-augmented pediatric advice service. A reference book is
//! chunked and embedded into a persistent vector index; questions are
//! answered by a language model from the passages most similar to them.
//! Parents can add notes about their children, which land in the same
//! index and are retrieved like any other passage.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐
//! │ Knowledge    │──▶│ Split+Embed  │──▶│ SQLite index  │
//! │ base (.txt)  │   │ (Ollama)     │   │ text + vector │
//! └──────────────┘   └──────────────┘   └──────┬────────┘
//!                                              │
//!                       ┌──────────────────────┤
//!                       ▼                      ▼
//!                ┌──────────────┐       ┌──────────────┐
//!                │ /add_context │       │ /ask         │
//!                │ append notes │       │ top-k + LLM  │
//!                └──────────────┘       └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with stock defaults |
//! | [`error`] | Classified failures (missing source, backend down) |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Index schema |
//! | [`sqlite_store`] | Persisted [`VectorStore`](pediatrician_core::store::VectorStore) |
//! | [`ollama`] | Ollama embedding and generation backends |
//! | [`knowledge_base`] | Open or build the index at startup |
//! | [`ingest`] | Append profile context entries |
//! | [`answer`] | Retrieve, fill the prompt, generate |
//! | [`app`] | Shared application context |
//! | [`server`] | Axum HTTP facade with CORS and request logging |

pub mod answer;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod knowledge_base;
pub mod migrate;
pub mod ollama;
pub mod server;
pub mod sqlite_store;

pub use app::AppContext;
pub use error::PediatricianError;
