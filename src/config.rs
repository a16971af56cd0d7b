//! TOML configuration parsing and validation.
//!
//! Every section is optional. A missing file, or a missing key, falls back
//! to the defaults below, which reproduce the stock service: a `llama3`
//! model on a local Ollama, 1000/200 character chunks, and the top 3
//! passages per question.
//!
//! ```toml
//! [index]
//! path = "./vector_db"
//!
//! [knowledge_base]
//! path = "whattoexpectthefirstyear.txt"
//!
//! [chunking]
//! chunk_size = 1000
//! chunk_overlap = 200
//!
//! [retrieval]
//! k = 3
//!
//! [embedding]
//! url = "http://localhost:11434"
//! model = "llama3"
//! batch_size = 64
//!
//! [generation]
//! url = "http://localhost:11434"
//! model = "llama3"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//! proxy_headers = true
//! log_headers = false
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the SQLite database inside the index directory.
pub const INDEX_FILE_NAME: &str = "index.sqlite";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
    pub knowledge_base: KnowledgeBaseConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding the persisted index.
    pub path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./vector_db"),
        }
    }
}

impl IndexConfig {
    pub fn database_path(&self) -> PathBuf {
        self.path.join(INDEX_FILE_NAME)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    /// UTF-8 text file chunked on a cold start.
    pub path: PathBuf,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("whattoexpectthefirstyear.txt"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages placed into the prompt per question.
    pub k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: 3 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub url: String,
    pub model: String,
    /// Texts per `/api/embed` call while building the index.
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_model(),
            batch_size: 64,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub url: String,
    pub model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_model(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Trust `X-Forwarded-For` when logging the client address.
    pub proxy_headers: bool,
    /// Also log every request header.
    pub log_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            proxy_headers: true,
            log_headers: false,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

/// Parse and validate a configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but a missing file yields the validated defaults.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config(path);
    }
    tracing::info!(
        path = %path.display(),
        "config file not found, using built-in defaults"
    );
    let config = Config::default();
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        bail!("chunking.chunk_overlap must be smaller than chunking.chunk_size");
    }

    if config.retrieval.k < 1 {
        bail!("retrieval.k must be >= 1");
    }

    if config.embedding.batch_size < 1 {
        bail!("embedding.batch_size must be >= 1");
    }
    if config.embedding.model.trim().is_empty() {
        bail!("embedding.model must not be empty");
    }
    if config.generation.model.trim().is_empty() {
        bail!("generation.model must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_stock_service() {
        let config = Config::default();
        assert_eq!(config.index.path, PathBuf::from("./vector_db"));
        assert_eq!(
            config.index.database_path(),
            PathBuf::from("./vector_db/index.sqlite")
        );
        assert_eq!(
            config.knowledge_base.path,
            PathBuf::from("whattoexpectthefirstyear.txt")
        );
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.k, 3);
        assert_eq!(config.embedding.model, "llama3");
        assert_eq!(config.generation.model, "llama3");
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8000");
        assert!(config.server.proxy_headers);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[retrieval]
k = 5

[server]
port = 9000
"#,
        )
        .unwrap();
        assert_eq!(config.retrieval.k, 5);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.chunking.chunk_size, 1000);
    }

    #[test]
    fn test_rejects_overlap_not_below_size() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "[chunking]\nchunk_size = 100\nchunk_overlap = 100\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn test_rejects_zero_k() {
        let mut config = Config::default();
        config.retrieval.k = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_or_default(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.retrieval.k, 3);
    }
}
