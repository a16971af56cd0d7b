//! Deterministic stand-ins for the Ollama backends.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use ai_pediatrician::config::Config;
use ai_pediatrician::PediatricianError;
use pediatrician_core::embedding::{EmbeddingProvider, GenerationProvider};
use tempfile::TempDir;

const DIMS: usize = 64;

/// Bag-of-words embedder: each lowercase word is hashed into one of 64
/// buckets. Texts that share words end up close under cosine similarity.
#[derive(Default)]
pub struct StubEmbedder {
    calls: AtomicUsize,
    texts: AtomicUsize,
}

impl StubEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts_embedded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

fn bucket(word: &str) -> usize {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in word.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    (h % DIMS as u64) as usize
}

pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn model_name(&self) -> &str {
        "stub-embed"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0f32; DIMS];
                for w in words(t) {
                    v[bucket(&w)] += 1.0;
                }
                v
            })
            .collect())
    }
}

/// Generator that only answers from its prompt's context.
///
/// Returns the first context line mentioning a significant question word,
/// or "I don't know" when there is none. Every prompt is recorded.
#[derive(Default)]
pub struct StubGenerator {
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> String {
        self.prompts().last().cloned().unwrap_or_default()
    }
}

fn section<'a>(prompt: &'a str, start: &str, end: &str) -> &'a str {
    let from = prompt.find(start).map(|i| i + start.len()).unwrap_or(0);
    let to = prompt[from..]
        .find(end)
        .map(|i| from + i)
        .unwrap_or(prompt.len());
    &prompt[from..to]
}

#[async_trait]
impl GenerationProvider for StubGenerator {
    fn model_name(&self) -> &str {
        "stub-generate"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let context = section(prompt, "Context:\n", "Question:\n");
        let question = section(prompt, "Question:\n", "Answer:");
        let keywords: Vec<String> = words(question)
            .into_iter()
            .filter(|w| w.len() >= 5)
            .collect();

        for line in context.lines() {
            let line_words = words(line);
            if keywords.iter().any(|k| line_words.contains(k)) {
                return Ok(line.trim().to_string());
            }
        }
        Ok("I don't know".to_string())
    }
}

/// Embedder whose backend is never reachable. Calls are still counted.
#[derive(Default)]
pub struct DownEmbedder {
    calls: AtomicUsize,
}

impl DownEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for DownEmbedder {
    fn model_name(&self) -> &str {
        "stub-embed"
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PediatricianError::BackendUnavailable {
            backend: "embedding",
            url: "http://localhost:11434".into(),
            reason: "connection refused".into(),
        }
        .into())
    }
}

/// Generator whose backend is never reachable.
pub struct DownGenerator;

#[async_trait]
impl GenerationProvider for DownGenerator {
    fn model_name(&self) -> &str {
        "down"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(PediatricianError::BackendUnavailable {
            backend: "generation",
            url: "http://localhost:11434".into(),
            reason: "connection refused".into(),
        }
        .into())
    }
}

pub const FEVER_PARAGRAPH: &str = "Fevers are common in infants and are usually caused by viral \
infections such as colds. A fever is the body's way of fighting infection.";

pub const CORPUS: &[&str] = &[
    FEVER_PARAGRAPH,
    "Teething usually begins around six months. Chewing on a cool ring can soothe sore gums.",
    "Newborns sleep sixteen to seventeen hours a day in short stretches of two to four hours.",
    "Breast milk or formula provides all the nutrition a baby needs for the first six months.",
];

/// Config rooted in a temp dir, with the corpus written as the knowledge
/// base and chunks small enough that each paragraph is its own chunk.
pub fn test_config(tmp: &TempDir) -> Config {
    let root = tmp.path();
    let kb_path = root.join("whattoexpectthefirstyear.txt");
    std::fs::write(&kb_path, CORPUS.join("\n\n")).unwrap();

    let mut config = Config::default();
    config.index.path = root.join("vector_db");
    config.knowledge_base.path = kb_path;
    config.chunking.chunk_size = 150;
    config.chunking.chunk_overlap = 30;
    config.embedding.batch_size = 2;
    config.server.host = "127.0.0.1".into();
    config.server.port = 0;
    config
}
