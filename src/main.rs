//! # AI Pediatrician CLI (`pediatrician`)
//!
//! ## Usage
//!
//! ```bash
//! pediatrician --config ./config/pediatrician.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pediatrician serve` | Load or build the index, then start the HTTP API |
//! | `pediatrician index` | Load or build the index and report its size |
//! | `pediatrician ask "<question>"` | Answer one question and exit |
//!
//! Logging is controlled with `RUST_LOG` (default `info`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pediatrician_core::store::VectorStore;

use ai_pediatrician::config::{self, Config};
use ai_pediatrician::knowledge_base::LoadOutcome;
use ai_pediatrician::{server, AppContext};

/// AI Pediatrician: pediatric answers grounded in "What to Expect the First Year".
#[derive(Parser)]
#[command(name = "pediatrician", version)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults apply if it
    /// does not exist.
    #[arg(long, global = true, default_value = "./config/pediatrician.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API.
    Serve {
        /// Override `[server].host`.
        #[arg(long)]
        host: Option<String>,

        /// Override `[server].port`.
        #[arg(long)]
        port: Option<u16>,

        /// Trust `X-Forwarded-For` when logging client addresses.
        #[arg(long)]
        proxy_headers: Option<bool>,
    },

    /// Load the vector index, building it from the knowledge base if needed.
    Index,

    /// Answer a single question from the command line.
    Ask {
        /// The question to ask.
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            proxy_headers,
        } => {
            apply_server_overrides(&mut cfg, host, port, proxy_headers);
            let ctx = load_context(&cfg).await?;
            tracing::info!("Starting AI Pediatrician on {}", cfg.server.bind_addr());
            server::run_server(ctx, &cfg.server).await?;
        }
        Commands::Index => {
            let (ctx, outcome) = AppContext::from_config(&cfg).await?;
            let entries = ctx.store.count().await?;
            match outcome {
                LoadOutcome::Opened { .. } => println!("Index loaded: {} entries.", entries),
                LoadOutcome::Built { chunks } => {
                    println!("Index built: {} chunks, {} entries.", chunks, entries)
                }
            }
        }
        Commands::Ask { question } => {
            let ctx = load_context(&cfg).await?;
            let answer = ctx.answer(&question).await?;
            println!("{}", answer.trim());
        }
    }

    Ok(())
}

async fn load_context(cfg: &Config) -> Result<AppContext> {
    let (ctx, outcome) = AppContext::from_config(cfg).await.inspect_err(|e| {
        tracing::error!(error = %format!("{:#}", e), "failed to prepare vector index");
    })?;
    tracing::info!(?outcome, "vector index ready");
    Ok(ctx)
}

fn apply_server_overrides(
    cfg: &mut Config,
    host: Option<String>,
    port: Option<u16>,
    proxy_headers: Option<bool>,
) {
    if let Some(host) = host {
        cfg.server.host = host;
    }
    if let Some(port) = port {
        cfg.server.port = port;
    }
    if let Some(proxy_headers) = proxy_headers {
        cfg.server.proxy_headers = proxy_headers;
    }
}
