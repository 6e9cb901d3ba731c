//! News hotness: binary entrypoint.
//!
//! `rank` scores JSON input files once and writes the envelope to disk;
//! `serve` exposes the same engine over HTTP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use news_hotness::{api, build_provider, input, HotnessConfig, HotnessEngine};

#[derive(Debug, Parser)]
#[command(name = "news-hotness", version, about = "Rank news items by hotness")]
struct Cli {
    /// Config file (TOML or JSON). Falls back to HOTNESS_CONFIG_PATH, then config/.
    #[arg(long, global = true, env = "HOTNESS_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score input files and write the ranked envelope.
    Rank {
        /// Input JSON files or directories.
        #[arg(long = "in", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Output path; defaults to output.path from config.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Keep only the top N items.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Serve the HTTP API.
    Serve {
        #[arg(long, env = "PORT", default_value_t = 8000)]
        port: u16,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<HotnessConfig> {
    match path {
        Some(p) => {
            let mut cfg = HotnessConfig::load_from_file(p)?;
            cfg.apply_env_overrides();
            Ok(cfg)
        }
        None => HotnessConfig::load_default(),
    }
}

fn build_engine(config: HotnessConfig) -> Result<HotnessEngine> {
    let provider = build_provider(&config).context("building embedding provider")?;
    HotnessEngine::new(config, provider).context("validating hotness config")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    news_hotness::init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Rank { inputs, out, limit } => {
            let out = out.unwrap_or_else(|| config.output.path.clone());
            let limit = limit.or(config.output.limit);
            let engine = build_engine(config)?;

            let raws = input::load_inputs(&inputs);
            info!(target: "pipeline", items = raws.len(), "inputs loaded");

            let run = engine.run(raws, Utc::now()).await?.truncated(limit);
            run.write_atomic(&out)
                .with_context(|| format!("writing {}", out.display()))?;
            info!(
                target: "pipeline",
                path = %out.display(),
                written = run.items.len(),
                total = run.total_items,
                "ranked output written"
            );
        }
        Command::Serve { port } => {
            let engine = build_engine(config)?;
            let app = api::router(api::AppState::new(engine));
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
                .await
                .with_context(|| format!("binding port {port}"))?;
            info!(target: "api", port, "listening");
            axum::serve(listener, app).await.context("http server")?;
        }
    }
    Ok(())
}
