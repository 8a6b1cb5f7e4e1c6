// src/bin/poll_once.rs
//! Run a single poll pass and exit.
//!
//! Usage: cargo run --bin poll-once
//! Reads the same `.env` / `config/podcast.toml` as the server.

use anyhow::Context;
use news_podcast::config::AppConfig;
use news_podcast::{init_tracing, Pipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default().context("loading podcast config")?;
    std::fs::create_dir_all(&cfg.audio.output_dir)
        .with_context(|| format!("creating {}", cfg.audio.output_dir.display()))?;

    let pipeline = Pipeline::from_config(&cfg)?;
    let summary = pipeline.run_pass().await;

    println!(
        "fetched={} new={} produced={} failed={}",
        summary.fetched, summary.new, summary.produced, summary.failed
    );
    Ok(())
}
