//! News podcast service: binary entrypoint.
//! Boots the Axum HTTP server and, when enabled, the background poller.

use std::sync::Arc;

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use news_podcast::api::{self, AppState};
use news_podcast::config::AppConfig;
use news_podcast::ingest::scheduler::spawn_poll_scheduler;
use news_podcast::metrics::Metrics;
use news_podcast::{init_tracing, Pipeline};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default().context("loading podcast config")?;
    std::fs::create_dir_all(&cfg.audio.output_dir)
        .with_context(|| format!("creating {}", cfg.audio.output_dir.display()))?;

    let metrics = Metrics::init()?;
    let pipeline = Arc::new(Pipeline::from_config(&cfg).context("building pipeline")?);

    if cfg.scheduler.enabled {
        tracing::info!("starting the real-time news podcast generator");
        spawn_poll_scheduler(pipeline.clone(), cfg.scheduler.interval());
    } else {
        tracing::info!("poll scheduler disabled; serving existing podcasts only");
    }

    let state = AppState::new(pipeline, cfg.server.frontend_dir.clone());
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
