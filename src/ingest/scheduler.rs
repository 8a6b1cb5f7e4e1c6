// src/ingest/scheduler.rs
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::podcast::pipeline::Pipeline;

/// Spawn the poll loop: one pass immediately, then one per `interval`.
/// Passes run back to back inside this task, so they never overlap; a pass
/// that overruns delays the next tick instead of bursting.
pub fn spawn_poll_scheduler(pipeline: Arc<Pipeline>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            target: "ingest",
            interval_secs = interval.as_secs(),
            "poll scheduler started"
        );
        loop {
            ticker.tick().await;
            let summary = pipeline.run_pass().await;
            counter!("podcast_passes_total").increment(1);
            tracing::info!(
                target: "ingest",
                fetched = summary.fetched,
                new = summary.new,
                produced = summary.produced,
                failed = summary.failed,
                "poll tick"
            );
        }
    })
}
