// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod audio;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod podcast;
pub mod script;
pub mod speech;
pub mod tts;
pub mod voice;

pub use crate::api::router;
pub use crate::podcast::pipeline::{PassSummary, Pipeline};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. No-op when one is already set (the Shuttle
/// runtime installs its own).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_podcast=info,warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init();
}
