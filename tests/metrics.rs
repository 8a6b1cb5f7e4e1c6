// tests/metrics.rs
//
// The recorder is process-global, so every test shares one installation.

mod common;

use std::sync::OnceLock;

use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use tower::ServiceExt as _;

use common::{harness, MapExtractor, StaticProvider, ToneTts, BODY_LIMIT};
use news_podcast::config::FailurePolicy;
use news_podcast::metrics::Metrics;

fn metrics() -> &'static Metrics {
    static METRICS: OnceLock<Metrics> = OnceLock::new();
    METRICS.get_or_init(|| Metrics::init().expect("install prometheus recorder"))
}

async fn scrape() -> String {
    let resp = metrics()
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn seen_gauge_is_exposed_before_any_pass() {
    let text = scrape().await;
    assert!(text.contains("podcast_seen_urls"), "missing gauge\n{text}");
}

#[tokio::test]
async fn pass_counters_show_up_after_a_pass() {
    metrics();
    let provider = StaticProvider::new(&[("https://n/1", "Story"), ("https://n/2", "Paywalled")]);
    let extractor = MapExtractor::with(&[("https://n/1", "Body.")]);
    let h = harness(provider, extractor, ToneTts::default(), FailurePolicy::Skip);
    let summary = h.pipeline.run_pass().await;
    assert_eq!((summary.produced, summary.failed), (1, 1));

    let text = scrape().await;
    for needle in [
        "podcast_articles_new_total",
        "podcast_articles_produced_total",
        "podcast_articles_failed_total",
        "podcast_last_pass_ts",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}
