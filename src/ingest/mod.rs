// src/ingest/mod.rs
pub mod extract;
pub mod providers;
pub mod scheduler;
pub mod seen;
pub mod types;

use crate::ingest::seen::SeenStore;
use crate::ingest::types::{Article, NewsItem, NewsProvider};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "podcast_articles_fetched_total",
            "Items returned by the news provider."
        );
        describe_counter!(
            "podcast_articles_new_total",
            "Items kept after url/title and seen-URL filtering."
        );
        describe_counter!(
            "podcast_fetch_errors_total",
            "Per-category provider fetch/parse errors."
        );
        describe_histogram!("podcast_fetch_ms", "Provider fetch time in milliseconds.");
        describe_gauge!("podcast_seen_urls", "URLs currently in the seen store.");
    });
}

/// Normalize text: decode entities, strip tags, ASCII quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Counts from one filtering step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub incomplete: usize,
    pub already_seen: usize,
    pub duplicates: usize,
}

/// Fetch every category in order and merge. A failing category is logged,
/// counted and skipped.
pub async fn fetch_all(provider: &dyn NewsProvider, categories: &[String]) -> Vec<NewsItem> {
    ensure_metrics_described();

    let mut all = Vec::new();
    for category in categories {
        tracing::info!(category = %category, provider = provider.name(), "fetching news");
        match provider.fetch_category(category).await {
            Ok(mut items) => all.append(&mut items),
            Err(e) => {
                tracing::warn!(error = ?e, category = %category, "error fetching category");
                counter!("podcast_fetch_errors_total").increment(1);
            }
        }
    }
    all
}

/// Keep items that have a url and title and are not in `seen`. When a url
/// repeats within the batch the last occurrence wins. Fetch order is
/// preserved among the kept items.
pub fn filter_new(items: Vec<NewsItem>, seen: &dyn SeenStore) -> (Vec<Article>, FilterStats) {
    let mut stats = FilterStats::default();
    let mut batch: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(items.len());

    for item in items.into_iter().rev() {
        let (Some(url), Some(title)) = (item.url, item.title) else {
            stats.incomplete += 1;
            continue;
        };
        if seen.contains(&url) {
            stats.already_seen += 1;
            continue;
        }
        if !batch.insert(url.clone()) {
            stats.duplicates += 1;
            continue;
        }
        keep.push(Article {
            url,
            title,
            category: item.category,
            published_at: item.published_at,
        });
    }
    keep.reverse();

    counter!("podcast_articles_new_total").increment(keep.len() as u64);
    (keep, stats)
}
