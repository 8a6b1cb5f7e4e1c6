// tests/providers_newsapi.rs
use news_podcast::ingest::providers::newsapi::{parse_top_headlines, NewsApiProvider};
use news_podcast::ingest::seen::{InMemorySeenStore, SeenStore};
use news_podcast::ingest::types::NewsProvider;
use news_podcast::ingest::{fetch_all, filter_new};

const FIXTURE: &str = include_str!("fixtures/newsapi_top_headlines.json");

#[test]
fn fixture_parses_with_normalized_titles() {
    let items = parse_top_headlines(FIXTURE, "technology").unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(
        items[0].title.as_deref(),
        Some("Chipmaker unveils new low-power design")
    );
    assert_eq!(
        items[1].title.as_deref(),
        Some("Open-source project reaches 1.0 \u{2013} what changed")
    );
    assert_eq!(items[2].url, None);
    assert_eq!(items[0].published_at.as_deref(), Some("2024-05-02T14:05:00Z"));
}

#[tokio::test]
async fn fetch_then_filter_keeps_unique_complete_items() {
    let provider = NewsApiProvider::from_fixture(FIXTURE);
    let categories = vec!["technology".to_string(), "science".to_string()];

    let items = fetch_all(&provider, &categories).await;
    assert_eq!(items.len(), 8);
    assert_eq!(items[0].category, "technology");
    assert_eq!(items[4].category, "science");

    let seen = InMemorySeenStore::default();
    seen.insert("https://news.example.com/tech/one-point-oh").unwrap();

    let (kept, stats) = filter_new(items, &seen);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].url, "https://news.example.com/tech/chip-design");
    // Every story appears in both categories; the later fetch keeps it.
    assert_eq!(kept[0].category, "science");
    assert_eq!(kept[0].published_at.as_deref(), Some("2024-05-02T14:05:00Z"));
    assert_eq!(stats.incomplete, 2);
    assert_eq!(stats.already_seen, 2);
    assert_eq!(stats.duplicates, 3);
}

#[tokio::test]
async fn error_body_fails_the_category() {
    let provider = NewsApiProvider::from_fixture(
        r#"{"status":"error","code":"rateLimited","message":"slow down"}"#,
    );
    assert!(provider.fetch_category("health").await.is_err());
    let items = fetch_all(&provider, &["health".to_string()]).await;
    assert!(items.is_empty());
}
