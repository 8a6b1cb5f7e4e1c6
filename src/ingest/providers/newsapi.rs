// src/ingest/providers/newsapi.rs
//! NewsAPI `top-headlines` provider.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;
use std::time::Duration;

use crate::config::NewsConfig;
use crate::ingest::normalize_text;
use crate::ingest::types::{NewsItem, NewsProvider};

#[derive(Debug, Deserialize)]
struct TopHeadlines {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

/// Parse a `top-headlines` body and tag every item with `category`.
pub fn parse_top_headlines(body: &str, category: &str) -> Result<Vec<NewsItem>> {
    let parsed: TopHeadlines = serde_json::from_str(body).context("parsing newsapi json")?;
    if parsed.status != "ok" {
        bail!(
            "newsapi error: {}",
            parsed.message.unwrap_or_else(|| parsed.status.clone())
        );
    }
    Ok(parsed
        .articles
        .into_iter()
        .map(|it| NewsItem {
            category: category.to_string(),
            url: it.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
            title: it.title.map(|t| normalize_text(&t)).filter(|t| !t.is_empty()),
            published_at: it.published_at,
        })
        .collect())
}

pub struct NewsApiProvider {
    mode: Mode,
}

enum Mode {
    /// Same body for every category; used by tests and offline runs.
    Fixture(String),
    Http {
        client: reqwest::Client,
        base_url: String,
        api_key: String,
        country: String,
    },
}

impl NewsApiProvider {
    pub fn from_config(cfg: &NewsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("news-podcast/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()
            .context("building newsapi http client")?;
        Ok(Self {
            mode: Mode::Http {
                client,
                base_url: cfg.base_url.trim_end_matches('/').to_string(),
                api_key: cfg.api_key.clone(),
                country: cfg.country.clone(),
            },
        })
    }

    pub fn from_fixture(content: &str) -> Self {
        Self {
            mode: Mode::Fixture(content.to_string()),
        }
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn fetch_category(&self, category: &str) -> Result<Vec<NewsItem>> {
        let t0 = std::time::Instant::now();
        let body = match &self.mode {
            Mode::Fixture(s) => s.clone(),
            Mode::Http {
                client,
                base_url,
                api_key,
                country,
            } => {
                if api_key.is_empty() {
                    bail!("NEWS_API_KEY is not set");
                }
                client
                    .get(format!("{base_url}/v2/top-headlines"))
                    .query(&[
                        ("country", country.as_str()),
                        ("category", category),
                        ("apiKey", api_key.as_str()),
                    ])
                    .send()
                    .await
                    .with_context(|| format!("fetching category {category}"))?
                    .error_for_status()
                    .with_context(|| format!("newsapi status for {category}"))?
                    .text()
                    .await
                    .context("reading newsapi body")?
            }
        };

        let items = parse_top_headlines(&body, category)?;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("podcast_fetch_ms").record(ms);
        counter!("podcast_articles_fetched_total").increment(items.len() as u64);
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "status": "ok",
        "totalResults": 3,
        "articles": [
            {"source": {"id": null, "name": "X"}, "title": "First &amp; best",
             "url": "https://a.example/1", "description": "d1",
             "publishedAt": "2024-05-01T10:00:00Z"},
            {"title": "No link", "url": null},
            {"title": null, "url": "https://a.example/3"}
        ]
    }"#;

    #[test]
    fn items_are_tagged_and_normalized() {
        let items = parse_top_headlines(BODY, "science").unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| i.category == "science"));
        assert_eq!(items[0].title.as_deref(), Some("First & best"));
        assert_eq!(items[1].url, None);
        assert_eq!(items[2].title, None);
    }

    #[test]
    fn error_status_is_an_error() {
        let body = r#"{"status":"error","code":"apiKeyInvalid","message":"bad key"}"#;
        let err = parse_top_headlines(body, "x").unwrap_err();
        assert!(err.to_string().contains("bad key"));
    }

    #[tokio::test]
    async fn fixture_mode_serves_every_category() {
        let p = NewsApiProvider::from_fixture(BODY);
        let items = p.fetch_category("health").await.unwrap();
        assert_eq!(items[0].category, "health");
    }
}
