// src/ingest/types.rs
use anyhow::Result;

/// One headline as returned by a news source, tagged with the category it
/// was fetched for. `url` and `title` may be missing upstream.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub category: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub published_at: Option<String>,
}

/// An item accepted for processing.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub category: String,
    pub published_at: Option<String>,
}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_category(&self, category: &str) -> Result<Vec<NewsItem>>;
    fn name(&self) -> &'static str;
}

/// Full-text download + parse for one article URL. Empty string = nothing usable.
#[async_trait::async_trait]
pub trait ArticleExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<String>;
}
