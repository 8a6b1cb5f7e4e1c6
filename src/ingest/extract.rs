// src/ingest/extract.rs
//! Full-text extraction: download an article page and keep its paragraphs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use scraper::{Html, Selector};
use std::time::Duration;

use crate::ingest::normalize_text;
use crate::ingest::types::ArticleExtractor;

pub struct HtmlExtractor {
    http: reqwest::Client,
}

impl HtmlExtractor {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; news-podcast/0.1)")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building extractor http client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ArticleExtractor for HtmlExtractor {
    async fn extract(&self, url: &str) -> Result<String> {
        let html = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("downloading {url}"))?
            .error_for_status()
            .with_context(|| format!("status for {url}"))?
            .text()
            .await
            .with_context(|| format!("reading body of {url}"))?;
        Ok(extract_paragraphs(&html))
    }
}

/// Paragraph text from `<article>` when present, else every `<p>` on the page.
/// Empty paragraphs are dropped; the rest are joined with a blank line.
pub fn extract_paragraphs(html: &str) -> String {
    static ARTICLE_P: OnceCell<Selector> = OnceCell::new();
    static ANY_P: OnceCell<Selector> = OnceCell::new();
    let article_p = ARTICLE_P.get_or_init(|| Selector::parse("article p").unwrap());
    let any_p = ANY_P.get_or_init(|| Selector::parse("p").unwrap());

    let doc = Html::parse_document(html);
    let collect = |sel: &Selector| {
        doc.select(sel)
            .map(|p| normalize_text(&p.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
    };

    let mut paras = collect(article_p);
    if paras.is_empty() {
        paras = collect(any_p);
    }
    paras.join("\n\n")
}
