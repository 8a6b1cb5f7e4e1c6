// src/script/summarizer.rs
//! Summarization backends.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::SummarizerConfig;

/// Output length bounds in model tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryBounds {
    pub min_tokens: u32,
    pub max_tokens: u32,
}

impl Default for SummaryBounds {
    fn default() -> Self {
        Self {
            min_tokens: 100,
            max_tokens: 250,
        }
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<String>;
    fn name(&self) -> &'static str;
}

pub type DynSummarizer = Arc<dyn Summarizer>;

/// Build the configured summarizer. Disabled config, or a missing token,
/// yields [`DisabledSummarizer`], which sends every article down the
/// truncation fallback.
pub fn build_summarizer(cfg: &SummarizerConfig) -> Result<DynSummarizer> {
    if !cfg.enabled || cfg.api_key.is_empty() {
        tracing::warn!(
            enabled = cfg.enabled,
            "summarizer unavailable, scripts will use truncated article text"
        );
        return Ok(Arc::new(DisabledSummarizer));
    }
    Ok(Arc::new(HuggingFaceSummarizer::new(
        &cfg.endpoint,
        &cfg.model,
        &cfg.api_key,
    )?))
}

/// Hosted inference for a seq2seq summarization model (default
/// `facebook/bart-large-cnn`).
pub struct HuggingFaceSummarizer {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl HuggingFaceSummarizer {
    pub fn new(endpoint: &str, model: &str, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("news-podcast/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(120))
            .build()
            .context("building summarizer http client")?;
        Ok(Self {
            http,
            url: format!("{}/models/{}", endpoint.trim_end_matches('/'), model),
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Serialize)]
struct Params {
    min_length: u32,
    max_length: u32,
    do_sample: bool,
}

#[derive(Serialize)]
struct Options {
    wait_for_model: bool,
}

#[derive(Serialize)]
struct Req<'a> {
    inputs: &'a str,
    parameters: Params,
    options: Options,
}

#[derive(Deserialize)]
struct SummaryItem {
    summary_text: String,
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    async fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<String> {
        let req = Req {
            inputs: text,
            parameters: Params {
                min_length: bounds.min_tokens,
                max_length: bounds.max_tokens,
                do_sample: false,
            },
            options: Options {
                wait_for_model: true,
            },
        };
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("summarizer request")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("summarizer returned {status}: {}", body.trim());
        }
        let items: Vec<SummaryItem> = resp.json().await.context("summarizer response json")?;
        items
            .into_iter()
            .next()
            .map(|i| i.summary_text.trim().to_string())
            .ok_or_else(|| anyhow!("summarizer returned no summaries"))
    }

    fn name(&self) -> &'static str {
        "huggingface"
    }
}

/// Always fails.
pub struct DisabledSummarizer;

#[async_trait]
impl Summarizer for DisabledSummarizer {
    async fn summarize(&self, _text: &str, _bounds: SummaryBounds) -> Result<String> {
        bail!("summarizer disabled")
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}
