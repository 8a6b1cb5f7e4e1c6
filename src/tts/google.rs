// src/tts/google.rs
//! Google Translate TTS (the endpoint gTTS talks to). Returns MP3.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use super::SpeechSynthesizer;
use crate::voice::Locale;

/// The endpoint rejects longer inputs.
const MAX_CHUNK_CHARS: usize = 100;

pub struct GoogleTts {
    http: reqwest::Client,
}

impl GoogleTts {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (news-podcast)")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building TTS http client")?;
        Ok(Self { http })
    }

    fn endpoint(tld: &str) -> String {
        format!("https://translate.google.{tld}/translate_tts")
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, locale: &Locale) -> Result<Vec<u8>> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            bail!("nothing to synthesize");
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let idx_s = idx.to_string();
            let len_s = chunk.chars().count().to_string();
            let resp = self
                .http
                .get(Self::endpoint(&locale.tld))
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", locale.lang.as_str()),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx_s.as_str()),
                    ("textlen", len_s.as_str()),
                ])
                .send()
                .await
                .with_context(|| format!("tts request ({})", locale.tld))?
                .error_for_status()
                .context("tts status")?;
            let bytes = resp.bytes().await.context("tts body")?;
            // MP3 frames concatenate cleanly.
            audio.extend_from_slice(&bytes);
        }
        Ok(audio)
    }

    fn name(&self) -> &'static str {
        "google-translate"
    }
}

/// Split on whitespace into pieces of at most `max` chars. A single word
/// longer than `max` is hard-split.
pub fn chunk_text(text: &str, max: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > max {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(max).collect();
            word = word.chars().skip(max).collect();
            out.push(head);
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
