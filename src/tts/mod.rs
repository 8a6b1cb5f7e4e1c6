// src/tts/mod.rs
pub mod google;

use anyhow::Result;
use std::sync::Arc;

use crate::voice::Locale;

pub use google::GoogleTts;

/// Speech backend: text in, encoded audio (anything `AudioTrack::decode` reads) out.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, locale: &Locale) -> Result<Vec<u8>>;
    fn name(&self) -> &'static str;
}

pub type DynSynthesizer = Arc<dyn SpeechSynthesizer>;
