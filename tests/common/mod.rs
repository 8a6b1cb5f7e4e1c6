// tests/common/mod.rs
//
// In-memory collaborators shared by the integration tests. Nothing here
// touches the network.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use news_podcast::audio::encode::wav_bytes;
use news_podcast::audio::AudioTrack;
use news_podcast::config::{FailurePolicy, ScriptConfig};
use news_podcast::ingest::seen::InMemorySeenStore;
use news_podcast::ingest::types::{ArticleExtractor, NewsItem, NewsProvider};
use news_podcast::podcast::pipeline::{Collaborators, Pipeline, PipelineSettings};
use news_podcast::podcast::Library;
use news_podcast::script::summarizer::{Summarizer, SummaryBounds};
use news_podcast::script::ScriptPreparer;
use news_podcast::speech::SpeechAssembler;
use news_podcast::tts::SpeechSynthesizer;
use news_podcast::voice::{Locale, VoiceCatalog};

pub const BODY_LIMIT: usize = 1024 * 1024;

/// Returns the same items for every category, tagged with that category.
pub struct StaticProvider {
    pub items: Vec<(String, String)>,
    pub failing: Vec<String>,
}

impl StaticProvider {
    pub fn new(items: &[(&str, &str)]) -> Self {
        Self {
            items: items
                .iter()
                .map(|(u, t)| (u.to_string(), t.to_string()))
                .collect(),
            failing: Vec::new(),
        }
    }
}

#[async_trait]
impl NewsProvider for StaticProvider {
    async fn fetch_category(&self, category: &str) -> Result<Vec<NewsItem>> {
        if self.failing.iter().any(|c| c == category) {
            anyhow::bail!("upstream 500 for {category}");
        }
        Ok(self
            .items
            .iter()
            .map(|(url, title)| NewsItem {
                category: category.to_string(),
                url: Some(url.clone()),
                title: Some(title.clone()),
                published_at: None,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Article body per URL; unknown URLs extract to empty text.
#[derive(Default)]
pub struct MapExtractor {
    pub bodies: HashMap<String, String>,
    pub calls: Mutex<Vec<String>>,
}

impl MapExtractor {
    pub fn with(bodies: &[(&str, &str)]) -> Self {
        Self {
            bodies: bodies
                .iter()
                .map(|(u, b)| (u.to_string(), b.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleExtractor for MapExtractor {
    async fn extract(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        Ok(self.bodies.get(url).cloned().unwrap_or_default())
    }
}

pub struct FixedSummarizer(pub &'static str);

#[async_trait]
impl Summarizer for FixedSummarizer {
    async fn summarize(&self, _text: &str, _bounds: SummaryBounds) -> Result<String> {
        Ok(self.0.to_string())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Emits a short mono WAV tone per call; fails when `fail_all` is set.
#[derive(Default)]
pub struct ToneTts {
    pub calls: Mutex<Vec<(String, Locale)>>,
    pub fail_all: bool,
}

impl ToneTts {
    pub fn calls(&self) -> Vec<(String, Locale)> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn tone(sample_rate: u32, frames: usize) -> AudioTrack {
    let samples = (0..frames)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.3 * (2.0 * std::f32::consts::PI * 220.0 * t).sin()
        })
        .collect();
    AudioTrack::new(1, sample_rate, samples)
}

#[async_trait]
impl SpeechSynthesizer for ToneTts {
    async fn synthesize(&self, text: &str, locale: &Locale) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), locale.clone()));
        if self.fail_all {
            anyhow::bail!("tts offline");
        }
        wav_bytes(&tone(16_000, 1_600))
    }

    fn name(&self) -> &'static str {
        "tone"
    }
}

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub extractor: Arc<MapExtractor>,
    pub tts: Arc<ToneTts>,
    pub pipeline: Arc<Pipeline>,
}

impl Harness {
    pub fn output_root(&self) -> PathBuf {
        self.dir.path().join("podcasts")
    }

    pub fn library(&self) -> &Library {
        self.pipeline.library()
    }
}

pub fn settings(root: &Path, on_failure: FailurePolicy) -> PipelineSettings {
    PipelineSettings {
        categories: vec!["technology".into(), "science".into()],
        music_file: root.join("no-music.mp3"),
        music_gain_db: -12.0,
        temp_dir: root.to_path_buf(),
        default_voice_key: "female_in".into(),
        on_failure,
    }
}

pub fn harness(
    provider: StaticProvider,
    extractor: MapExtractor,
    tts: ToneTts,
    on_failure: FailurePolicy,
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let extractor = Arc::new(extractor);
    let tts = Arc::new(tts);

    let parts = Collaborators {
        provider: Arc::new(provider),
        extractor: extractor.clone(),
        script: ScriptPreparer::new(
            Arc::new(FixedSummarizer("Short summary.")),
            &ScriptConfig::default(),
        ),
        speech: SpeechAssembler::new(tts.clone(), VoiceCatalog::default(), "en"),
        seen: Arc::new(InMemorySeenStore::default()),
    };
    let pipeline = Pipeline::new(
        parts,
        Library::new(dir.path().join("podcasts")),
        settings(dir.path(), on_failure),
    );

    Harness {
        dir,
        extractor,
        tts,
        pipeline: Arc::new(pipeline),
    }
}
