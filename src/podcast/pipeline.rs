// src/podcast/pipeline.rs
//! Fetch → filter → extract → script → speech → mix → transcript, plus
//! re-voicing an existing episode from its transcript.

use anyhow::{anyhow, bail, Context, Result};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::audio::mixer::add_background_music_blocking;
use crate::config::{AppConfig, FailurePolicy};
use crate::ingest::extract::HtmlExtractor;
use crate::ingest::providers::NewsApiProvider;
use crate::ingest::seen::{open_seen_store, DynSeenStore};
use crate::ingest::types::{Article, ArticleExtractor, NewsProvider};
use crate::ingest::{fetch_all, filter_new};
use crate::podcast::{base_name, is_episode_filename, is_safe_component, safe_filename, Library};
use crate::script::summarizer::build_summarizer;
use crate::script::{join_transcript, split_transcript, ScriptPreparer};
use crate::speech::SpeechAssembler;
use crate::tts::{DynSynthesizer, GoogleTts};
use crate::voice::VoiceCatalog;

const TEMP_SPEECH_FILE: &str = "temp_speech.wav";

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "podcast_articles_produced_total",
            "Articles turned into a finished episode."
        );
        describe_counter!(
            "podcast_articles_failed_total",
            "Articles that failed at any stage."
        );
        describe_counter!(
            "podcast_segments_failed_total",
            "Script segments that produced no audio."
        );
        describe_counter!(
            "podcast_regenerations_total",
            "Episodes re-voiced through the API."
        );
        describe_gauge!("podcast_last_pass_ts", "Unix ts when the last poll pass finished.");
    });
}

/// Counts for one poll pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub fetched: usize,
    pub new: usize,
    pub produced: usize,
    pub failed: usize,
}

/// Everything a pass needs besides the library root.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub categories: Vec<String>,
    pub music_file: PathBuf,
    pub music_gain_db: f32,
    pub temp_dir: PathBuf,
    pub default_voice_key: String,
    pub on_failure: FailurePolicy,
}

impl PipelineSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            categories: cfg.news.categories.clone(),
            music_file: cfg.audio.music_file.clone(),
            music_gain_db: cfg.audio.music_gain_db,
            temp_dir: cfg.audio.temp_dir.clone(),
            default_voice_key: cfg.scheduler.default_voice_key.clone(),
            on_failure: cfg.scheduler.on_failure,
        }
    }
}

/// Swappable collaborators.
pub struct Collaborators {
    pub provider: Arc<dyn NewsProvider>,
    pub extractor: Arc<dyn ArticleExtractor>,
    pub script: ScriptPreparer,
    pub speech: SpeechAssembler,
    pub seen: DynSeenStore,
}

impl Collaborators {
    /// Network-backed collaborators described by `cfg`.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let synthesizer: DynSynthesizer = Arc::new(GoogleTts::new()?);
        Ok(Self {
            provider: Arc::new(NewsApiProvider::from_config(&cfg.news)?),
            extractor: Arc::new(HtmlExtractor::new()?),
            script: ScriptPreparer::new(build_summarizer(&cfg.summarizer)?, &cfg.script),
            speech: SpeechAssembler::new(
                synthesizer,
                VoiceCatalog::with_overrides(&cfg.voices),
                cfg.tts.lang.clone(),
            ),
            seen: open_seen_store(cfg.scheduler.seen_store_path.as_deref())?,
        })
    }
}

/// Why a regeneration request did not produce audio.
#[derive(Debug)]
pub enum RegenerateError {
    MissingParameters,
    InvalidPath,
    TranscriptNotFound,
    NoAudio,
    Internal(anyhow::Error),
}

impl fmt::Display for RegenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParameters => write!(f, "Missing parameters."),
            Self::InvalidPath => write!(f, "Invalid category or filename."),
            Self::TranscriptNotFound => {
                write!(f, "Original script not found (missing .txt file).")
            }
            Self::NoAudio => write!(f, "Failed to generate new audio."),
            Self::Internal(e) => write!(f, "Internal server error: {e:#}"),
        }
    }
}

impl std::error::Error for RegenerateError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regenerated {
    pub voice_key: String,
    pub new_audio_url: String,
    pub segments: usize,
}

pub struct Pipeline {
    provider: Arc<dyn NewsProvider>,
    extractor: Arc<dyn ArticleExtractor>,
    script: ScriptPreparer,
    speech: SpeechAssembler,
    seen: DynSeenStore,
    library: Library,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(parts: Collaborators, library: Library, settings: PipelineSettings) -> Self {
        ensure_metrics_described();
        Self {
            provider: parts.provider,
            extractor: parts.extractor,
            script: parts.script,
            speech: parts.speech,
            seen: parts.seen,
            library,
            settings,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            Collaborators::from_config(cfg)?,
            Library::new(cfg.audio.output_dir.clone()),
            PipelineSettings::from_config(cfg),
        ))
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// One complete poll pass. Per-article failures are logged and counted,
    /// never returned.
    pub async fn run_pass(&self) -> PassSummary {
        let items = fetch_all(self.provider.as_ref(), &self.settings.categories).await;
        let fetched = items.len();
        let (articles, stats) = filter_new(items, self.seen.as_ref());
        info!(
            fetched,
            new = articles.len(),
            incomplete = stats.incomplete,
            already_seen = stats.already_seen,
            duplicates = stats.duplicates,
            "filtered news items"
        );

        let mut summary = PassSummary {
            fetched,
            new: articles.len(),
            ..PassSummary::default()
        };

        // Newest items come first from the source; work oldest-fetched first.
        for article in articles.into_iter().rev() {
            info!(
                category = %article.category,
                title = %article.title,
                published_at = article.published_at.as_deref().unwrap_or("unknown"),
                "new article found"
            );
            let outcome = self.process_article(&article).await;
            let succeeded = match outcome {
                Ok(path) => {
                    info!(url = %article.url, output = %path.display(), "episode produced");
                    counter!("podcast_articles_produced_total").increment(1);
                    summary.produced += 1;
                    true
                }
                Err(e) => {
                    error!(
                        url = %article.url,
                        title = %article.title,
                        error = ?e,
                        "error processing article"
                    );
                    counter!("podcast_articles_failed_total").increment(1);
                    summary.failed += 1;
                    false
                }
            };

            if succeeded || self.settings.on_failure == FailurePolicy::Skip {
                if let Err(e) = self.seen.insert(&article.url) {
                    warn!(url = %article.url, error = ?e, "could not record seen url");
                }
            }
        }

        gauge!("podcast_seen_urls").set(self.seen.len() as f64);
        gauge!("podcast_last_pass_ts").set(chrono::Utc::now().timestamp() as f64);
        info!(?summary, "waiting for next check");
        summary
    }

    async fn process_article(&self, article: &Article) -> Result<PathBuf> {
        info!(url = %article.url, "downloading full article text");
        let text = self.extractor.extract(&article.url).await?;
        if text.trim().is_empty() {
            bail!("could not extract full text");
        }

        let parts = self.script.prepare(&text, &article.title).await;
        if parts.is_empty() {
            bail!("could not prepare script");
        }

        let filename = safe_filename(&article.title);
        self.library.ensure_category(&article.category)?;
        let output = self.library.audio_path(&article.category, &filename);
        let temp = self.settings.temp_dir.join(TEMP_SPEECH_FILE);

        let report = self
            .speech
            .generate(&parts, &temp, &self.settings.default_voice_key)
            .await?
            .ok_or_else(|| anyhow!("no audio produced"))?;
        info!(
            segments = report.rendered.len(),
            failed_segments = report.failed.len(),
            "speech assembled"
        );

        add_background_music_blocking(
            temp,
            self.settings.music_file.clone(),
            output.clone(),
            self.settings.music_gain_db,
        )
        .await?;

        match self
            .library
            .write_transcript(&article.category, &filename, &join_transcript(&parts))
        {
            Ok(p) => info!(path = %p.display(), "transcript saved"),
            Err(e) => warn!(error = ?e, "error saving transcript"),
        }
        Ok(output)
    }

    /// Re-voice `{category}/{filename}` from its stored transcript with
    /// `voice_key`, overwriting the audio in place.
    pub async fn regenerate(
        &self,
        category: &str,
        filename: &str,
        voice_key: &str,
    ) -> std::result::Result<Regenerated, RegenerateError> {
        if category.is_empty() || filename.is_empty() || voice_key.is_empty() {
            return Err(RegenerateError::MissingParameters);
        }
        // The mixer picks the container from the extension; episodes are MP3.
        if !is_safe_component(category) || !is_episode_filename(filename) {
            return Err(RegenerateError::InvalidPath);
        }

        let transcript = self
            .library
            .read_transcript(category, filename)
            .map_err(RegenerateError::Internal)?
            .ok_or(RegenerateError::TranscriptNotFound)?;

        let parts = split_transcript(&transcript);
        info!(category, filename, voice_key, segments = parts.len(), "regenerating podcast");

        let temp = self
            .settings
            .temp_dir
            .join(format!("temp_regenerate_{}.wav", base_name(filename)));
        let output = self.library.audio_path(category, filename);

        let report = self
            .speech
            .generate(&parts, &temp, voice_key)
            .await
            .map_err(RegenerateError::Internal)?
            .ok_or(RegenerateError::NoAudio)?;

        add_background_music_blocking(
            temp,
            self.settings.music_file.clone(),
            output,
            self.settings.music_gain_db,
        )
        .await
        .context("mixing regenerated audio")
        .map_err(RegenerateError::Internal)?;

        counter!("podcast_regenerations_total").increment(1);
        Ok(Regenerated {
            voice_key: voice_key.to_string(),
            new_audio_url: format!("/podcasts/{category}/{filename}"),
            segments: report.rendered.len(),
        })
    }
}
