// src/config/mod.rs
//! Service configuration: `.env` + optional TOML file + environment overrides.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/podcast.toml";
pub const ENV_CONFIG_PATH: &str = "PODCAST_CONFIG_PATH";

pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";
pub const ENV_HF_API_TOKEN: &str = "HF_API_TOKEN";
pub const ENV_OUTPUT_DIR: &str = "PODCAST_OUTPUT_DIR";
pub const ENV_MUSIC_FILE: &str = "PODCAST_MUSIC_FILE";
pub const ENV_POLL_MINUTES: &str = "PODCAST_POLL_MINUTES";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub news: NewsConfig,
    pub audio: AudioConfig,
    pub script: ScriptConfig,
    pub summarizer: SummarizerConfig,
    pub tts: TtsConfig,
    pub scheduler: SchedulerConfig,
    pub server: ServerConfig,
    /// Voice pool overrides: key -> ordered voice identifiers.
    pub voices: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// "ENV" (or empty) means: read from NEWS_API_KEY
    pub api_key: String,
    pub country: String,
    pub categories: Vec<String>,
    pub base_url: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: "ENV".into(),
            country: "us".into(),
            categories: [
                "technology",
                "sports",
                "business",
                "science",
                "health",
                "entertainment",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            base_url: "https://newsapi.org".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub output_dir: PathBuf,
    pub music_file: PathBuf,
    /// Where intermediate speech files are written before mixing.
    pub temp_dir: PathBuf,
    pub music_gain_db: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated_podcasts"),
            music_file: PathBuf::from("background.mp3"),
            temp_dir: PathBuf::from("."),
            music_gain_db: -12.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub words_per_minute: usize,
    pub target_audio_minutes: usize,
    pub summary_min_tokens: u32,
    pub summary_max_tokens: u32,
    /// Article words sent to the summarizer; longer bodies are cut.
    pub max_input_words: usize,
}

impl ScriptConfig {
    /// Word budget used by the truncation fallback.
    pub fn target_word_count(&self) -> usize {
        self.words_per_minute * self.target_audio_minutes
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 150,
            target_audio_minutes: 4,
            summary_min_tokens: 100,
            summary_max_tokens: 250,
            max_input_words: 700,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// "ENV" (or empty) means: read from HF_API_TOKEN
    pub api_key: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api-inference.huggingface.co".into(),
            model: "facebook/bart-large-cnn".into(),
            api_key: "ENV".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub lang: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self { lang: "en".into() }
    }
}

/// What happens to an article URL when processing it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Mark the URL as seen anyway; it is never attempted again.
    #[default]
    Skip,
    /// Leave the URL unseen so the next pass picks it up again.
    Retry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub poll_interval_minutes: u64,
    pub default_voice_key: String,
    pub on_failure: FailurePolicy,
    /// When set, seen URLs are persisted to this file and survive restarts.
    pub seen_store_path: Option<PathBuf>,
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_minutes.max(1) * 60)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_minutes: 15,
            default_voice_key: "female_in".into(),
            on_failure: FailurePolicy::Skip,
            seen_store_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub frontend_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            frontend_dir: PathBuf::from("frontend"),
        }
    }
}

impl AppConfig {
    /// Load from an explicit TOML path, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut cfg: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $PODCAST_CONFIG_PATH (must exist)
    /// 2) config/podcast.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        let mut cfg = AppConfig::default();
        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        self.news.api_key = resolve_key(&self.news.api_key, ENV_NEWS_API_KEY);
        self.summarizer.api_key = resolve_key(&self.summarizer.api_key, ENV_HF_API_TOKEN);

        if let Ok(dir) = std::env::var(ENV_OUTPUT_DIR) {
            if !dir.trim().is_empty() {
                self.audio.output_dir = PathBuf::from(dir.trim());
            }
        }
        if let Ok(music) = std::env::var(ENV_MUSIC_FILE) {
            if !music.trim().is_empty() {
                self.audio.music_file = PathBuf::from(music.trim());
            }
        }
        if let Some(minutes) = std::env::var(ENV_POLL_MINUTES)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            self.scheduler.poll_interval_minutes = minutes.max(1);
        }

        self.news.categories = clean_list(std::mem::take(&mut self.news.categories));
    }
}

/// "ENV" or an empty value resolves to the named env var (empty if unset).
fn resolve_key(raw: &str, env_name: &str) -> String {
    let t = raw.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("env") {
        std::env::var(env_name).unwrap_or_default()
    } else {
        t.to_string()
    }
}

/// Trim, drop empties, keep first occurrence order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}
