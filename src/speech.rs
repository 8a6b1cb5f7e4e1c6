// src/speech.rs
//! Multi-voice speech assembly: one synthesized, pitch-shifted clip per
//! script segment, concatenated in order into a single file.

use anyhow::{Context, Result};
use metrics::counter;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::audio::AudioTrack;
use crate::tts::DynSynthesizer;
use crate::voice::{locale_for, VoiceCatalog, VoicePool};

/// How one segment was voiced.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRender {
    pub index: usize,
    pub voice: String,
    pub pitch_shift: f32,
}

#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub rendered: Vec<SegmentRender>,
    /// Indices of segments that produced no audio.
    pub failed: Vec<usize>,
    pub duration: Duration,
}

pub struct SpeechAssembler {
    synthesizer: DynSynthesizer,
    catalog: VoiceCatalog,
    lang: String,
}

impl SpeechAssembler {
    pub fn new(
        synthesizer: DynSynthesizer,
        catalog: VoiceCatalog,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            synthesizer,
            catalog,
            lang: lang.into(),
        }
    }

    /// Resolve `voice_key` and render `parts` into `output`.
    ///
    /// `Ok(None)` means nothing was produced (no parts, or every segment
    /// failed) and nothing was written.
    pub async fn generate(
        &self,
        parts: &[String],
        output: &Path,
        voice_key: &str,
    ) -> Result<Option<AssemblyReport>> {
        let pool = {
            let mut rng = rand::rng();
            self.catalog.resolve(voice_key, &mut rng)
        };
        self.generate_with_pool(parts, output, &pool).await
    }

    pub async fn generate_with_pool(
        &self,
        parts: &[String],
        output: &Path,
        pool: &VoicePool,
    ) -> Result<Option<AssemblyReport>> {
        if parts.is_empty() {
            warn!("no script parts provided for speech generation");
            return Ok(None);
        }
        info!(voice_key = pool.key(), parts = parts.len(), "generating multi-voice speech");

        let mut combined: Option<AudioTrack> = None;
        let mut rendered = Vec::with_capacity(parts.len());
        let mut failed = Vec::new();

        for (i, part) in parts.iter().enumerate() {
            let voice = pool.voice_for(i);
            let shift = pool.pitch_shift(voice);
            info!(
                part = i + 1,
                of = parts.len(),
                voice,
                shift,
                "generating part"
            );

            match self.render_segment(part, voice, shift).await {
                Ok(clip) if !clip.is_empty() => {
                    match combined.as_mut() {
                        Some(acc) => acc.append(&clip),
                        None => combined = Some(clip),
                    }
                    rendered.push(SegmentRender {
                        index: i,
                        voice: voice.to_string(),
                        pitch_shift: shift,
                    });
                }
                Ok(_) => {
                    warn!(part = i + 1, "segment produced no audio");
                    counter!("podcast_segments_failed_total").increment(1);
                    failed.push(i);
                }
                Err(e) => {
                    warn!(part = i + 1, error = ?e, "error generating audio for part");
                    counter!("podcast_segments_failed_total").increment(1);
                    failed.push(i);
                }
            }
        }

        let Some(track) = combined.filter(|t| !t.is_empty()) else {
            warn!("failed to generate any audio segments");
            return Ok(None);
        };

        let duration = track.duration();
        export_blocking(track, output.to_path_buf()).await?;
        info!(output = %output.display(), ?duration, "all audio parts combined");

        Ok(Some(AssemblyReport {
            rendered,
            failed,
            duration,
        }))
    }

    async fn render_segment(&self, text: &str, voice: &str, shift: f32) -> Result<AudioTrack> {
        let locale = locale_for(voice, &self.lang);
        let bytes = self
            .synthesizer
            .synthesize(text, &locale)
            .await
            .with_context(|| format!("{} synthesis ({voice})", self.synthesizer.name()))?;
        let clip = AudioTrack::decode(bytes)?;
        Ok(clip.pitch_shifted(shift))
    }
}

async fn export_blocking(track: AudioTrack, path: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || track.export(&path))
        .await
        .context("export task panicked")?
}
