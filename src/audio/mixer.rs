// src/audio/mixer.rs
//! Lay background music under a finished speech track.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::AudioTrack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixOutcome {
    /// Music was attenuated, looped/cut to length and overlaid.
    Mixed,
    /// No music file; speech was exported as-is.
    SpeechOnly,
}

/// Mix `speech_file` with `music_file` (if it exists) into `output_file`.
///
/// The speech file is an intermediate: once it exists it is removed after
/// this call, whether mixing succeeded or not.
pub fn add_background_music(
    speech_file: &Path,
    music_file: &Path,
    output_file: &Path,
    music_gain_db: f32,
) -> Result<MixOutcome> {
    info!(output = %output_file.display(), "mixing audio");
    if !speech_file.exists() {
        warn!(speech = %speech_file.display(), "speech file not found");
        bail!("speech file not found at {}", speech_file.display());
    }

    let result = mix_into(speech_file, music_file, output_file, music_gain_db);

    if let Err(e) = std::fs::remove_file(speech_file) {
        warn!(error = %e, speech = %speech_file.display(), "could not remove temp speech file");
    }

    match &result {
        Ok(_) => info!(output = %output_file.display(), "saved final audio file"),
        Err(e) => warn!(error = ?e, "adding background music failed"),
    }
    result
}

fn mix_into(
    speech_file: &Path,
    music_file: &Path,
    output_file: &Path,
    music_gain_db: f32,
) -> Result<MixOutcome> {
    let speech = AudioTrack::from_file(speech_file)?;

    let (final_track, outcome) = if music_file.exists() {
        let music = AudioTrack::from_file(music_file)
            .with_context(|| format!("loading music {}", music_file.display()))?;
        (
            overlay_music(speech, &music, music_gain_db)?,
            MixOutcome::Mixed,
        )
    } else {
        info!("background music file not found, skipping mixing");
        (speech, MixOutcome::SpeechOnly)
    };

    final_track.export(output_file)?;
    Ok(outcome)
}

/// Attenuate, loop/cut to the speech length, and sum under the speech.
/// The result has exactly as many frames as `speech`.
pub fn overlay_music(speech: AudioTrack, music: &AudioTrack, gain_db: f32) -> Result<AudioTrack> {
    let frames = speech.frames();
    let bed = music
        .converted(speech.channels(), speech.sample_rate())
        .with_gain_db(gain_db)
        .looped_to(frames);
    let mut mixed = speech;
    mixed.overlay(&bed)?;
    Ok(mixed)
}

/// Same as [`add_background_music`], off the async executor.
pub async fn add_background_music_blocking(
    speech_file: PathBuf,
    music_file: PathBuf,
    output_file: PathBuf,
    music_gain_db: f32,
) -> Result<MixOutcome> {
    tokio::task::spawn_blocking(move || {
        add_background_music(&speech_file, &music_file, &output_file, music_gain_db)
    })
    .await
    .context("mixing task panicked")?
}
