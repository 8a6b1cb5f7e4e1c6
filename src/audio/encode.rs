// src/audio/encode.rs
//! Export: 16-bit PCM WAV via `hound` (intermediates), MP3 via LAME (final episodes).

use anyhow::{anyhow, bail, Context, Result};
use mp3lame_encoder::{max_required_buffer_size, Builder, DualPcm, FlushNoGap, MonoPcm};
use std::io::Cursor;
use std::path::Path;

use super::AudioTrack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "wav" => Some(AudioFormat::Wav),
            "mp3" => Some(AudioFormat::Mp3),
            _ => None,
        }
    }
}

pub fn export(track: &AudioTrack, path: &Path) -> Result<()> {
    let bytes = match AudioFormat::from_path(path) {
        Some(AudioFormat::Wav) => wav_bytes(track)?,
        Some(AudioFormat::Mp3) => mp3_bytes(track)?,
        None => bail!("unsupported audio extension: {}", path.display()),
    };
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

fn to_i16(s: f32) -> i16 {
    (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

pub fn wav_bytes(track: &AudioTrack) -> Result<Vec<u8>> {
    if track.channels() == 0 || track.sample_rate() == 0 {
        bail!("cannot write WAV without channels or sample rate");
    }
    let spec = hound::WavSpec {
        channels: track.channels(),
        sample_rate: track.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).context("starting WAV")?;
        for &s in track.samples() {
            writer.write_sample(to_i16(s)).context("writing WAV sample")?;
        }
        writer.finalize().context("finalizing WAV")?;
    }
    Ok(cursor.into_inner())
}

pub fn mp3_bytes(track: &AudioTrack) -> Result<Vec<u8>> {
    // LAME takes at most two channels.
    let track = if track.channels() > 2 {
        track.converted(2, track.sample_rate())
    } else {
        track.clone()
    };
    let channels = track.channels();
    if channels == 0 || track.sample_rate() == 0 {
        bail!("cannot write MP3 without channels or sample rate");
    }

    let mut builder = Builder::new().ok_or_else(|| anyhow!("creating LAME encoder"))?;
    builder
        .set_num_channels(channels as u8)
        .map_err(|e| anyhow!("LAME channels: {e:?}"))?;
    builder
        .set_sample_rate(track.sample_rate())
        .map_err(|e| anyhow!("LAME sample rate: {e:?}"))?;
    let mut encoder = builder
        .build()
        .map_err(|e| anyhow!("initializing LAME: {e:?}"))?;

    let pcm: Vec<i16> = track.samples().iter().copied().map(to_i16).collect();
    let mut out = Vec::new();
    if channels == 1 {
        out.reserve(max_required_buffer_size(pcm.len()));
        encoder
            .encode_to_vec(MonoPcm(&pcm), &mut out)
            .map_err(|e| anyhow!("MP3 encode: {e:?}"))?;
    } else {
        let (left, right): (Vec<i16>, Vec<i16>) =
            pcm.chunks_exact(2).map(|f| (f[0], f[1])).unzip();
        out.reserve(max_required_buffer_size(left.len()));
        encoder
            .encode_to_vec(
                DualPcm {
                    left: &left,
                    right: &right,
                },
                &mut out,
            )
            .map_err(|e| anyhow!("MP3 encode: {e:?}"))?;
    }
    out.reserve(max_required_buffer_size(0));
    encoder
        .flush_to_vec::<FlushNoGap>(&mut out)
        .map_err(|e| anyhow!("MP3 flush: {e:?}"))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::test_support::tone;

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            AudioFormat::from_path(Path::new("a/b.MP3")),
            Some(AudioFormat::Mp3)
        );
        assert_eq!(
            AudioFormat::from_path(Path::new("x.wav")),
            Some(AudioFormat::Wav)
        );
        assert_eq!(AudioFormat::from_path(Path::new("x.ogg")), None);
    }

    #[test]
    fn wav_bytes_decode_back_to_same_shape() {
        let t = tone(16_000, 4_000, 330.0, 0.5);
        let bytes = wav_bytes(&t).unwrap();
        let back = AudioTrack::decode(bytes).unwrap();
        assert_eq!(back.channels(), 1);
        assert_eq!(back.sample_rate(), 16_000);
        assert_eq!(back.frames(), 4_000);
    }

    #[test]
    fn mp3_export_produces_bytes() {
        let t = tone(24_000, 24_000, 440.0, 0.5);
        let bytes = mp3_bytes(&t).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let t = tone(8_000, 10, 100.0, 0.1);
        assert!(export(&t, &dir.path().join("out.flac")).is_err());
    }
}
