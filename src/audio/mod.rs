// src/audio/mod.rs
//! In-memory audio buffers and the few transforms the pipeline needs.
//!
//! Decoding and sample-rate conversion go through `rodio`; export lives in
//! [`encode`]. Samples are interleaved `f32` in `[-1.0, 1.0]`.

pub mod encode;
pub mod mixer;

use anyhow::{anyhow, bail, Context, Result};
use rodio::buffer::SamplesBuffer;
use rodio::source::UniformSourceIterator;
use rodio::{Decoder, Source};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl AudioTrack {
    pub fn new(channels: u16, sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Silence of `frames` frames.
    pub fn silence(channels: u16, sample_rate: u32, frames: usize) -> Self {
        Self::new(channels, sample_rate, vec![0.0; frames * channels as usize])
    }

    /// Decode any container rodio understands (MP3, WAV).
    pub fn decode(bytes: Vec<u8>) -> Result<Self> {
        let decoder =
            Decoder::new(Cursor::new(bytes)).map_err(|e| anyhow!("decoding audio: {e}"))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        if channels == 0 || sample_rate == 0 {
            bail!("decoded stream has no channels or sample rate");
        }
        let samples: Vec<f32> = decoder.collect();
        Ok(Self::new(channels, sample_rate, samples))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading audio {}", path.display()))?;
        Self::decode(bytes).with_context(|| format!("decoding {}", path.display()))
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    fn same_format(&self, other: &AudioTrack) -> bool {
        self.channels == other.channels && self.sample_rate == other.sample_rate
    }

    /// Resample / remix to the given layout.
    pub fn converted(&self, channels: u16, sample_rate: u32) -> AudioTrack {
        if self.channels == channels && self.sample_rate == sample_rate {
            return self.clone();
        }
        if self.is_empty() {
            return AudioTrack::new(channels, sample_rate, Vec::new());
        }
        let source = SamplesBuffer::new(self.channels, self.sample_rate, self.samples.clone());
        let samples: Vec<f32> = UniformSourceIterator::new(source, channels, sample_rate).collect();
        AudioTrack::new(channels, sample_rate, samples)
    }

    /// Pitch shift by sample-rate reinterpretation.
    ///
    /// The raw samples are played back at `rate * 2^(semitones/12)` and then
    /// resampled to the original rate, so pitch and tempo change together.
    pub fn pitch_shifted(&self, semitones: f32) -> AudioTrack {
        let shifted_rate = shifted_sample_rate(self.sample_rate, semitones);
        if self.is_empty() || shifted_rate == 0 || shifted_rate == self.sample_rate {
            return self.clone();
        }
        let reinterpreted = SamplesBuffer::new(self.channels, shifted_rate, self.samples.clone());
        let samples: Vec<f32> =
            UniformSourceIterator::new(reinterpreted, self.channels, self.sample_rate).collect();
        AudioTrack::new(self.channels, self.sample_rate, samples)
    }

    /// Concatenate `other` after `self`, converting it to this track's layout.
    pub fn append(&mut self, other: &AudioTrack) {
        if other.is_empty() {
            return;
        }
        if self.same_format(other) {
            self.samples.extend_from_slice(&other.samples);
        } else {
            let converted = other.converted(self.channels, self.sample_rate);
            self.samples.extend_from_slice(&converted.samples);
        }
    }

    pub fn with_gain_db(mut self, db: f32) -> AudioTrack {
        let factor = 10f32.powf(db / 20.0);
        for s in &mut self.samples {
            *s *= factor;
        }
        self
    }

    /// Repeat the whole track until it covers `frames`, then cut to exactly
    /// `frames`. The cut may land mid-repetition.
    pub fn looped_to(&self, frames: usize) -> AudioTrack {
        if self.is_empty() {
            return AudioTrack::silence(self.channels.max(1), self.sample_rate, frames);
        }
        let repeats = frames / self.frames() + 1;
        let wanted = frames * self.channels as usize;
        let mut samples = Vec::with_capacity(self.samples.len() * repeats);
        for _ in 0..repeats {
            samples.extend_from_slice(&self.samples);
        }
        samples.truncate(wanted);
        AudioTrack::new(self.channels, self.sample_rate, samples)
    }

    /// Additive mix of `other` into `self` from time zero, clamped.
    /// `other` must already share this track's layout.
    pub fn overlay(&mut self, other: &AudioTrack) -> Result<()> {
        if !self.same_format(other) {
            bail!(
                "overlay layout mismatch: {}ch@{}Hz vs {}ch@{}Hz",
                self.channels,
                self.sample_rate,
                other.channels,
                other.sample_rate
            );
        }
        for (base, add) in self.samples.iter_mut().zip(other.samples.iter()) {
            *base = (*base + *add).clamp(-1.0, 1.0);
        }
        Ok(())
    }

    /// Write to `path`; the container follows the extension.
    pub fn export(&self, path: &Path) -> Result<()> {
        encode::export(self, path)
    }
}

pub fn shifted_sample_rate(sample_rate: u32, semitones: f32) -> u32 {
    let factor = 2f64.powf(semitones as f64 / 12.0);
    (sample_rate as f64 * factor) as u32
}


#[cfg(test)]
mod tests {
    use super::test_support::tone;
    use super::*;

    #[test]
    fn shifted_rate_truncates_like_integer_cast() {
        assert_eq!(shifted_sample_rate(24_000, 0.0), 24_000);
        assert_eq!(shifted_sample_rate(24_000, 12.0), 48_000);
        assert_eq!(shifted_sample_rate(24_000, -4.5), 18_506);
        assert_eq!(shifted_sample_rate(24_000, 4.5), 31_124);
    }

    #[test]
    fn pitch_shift_keeps_rate_and_scales_duration() {
        let rate = 24_000;
        let track = tone(rate, rate as usize, 220.0, 0.5);
        for shift in [-4.5f32, 4.5] {
            let out = track.pitch_shifted(shift);
            assert_eq!(out.sample_rate(), rate);
            assert_eq!(out.channels(), 1);
            let new_rate = shifted_sample_rate(rate, shift) as f64;
            let expected = track.frames() as f64 * rate as f64 / new_rate;
            let got = out.frames() as f64;
            // one millisecond of slack for converter edge frames
            assert!(
                (got - expected).abs() <= rate as f64 / 1000.0,
                "shift {shift}: got {got} frames, expected ~{expected}"
            );
        }
    }

    #[test]
    fn decodes_wav_intermediates() {
        let track = tone(16_000, 1_600, 440.0, 0.5);
        let decoded = AudioTrack::decode(encode::wav_bytes(&track).unwrap()).unwrap();
        assert_eq!(decoded.channels(), 1);
        assert_eq!(decoded.sample_rate(), 16_000);
        assert_eq!(decoded.frames(), 1_600);
        assert!(AudioTrack::decode(b"not audio".to_vec()).is_err());
    }

    #[test]
    fn append_converts_layout() {
        let mut a = tone(16_000, 1_600, 440.0, 0.2);
        let b = AudioTrack::silence(2, 16_000, 800);
        a.append(&b);
        assert_eq!(a.channels(), 1);
        assert_eq!(a.frames(), 2_400);
    }

    #[test]
    fn loop_then_truncate_is_sample_accurate() {
        let music = tone(8_000, 300, 100.0, 0.3);
        let looped = music.looped_to(1_000);
        assert_eq!(looped.frames(), 1_000);
        assert_eq!(looped.samples()[300], music.samples()[0]);
        assert_eq!(looped.samples()[999], music.samples()[99]);

        let shorter = music.looped_to(120);
        assert_eq!(shorter.frames(), 120);
    }

    #[test]
    fn gain_of_minus_12_db_quarters_amplitude_roughly() {
        let t = AudioTrack::new(1, 8_000, vec![1.0, -1.0]).with_gain_db(-12.0);
        assert!((t.samples()[0] - 0.2512).abs() < 1e-3);
        assert!((t.samples()[1] + 0.2512).abs() < 1e-3);
    }

    #[test]
    fn overlay_adds_and_clamps() {
        let mut base = AudioTrack::new(1, 8_000, vec![0.5, 0.9, -0.9]);
        let add = AudioTrack::new(1, 8_000, vec![0.25, 0.5, -0.5]);
        base.overlay(&add).unwrap();
        assert_eq!(base.samples(), &[0.75, 1.0, -1.0]);

        let other_rate = AudioTrack::new(1, 16_000, vec![0.0]);
        assert!(base.overlay(&other_rate).is_err());
    }
}
