// src/voice.rs
//! Voice pool selection: symbolic voice keys -> ordered voice identifiers,
//! plus the pitch heuristic and the TTS locale for each identifier.
//!
//! Identifiers are Google Translate TLDs (`us`, `co.uk`, ...), except `en-IN`,
//! which stands for Indian English and is served from the `co.in` domain.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

pub const RANDOM_KEY: &str = "random";

pub const MALE_PITCH_SHIFT: f32 = -4.5;
pub const FEMALE_PITCH_SHIFT: f32 = 4.5;

const MALE_US: &[&str] = &["us"];
const FEMALE_UK: &[&str] = &["co.uk"];
const MALE_IN: &[&str] = &["en-IN"];
const FEMALE_AU: &[&str] = &["com.au"];
const MALE_CA: &[&str] = &["ca"];
const FEMALE_IE: &[&str] = &["ie"];

/// Identifiers that always get the higher pitch, whatever the key.
const FEMALE_VOICES: &[&str] = &["co.uk", "com.au", "ie"];

/// Voice keys accepted by the front-end.
pub const VOICE_KEYS: &[&str] = &[
    RANDOM_KEY,
    "male_us",
    "female_uk",
    "male_in",
    "female_au",
    "female_in",
    "male_ca",
];

/// Every distinct identifier, in declaration order.
pub fn all_distinct_voices() -> Vec<String> {
    [MALE_US, FEMALE_UK, MALE_IN, FEMALE_AU, MALE_CA, FEMALE_IE]
        .iter()
        .flat_map(|group| group.iter().map(|v| v.to_string()))
        .collect()
}

/// Locale handed to the speech backend for one voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub lang: String,
    pub tld: String,
}

/// Map from voice key to its pool.
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    pools: BTreeMap<String, Vec<String>>,
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        let owned = |g: &[&str]| g.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        let mut pools = BTreeMap::new();
        pools.insert(RANDOM_KEY.to_string(), all_distinct_voices());
        pools.insert("male_us".to_string(), owned(MALE_US));
        pools.insert("female_uk".to_string(), owned(FEMALE_UK));
        pools.insert("male_in".to_string(), owned(MALE_IN));
        pools.insert("female_au".to_string(), owned(FEMALE_AU));
        // female_in is backed by the Indian identifier, which is not in the
        // female subset; the higher pitch comes only from the key name.
        pools.insert("female_in".to_string(), owned(MALE_IN));
        pools.insert("male_ca".to_string(), owned(MALE_CA));
        Self { pools }
    }
}

impl VoiceCatalog {
    /// Built-in pools with per-key overrides layered on top.
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<String>>) -> Self {
        let mut catalog = Self::default();
        for (key, voices) in overrides {
            let cleaned = voices
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            catalog.pools.insert(key.trim().to_string(), cleaned);
        }
        catalog
    }

    /// Resolve a key to the concrete pool for one synthesis call.
    ///
    /// `random` keeps its declared order; every other key (unknown keys fall
    /// back to the full pool) is shuffled once. An empty pool is replaced by
    /// the full distinct set, shuffled.
    pub fn resolve<R: Rng + ?Sized>(&self, key: &str, rng: &mut R) -> VoicePool {
        let mut voices = match self.pools.get(key) {
            Some(pool) => pool.clone(),
            None => {
                tracing::warn!(key, accepted = ?VOICE_KEYS, "unknown voice key, using every voice");
                all_distinct_voices()
            }
        };

        if key != RANDOM_KEY {
            voices.shuffle(rng);
        }

        if voices.is_empty() {
            voices = all_distinct_voices();
            voices.shuffle(rng);
        }

        VoicePool {
            key: key.to_string(),
            voices,
        }
    }
}

/// Resolved, non-empty pool cycled over the script segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoicePool {
    key: String,
    voices: Vec<String>,
}

impl VoicePool {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn voices(&self) -> &[String] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Round-robin pick for segment `index`.
    pub fn voice_for(&self, index: usize) -> &str {
        &self.voices[index % self.voices.len()]
    }

    /// Semitone shift for `voice` under this pool's key.
    pub fn pitch_shift(&self, voice: &str) -> f32 {
        pitch_shift_for(&self.key, voice)
    }
}

/// Heuristic: "female" in the key or a female-associated identifier -> up.
pub fn pitch_shift_for(key: &str, voice: &str) -> f32 {
    if key.contains("female") || FEMALE_VOICES.contains(&voice) {
        FEMALE_PITCH_SHIFT
    } else {
        MALE_PITCH_SHIFT
    }
}

pub fn locale_for(voice: &str, lang: &str) -> Locale {
    let tld = match voice {
        "en-IN" => "co.in",
        other => other,
    };
    Locale {
        lang: lang.to_string(),
        tld: tld.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn random_pool_keeps_declared_order() {
        let pool = VoiceCatalog::default().resolve(RANDOM_KEY, &mut rng());
        assert_eq!(pool.voices(), all_distinct_voices().as_slice());
        assert_eq!(pool.voice_for(0), "us");
        assert_eq!(pool.voice_for(6), "us");
        assert_eq!(pool.voice_for(7), "co.uk");
    }

    #[test]
    fn unknown_key_falls_back_to_full_pool() {
        let pool = VoiceCatalog::default().resolve("robot", &mut rng());
        let mut got = pool.voices().to_vec();
        got.sort();
        let mut want = all_distinct_voices();
        want.sort();
        assert_eq!(got, want);
    }

    #[test]
    fn every_front_end_key_has_its_own_pool() {
        let catalog = VoiceCatalog::default();
        for key in VOICE_KEYS.iter().filter(|k| **k != RANDOM_KEY) {
            assert_eq!(catalog.resolve(key, &mut rng()).len(), 1, "{key}");
        }
    }

    #[test]
    fn segments_cycle_round_robin() {
        let pool = VoiceCatalog::default().resolve("robot", &mut rng());
        let m = pool.len();
        for i in 0..20 {
            assert_eq!(pool.voice_for(i), pool.voices()[i % m]);
        }
    }

    #[test]
    fn empty_override_uses_full_pool() {
        let mut overrides = BTreeMap::new();
        overrides.insert("male_us".to_string(), vec![" ".to_string()]);
        let pool = VoiceCatalog::with_overrides(&overrides).resolve("male_us", &mut rng());
        assert_eq!(pool.len(), all_distinct_voices().len());
    }

    #[test]
    fn pitch_heuristic() {
        assert_eq!(pitch_shift_for("male_us", "us"), MALE_PITCH_SHIFT);
        assert_eq!(pitch_shift_for("female_in", "en-IN"), FEMALE_PITCH_SHIFT);
        assert_eq!(pitch_shift_for("male_in", "en-IN"), MALE_PITCH_SHIFT);
        assert_eq!(pitch_shift_for(RANDOM_KEY, "ie"), FEMALE_PITCH_SHIFT);
        assert_eq!(pitch_shift_for(RANDOM_KEY, "ca"), MALE_PITCH_SHIFT);
    }

    #[test]
    fn indian_voice_uses_co_in_domain() {
        assert_eq!(locale_for("en-IN", "en").tld, "co.in");
        assert_eq!(locale_for("co.uk", "en").tld, "co.uk");
    }

    #[test]
    fn female_in_resolves_to_indian_identifier() {
        let pool = VoiceCatalog::default().resolve("female_in", &mut rng());
        assert_eq!(pool.voices(), ["en-IN".to_string()].as_slice());
        assert_eq!(pool.pitch_shift("en-IN"), FEMALE_PITCH_SHIFT);
    }
}
