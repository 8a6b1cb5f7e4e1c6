// src/podcast/mod.rs
//! On-disk podcast library:
//! `{root}/{category}/{safe_title}.mp3` plus a `.txt` transcript beside it.

pub mod pipeline;

use anyhow::{bail, Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const AUDIO_EXT: &str = "mp3";
pub const TRANSCRIPT_EXT: &str = "txt";
const MAX_STEM_CHARS: usize = 100;

/// Headline -> filename: forbidden characters removed, spaces to `_`,
/// first 100 characters, `.mp3` appended.
pub fn safe_filename(title: &str) -> String {
    static RE_FORBIDDEN: OnceCell<Regex> = OnceCell::new();
    let re = RE_FORBIDDEN.get_or_init(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());
    let stem: String = re
        .replace_all(title, "")
        .replace(' ', "_")
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();
    format!("{stem}.{AUDIO_EXT}")
}

/// Filename without its last extension.
pub fn base_name(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(i) if i > 0 => &filename[..i],
        _ => filename,
    }
}

/// A single path component from a client: non-empty, not `.` or `..`, no
/// separators. Dots inside a name (`Markets_slide..._again.mp3`) are fine.
pub fn is_safe_component(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\'])
}

/// Episode audio names: a safe component ending in `.mp3`, as produced by
/// [`safe_filename`] and shown by [`Library::list`].
pub fn is_episode_filename(s: &str) -> bool {
    is_safe_component(s) && s.ends_with(".mp3")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodcastEntry {
    pub title: String,
    pub filename: String,
    pub category: String,
}

pub type PodcastListing = BTreeMap<String, Vec<PodcastEntry>>;

#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.root.join(category)
    }

    pub fn audio_path(&self, category: &str, filename: &str) -> PathBuf {
        self.category_dir(category).join(filename)
    }

    /// Transcript sits next to the audio with the extension swapped.
    pub fn transcript_path(&self, category: &str, filename: &str) -> PathBuf {
        self.category_dir(category)
            .join(format!("{}.{TRANSCRIPT_EXT}", base_name(filename)))
    }

    pub fn ensure_category(&self, category: &str) -> Result<PathBuf> {
        let dir = self.category_dir(category);
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(dir)
    }

    /// Categories ascending, files descending by name; only `.mp3` files,
    /// categories without any are omitted. A missing root lists as empty.
    pub fn list(&self) -> Result<PodcastListing> {
        let mut out = PodcastListing::new();
        if !self.root.exists() {
            return Ok(out);
        }

        let mut categories = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("reading {}", self.root.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                categories.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        categories.sort();

        for category in categories {
            let dir = self.category_dir(&category);
            let mut files: Vec<String> = fs::read_dir(&dir)
                .with_context(|| format!("reading {}", dir.display()))?
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| is_episode_filename(name))
                .collect();
            if files.is_empty() {
                continue;
            }
            files.sort_by(|a, b| b.cmp(a));

            let entries = files
                .into_iter()
                .map(|filename| PodcastEntry {
                    title: filename.replace(".mp3", "").replace('_', " "),
                    filename,
                    category: category.clone(),
                })
                .collect();
            out.insert(category, entries);
        }
        Ok(out)
    }

    /// `Ok(None)` when the transcript does not exist.
    pub fn read_transcript(&self, category: &str, filename: &str) -> Result<Option<String>> {
        let path = self.transcript_path(category, filename);
        if !path.exists() {
            return Ok(None);
        }
        let text =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        Ok(Some(text))
    }

    pub fn write_transcript(&self, category: &str, filename: &str, text: &str) -> Result<PathBuf> {
        if !is_safe_component(category) || !is_safe_component(filename) {
            bail!("unsafe path component in {category}/{filename}");
        }
        let path = self.transcript_path(category, filename);
        fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}
