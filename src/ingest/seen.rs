// src/ingest/seen.rs
//! Seen-URL stores. An article URL in the store is never processed again.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub trait SeenStore: Send + Sync {
    fn contains(&self, url: &str) -> bool;
    /// Record `url`. Returns `true` when it was not present before.
    fn insert(&self, url: &str) -> Result<bool>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type DynSeenStore = Arc<dyn SeenStore>;

/// Process-lifetime set. No eviction; dedup history is lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySeenStore {
    urls: Mutex<HashSet<String>>,
}

impl SeenStore for InMemorySeenStore {
    fn contains(&self, url: &str) -> bool {
        self.urls
            .lock()
            .map(|g| g.contains(url))
            .unwrap_or(false)
    }

    fn insert(&self, url: &str) -> Result<bool> {
        let mut g = self
            .urls
            .lock()
            .map_err(|_| anyhow::anyhow!("seen store lock poisoned"))?;
        Ok(g.insert(url.to_string()))
    }

    fn len(&self) -> usize {
        self.urls.lock().map(|g| g.len()).unwrap_or(0)
    }
}

/// Append-only newline-delimited file, loaded fully at open.
#[derive(Debug)]
pub struct FileSeenStore {
    path: PathBuf,
    inner: InMemorySeenStore,
    file: Mutex<fs::File>,
}

impl FileSeenStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let inner = InMemorySeenStore::default();
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading seen store {}", path.display()))?;
            for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
                inner.insert(line)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening seen store {}", path.display()))?;

        tracing::info!(path = %path.display(), urls = inner.len(), "seen store loaded");
        Ok(Self {
            path,
            inner,
            file: Mutex::new(file),
        })
    }
}

impl SeenStore for FileSeenStore {
    fn contains(&self, url: &str) -> bool {
        self.inner.contains(url)
    }

    fn insert(&self, url: &str) -> Result<bool> {
        let url = url.trim();
        if !self.inner.insert(url)? {
            return Ok(false);
        }
        let mut f = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("seen store file lock poisoned"))?;
        writeln!(f, "{url}").with_context(|| format!("appending to {}", self.path.display()))?;
        Ok(true)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

/// In-memory unless a path is configured.
pub fn open_seen_store(path: Option<&Path>) -> Result<DynSeenStore> {
    Ok(match path {
        Some(p) => Arc::new(FileSeenStore::open(p)?),
        None => Arc::new(InMemorySeenStore::default()),
    })
}
