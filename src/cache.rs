//! Two-level translation cache
//!
//! * `MemoryCache` lives for the whole process. It is filled from every disk
//!   cache hit and every fresh translation, and is never written to disk.
//! * `FileCache` belongs to one target catalog (one file in one language
//!   directory) and is persisted under
//!   `<cache_dir>/<language dir name>/<file name>`:
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": {
//!     "Save": { "translation": "Salva", "timestamp": 1760860800 }
//!   }
//! }
//! ```
//!
//! Entries older than the TTL are ignored on lookup but stay in the file
//! until a new translation overwrites them.

use crate::mt::error::{MtError, MtResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Schema version written into every cache file
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Default lifetime of a cached translation
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A cached translation and when it was made (epoch seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub translation: String,
    pub timestamp: i64,
}

impl CacheEntry {
    /// Entry stamped with the current time
    pub fn new(translation: impl Into<String>) -> Self {
        Self::at(translation, Utc::now().timestamp())
    }

    pub fn at(translation: impl Into<String>, timestamp: i64) -> Self {
        Self {
            translation: translation.into(),
            timestamp,
        }
    }
}

/// True once `timestamp` is more than `ttl` in the past
pub fn is_expired(timestamp: i64, ttl: Duration) -> bool {
    is_expired_at(timestamp, ttl, Utc::now().timestamp())
}

/// `is_expired` against an explicit clock
pub fn is_expired_at(timestamp: i64, ttl: Duration, now: i64) -> bool {
    let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    now.saturating_sub(timestamp) > ttl
}

fn default_version() -> u32 {
    CACHE_SCHEMA_VERSION
}

/// Cached translations for one target catalog, keyed by source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCache {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub entries: BTreeMap<String, CacheEntry>,
}

impl Default for FileCache {
    fn default() -> Self {
        Self {
            version: CACHE_SCHEMA_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `text` unless it has expired
    pub fn get_fresh(&self, text: &str, ttl: Duration) -> Option<&CacheEntry> {
        self.entries
            .get(text)
            .filter(|entry| !is_expired(entry.timestamp, ttl))
    }

    /// Record a translation made just now
    pub fn insert(&mut self, text: impl Into<String>, translation: impl Into<String>) {
        self.upsert(text, CacheEntry::new(translation));
    }

    /// Store `entry` unless a newer entry for the same text already exists
    pub fn upsert(&mut self, text: impl Into<String>, entry: CacheEntry) {
        let text = text.into();
        match self.entries.get(&text) {
            Some(existing) if existing.timestamp > entry.timestamp => {}
            _ => {
                self.entries.insert(text, entry);
            }
        }
    }
}

/// Process-wide cache of translations, keyed by language then source text
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: HashMap<String, HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, lang: &str, text: &str) -> Option<&str> {
        self.entries
            .get(lang)
            .and_then(|by_text| by_text.get(text))
            .map(String::as_str)
    }

    pub fn insert(&mut self, lang: &str, text: impl Into<String>, translation: impl Into<String>) {
        self.entries
            .entry(lang.to_string())
            .or_default()
            .insert(text.into(), translation.into());
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads and writes `FileCache` documents under a cache root directory
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<basename of target_dir>/<file_name>`
    pub fn path_for(&self, target_dir: &Path, file_name: &str) -> PathBuf {
        let lang_dir = target_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "default".to_string());
        self.root.join(lang_dir).join(file_name)
    }

    /// Load the cache for one target file
    ///
    /// A missing or unreadable document is a cold start, not an error.
    pub fn load(&self, target_dir: &Path, file_name: &str) -> FileCache {
        let path = self.path_for(target_dir, file_name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No cache at {}: {}", path.display(), e);
                return FileCache::new();
            }
        };

        match serde_json::from_str::<FileCache>(&content) {
            Ok(cache) => {
                debug!("Loaded {} cache entries from {}", cache.len(), path.display());
                cache
            }
            Err(e) => {
                warn!("Ignoring malformed cache {}: {}", path.display(), e);
                FileCache::new()
            }
        }
    }

    /// Persist the cache for one target file, creating directories as needed
    pub fn save(&self, target_dir: &Path, file_name: &str, cache: &FileCache) -> MtResult<()> {
        let path = self.path_for(target_dir, file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                MtError::IoError(format!(
                    "Failed to create cache directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(cache)
            .map_err(|e| MtError::IoError(format!("Failed to serialize cache: {}", e)))?;

        fs::write(&path, json).map_err(|e| {
            MtError::IoError(format!("Failed to write cache '{}': {}", path.display(), e))
        })
    }
}
