//! Run configuration
//!
//! `SessionConfig` holds the knobs of the batch translator and cache.
//! Proper nouns come from a small JSON document:
//!
//! ```json
//! {
//!     "description": "Brand and product names that must never be translated",
//!     "properNouns": ["Acme", "Acme Cloud"]
//! }
//! ```

use crate::cache::DEFAULT_CACHE_TTL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default location of the proper-noun list
pub const DEFAULT_PROPER_NOUNS_PATH: &str = "./config/proper-nouns.json";

/// Default root for on-disk translation caches
pub const DEFAULT_CACHE_DIR: &str = ".deepl_cache";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProperNounsConfig {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub proper_nouns: Vec<String>,
}

/// Load the proper-noun list
///
/// A missing or malformed file only degrades protection, so both cases
/// log a warning and yield an empty list.
pub fn load_proper_nouns(path: &Path) -> Vec<String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            warn!(
                "Proper noun config not found at {}, using an empty list",
                path.display()
            );
            return Vec::new();
        }
    };

    match serde_json::from_str::<ProperNounsConfig>(&content) {
        Ok(config) => {
            info!("Loaded {} proper nouns", config.proper_nouns.len());
            config.proper_nouns
        }
        Err(e) => {
            warn!(
                "Failed to parse proper noun config {}: {}, using an empty list",
                path.display(),
                e
            );
            Vec::new()
        }
    }
}

/// Tunables for one translation session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Minimum gap between two backend requests
    pub min_request_interval: Duration,
    /// Wait after an HTTP 429 before retrying
    pub retry_backoff: Duration,
    /// Attempts per request, the first one included
    pub max_attempts: u32,
    /// Texts per backend request
    pub max_batch_size: usize,
    /// Age after which a cached translation is ignored
    pub cache_ttl: Duration,
    /// Root of the on-disk caches
    pub cache_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_request_interval: Duration::from_millis(500),
            retry_backoff: Duration::from_secs(5),
            max_attempts: 5,
            max_batch_size: 50,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}

impl SessionConfig {
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }
}
