//! Cache-aware batch translation
//!
//! `BatchTranslator` is the session object of a run. It owns the backend,
//! the proper-noun list, the process-wide memory cache, the rate limiter and
//! the request counters, and is passed by `&mut` to everything that
//! translates. Nothing here is global.
//!
//! For each call:
//! 1. Empty strings and pure placeholders pass through.
//! 2. The memory cache, then the file cache (ignoring expired entries), are
//!    consulted. Hits never reach the backend.
//! 3. What is left is protected with one `TokenGenerator` for the whole
//!    call, split into requests of at most `max_batch_size` texts, and sent
//!    through the rate limiter. HTTP 429 is retried after a fixed backoff,
//!    up to `max_attempts`.
//! 4. Responses are matched to originals by position, restored, and written
//!    to both caches.

use crate::cache::{FileCache, MemoryCache};
use crate::config::SessionConfig;
use crate::mt::error::{MtError, MtResult};
use crate::mt::protect::{ProtectionMap, TokenGenerator, protect, restore};
use crate::mt::translator::MachineTranslator;
use crate::walker::is_translatable;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Successful backend requests
    pub requests: usize,
    /// Texts answered from a cache
    pub hits: usize,
    /// Texts sent to the backend
    pub misses: usize,
    /// Requests repeated after a rate limit response
    pub retries: usize,
}

impl SessionStats {
    /// Percentage of lookups served from cache, if there were any lookups
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        (total > 0).then(|| self.hits as f64 / total as f64 * 100.0)
    }
}

/// Enforces a minimum gap between consecutive backend requests
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Wait until the interval since the previous request has passed
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// A queued text on its way to the backend
struct PendingText {
    original: String,
    protected: String,
    map: ProtectionMap,
}

pub struct BatchTranslator {
    translator: Box<dyn MachineTranslator>,
    proper_nouns: Vec<String>,
    config: SessionConfig,
    memory: MemoryCache,
    limiter: RateLimiter,
    stats: SessionStats,
}

impl BatchTranslator {
    pub fn new(
        translator: Box<dyn MachineTranslator>,
        proper_nouns: Vec<String>,
        config: SessionConfig,
    ) -> Self {
        let limiter = RateLimiter::new(config.min_request_interval);
        Self {
            translator,
            proper_nouns,
            config,
            memory: MemoryCache::new(),
            limiter,
            stats: SessionStats::default(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn memory(&self) -> &MemoryCache {
        &self.memory
    }

    pub fn provider_name(&self) -> &str {
        self.translator.provider_name()
    }

    /// Translate `texts` into `target_lang`, returning original → translation
    ///
    /// Every input text that is a passthrough or a cache hit, or that the
    /// backend translated, appears in the result. `file_cache` receives a
    /// fresh entry for each backend translation.
    pub async fn translate_batch(
        &mut self,
        texts: &[String],
        target_lang: &str,
        file_cache: &mut FileCache,
    ) -> MtResult<HashMap<String, String>> {
        let hits_before = self.stats.hits;
        let mut results = HashMap::new();
        let mut queued = HashSet::new();
        let mut queue = Vec::new();

        for text in texts {
            if results.contains_key(text) || queued.contains(text) {
                continue;
            }

            if !is_translatable(text) {
                results.insert(text.clone(), text.clone());
                continue;
            }

            if let Some(cached) = self.memory.get(target_lang, text) {
                self.stats.hits += 1;
                results.insert(text.clone(), cached.to_string());
                continue;
            }

            if let Some(entry) = file_cache.get_fresh(text, self.config.cache_ttl) {
                self.stats.hits += 1;
                self.memory
                    .insert(target_lang, text.clone(), entry.translation.clone());
                results.insert(text.clone(), entry.translation.clone());
                continue;
            }

            queued.insert(text.clone());
            queue.push(text.clone());
        }

        if queue.is_empty() {
            debug!("All {} texts served without a request", results.len());
            return Ok(results);
        }

        let mut tokens = TokenGenerator::new();
        let pending: Vec<PendingText> = queue
            .into_iter()
            .map(|original| {
                let (protected, map) = protect(&original, &self.proper_nouns, &mut tokens);
                PendingText {
                    original,
                    protected,
                    map,
                }
            })
            .collect();

        let chunk_size = self.config.max_batch_size.max(1);
        for chunk in pending.chunks(chunk_size) {
            let request: Vec<String> = chunk.iter().map(|p| p.protected.clone()).collect();
            let translated = self.send_with_retry(&request, target_lang).await?;

            if translated.len() != chunk.len() {
                return Err(MtError::TranslationError(format!(
                    "{} returned {} translations for {} texts",
                    self.translator.provider_name(),
                    translated.len(),
                    chunk.len()
                )));
            }

            for (position, (item, translated)) in chunk.iter().zip(translated).enumerate() {
                let final_text = Self::unprotect(position, item, &translated);
                self.memory
                    .insert(target_lang, item.original.clone(), final_text.clone());
                file_cache.insert(item.original.clone(), final_text.clone());
                results.insert(item.original.clone(), final_text);
            }

            self.stats.requests += 1;
            self.stats.misses += chunk.len();
        }

        info!(
            "Translated {} texts ({} cache hits)",
            pending.len(),
            self.stats.hits - hits_before
        );

        Ok(results)
    }

    /// Restore one response item, logging anything suspicious
    fn unprotect(position: usize, item: &PendingText, translated: &str) -> String {
        if item.map.is_empty() {
            return translated.to_string();
        }

        debug!(
            "[#{}] {} ({} protected spans)",
            position + 1,
            item.original,
            item.map.len()
        );

        let outcome = restore(translated, &item.map);

        if outcome.restored == 0 {
            warn!(
                "Nothing restored for '{}', translation was '{}'",
                item.original, translated
            );
        }
        for warning in &outcome.warnings {
            warn!("'{}': {}", item.original, warning);
        }
        if !outcome.leaked.is_empty() {
            error!(
                "'{}': {} unrestored tokens in output: {:?}",
                item.original,
                outcome.leaked.len(),
                outcome.leaked
            );
        }

        outcome.text
    }

    /// One backend request, retried on rate limiting
    async fn send_with_retry(&mut self, texts: &[String], target_lang: &str) -> MtResult<Vec<String>> {
        let mut attempt = 1;
        loop {
            self.limiter.wait().await;

            match self.translator.translate_batch(texts, target_lang).await {
                Ok(translated) => return Ok(translated),
                Err(err) if err.is_retryable() && attempt < self.config.max_attempts => {
                    warn!(
                        "Rate limited (attempt {}/{}), waiting {:?}",
                        attempt, self.config.max_attempts, self.config.retry_backoff
                    );
                    self.stats.retries += 1;
                    tokio::time::sleep(self.config.retry_backoff).await;
                    attempt += 1;
                }
                Err(err) if err.is_retryable() => {
                    return Err(MtError::TranslationError(format!(
                        "Still rate limited after {} attempts: {}",
                        attempt, err
                    )));
                }
                Err(err) => return Err(err),
            }
        }
    }
}
