//! Mock Machine Translator for testing
//!
//! A deterministic, API-free translator for exercising the catalog pipeline
//! without an API key or network access. Clones share their request log and
//! failure queue, so a test can keep one handle and give another to the
//! batch translator.
//!
//! # Example
//!
//! ```ignore
//! use banana_i18n_catalog::mt::{MachineTranslator, MockMode, MockTranslator};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock.translate("hello", "FR").await.unwrap();
//!     assert_eq!(result, "hello_FR");
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::MachineTranslator;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append language suffix: "hello" → "hello_FR"
    /// Tokens pass through untouched
    Suffix,

    /// Use predefined mappings: (text, target_lang) → translation
    /// Unknown pairs fall back to `Suffix`
    Mappings(HashMap<(String, String), String>),

    /// Reverse the order of whitespace-separated words
    /// (word-order-changing languages)
    Reorder,

    /// Every request fails with a translation error
    Error(String),

    /// Return input unchanged
    NoOp,
}

/// Mock translator that simulates various backend behaviours
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    /// Errors handed out, one per request, before `mode` takes over
    failures: Arc<Mutex<VecDeque<MtError>>>,
    /// Every batch received, in call order (failed calls included)
    requests: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay_ms: 0,
            failures: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a MockTranslator with simulated network delay
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::new(mode)
        }
    }

    /// Queue errors to return before normal behaviour resumes
    ///
    /// ```ignore
    /// let mock = MockTranslator::new(MockMode::Suffix)
    ///     .with_failures(vec![MtError::RateLimited("429".into())]);
    /// // first request → RateLimited, second request → translated
    /// ```
    pub fn with_failures(self, failures: Vec<MtError>) -> Self {
        if let Ok(mut queue) = self.failures.lock() {
            queue.extend(failures);
        }
        self
    }

    /// Number of requests received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Copy of every batch received so far
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn apply_translation(&self, text: &str, target: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::Reorder => {
                let words: Vec<&str> = text.split_whitespace().rev().collect();
                Ok(words.join(" "))
            }
            MockMode::Error(msg) => Err(MtError::TranslationError(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }

    fn next_failure(&self) -> Option<MtError> {
        self.failures.lock().ok().and_then(|mut q| q.pop_front())
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> MtResult<Vec<String>> {
        self.apply_delay().await;

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(texts.to_vec());
        }

        if let Some(err) = self.next_failure() {
            return Err(err);
        }

        texts
            .iter()
            .map(|text| self.apply_translation(text, target_lang))
            .collect()
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
