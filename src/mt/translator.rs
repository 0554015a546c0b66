//! Machine Translation trait and utilities
//!
//! This module defines the `MachineTranslator` trait for provider abstraction,
//! so the batch translator can talk to DeepL in production and to a mock in
//! tests without knowing which one it has.
//!
//! # Example
//!
//! ```ignore
//! use banana_i18n_catalog::mt::{DeepLProvider, MachineTranslator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = DeepLProvider::from_env()?;
//!
//!     let texts = vec!["Hello".to_string(), "Goodbye".to_string()];
//!     let results = provider.translate_batch(&texts, "FR").await?;
//!     println!("{:?}", results);
//!
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use async_trait::async_trait;

/// Generic trait for machine translation providers
///
/// Implementations perform exactly one backend request per call to
/// `translate_batch`. Retrying, rate limiting and chunking are the caller's
/// business (see `crate::batch`).
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate multiple strings in a single request
    ///
    /// # Arguments
    ///
    /// * `texts` - Strings to translate, already content-protected
    /// * `target_lang` - Resolved backend language code (e.g., "FR", "PT-BR")
    ///
    /// # Guarantees
    ///
    /// - Output order matches input order
    /// - Output length equals input length, otherwise an error is returned
    async fn translate_batch(&self, texts: &[String], target_lang: &str)
    -> MtResult<Vec<String>>;

    /// Translate a single text string
    async fn translate(&self, text: &str, target_lang: &str) -> MtResult<String> {
        let results = self
            .translate_batch(&[text.to_string()], target_lang)
            .await?;
        results.into_iter().next().ok_or_else(|| {
            MtError::TranslationError("Backend returned no translation".to_string())
        })
    }

    /// Name of this provider, used in logs
    fn provider_name(&self) -> &str;
}

/// Validate that a language code is in acceptable format
///
/// Accepts ASCII letters with an optional hyphenated variant, e.g. `FR`,
/// `PT-BR`, `zh-cn`.
pub fn validate_language_code(code: &str) -> MtResult<()> {
    if code.is_empty() {
        return Err(MtError::ConfigError("Language code is empty".to_string()));
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(MtError::ConfigError(format!(
            "Invalid characters in language code: {}",
            code
        )));
    }

    Ok(())
}
