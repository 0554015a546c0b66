//! Machine translation for JSON message catalogs
//!
//! Translates nested JSON catalogs (`messages/en/*.json` → `messages/it/*.json`)
//! through DeepL while keeping `{placeholders}` and configured proper nouns
//! verbatim, and avoids re-translating anything it has seen before through a
//! two-level cache (process memory plus one cache file per target catalog).
//!
//! # Workflow Example
//!
//! ```ignore
//! use banana_i18n_catalog::{BatchTranslator, Orchestrator, SessionConfig};
//! use banana_i18n_catalog::mt::DeepLProvider;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = DeepLProvider::from_env()?;
//!     let nouns = vec!["Acme".to_string()];
//!     let batch = BatchTranslator::new(Box::new(provider), nouns, SessionConfig::default());
//!
//!     let mut orchestrator = Orchestrator::new(batch);
//!     orchestrator
//!         .process_directory(Path::new("messages/en"), Path::new("messages/it"), "IT")
//!         .await?;
//!
//!     println!("{:?}", orchestrator.stats());
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod cache;
pub mod config;
pub mod language;
pub mod mt;
pub mod orchestrator;
pub mod report;
pub mod walker;


pub use batch::{BatchTranslator, RateLimiter, SessionStats};
pub use cache::{CacheEntry, CacheStore, FileCache, MemoryCache, is_expired};
pub use config::{ProperNounsConfig, SessionConfig, load_proper_nouns};
pub use language::{infer_language_from_dir, resolve_language_code};
pub use orchestrator::{DirectorySummary, Orchestrator, to_catalog_json};
pub use report::{MissingReport, check_missing_translations, missing_keys};
pub use walker::{collect, rewrite};
