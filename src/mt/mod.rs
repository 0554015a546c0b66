//! Machine Translation Module
//!
//! Everything that touches the translation backend lives here: the provider
//! trait, the DeepL client, a mock for offline runs and tests, and the
//! content protector that keeps placeholders and proper nouns out of the
//! backend's reach.
//!
//! # Example
//!
//! ```ignore
//! use banana_i18n_catalog::mt::{DeepLProvider, MachineTranslator, TokenGenerator, protect, restore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tokens = TokenGenerator::new();
//!     let (protected, map) = protect("Welcome back, {name}", &[], &mut tokens);
//!
//!     let provider = DeepLProvider::from_env()?;
//!     let translated = provider.translate(&protected, "FR").await?;
//!
//!     println!("{}", restore(&translated, &map).text);
//!     Ok(())
//! }
//! ```
pub mod deepl;
pub mod error;
pub mod mock;
pub mod protect;
pub mod translator;

pub use deepl::DeepLProvider;
pub use error::{MtError, MtResult};
pub use mock::{MockMode, MockTranslator};
pub use protect::{
    ProtectedSpan, ProtectedToken, ProtectionMap, RestoreOutcome, TokenGenerator,
    find_leaked_tokens, is_pure_placeholder, protect, restore,
};
pub use translator::{MachineTranslator, validate_language_code};
