//! DeepL API provider for machine translation
//!
//! This module integrates with the DeepL v2 `/translate` endpoint.
//!
//! # Authentication
//!
//! The key is sent as `Authorization: DeepL-Auth-Key <key>`. Keys ending in
//! `:fx` belong to the free plan and are routed to `api-free.deepl.com`.
//! `DeepLProvider::from_env` reads the key from `DEEPL_API_KEY`.
//!
//! # Wire format
//!
//! Request: `{"text": [..], "target_lang": "FR"}`.
//! Response: `{"translations": [{"text": ".."}, ..]}`, positionally aligned
//! with the request array.

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{MachineTranslator, validate_language_code};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const FREE_API_URL: &str = "https://api-free.deepl.com/v2/translate";
const PRO_API_URL: &str = "https://api.deepl.com/v2/translate";
const USER_AGENT: &str = concat!("banana-i18n-catalog/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a [String],
    target_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

/// DeepL API v2 provider
#[derive(Clone)]
pub struct DeepLProvider {
    /// API key for authentication
    api_key: String,
    /// HTTP client for async requests
    client: reqwest::Client,
    /// Translate endpoint, picked from the key type
    base_url: String,
}

impl DeepLProvider {
    /// Create a new DeepLProvider with an explicit API key
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New provider instance
    /// * `Err(MtError)` - If API key is empty or HTTP client creation fails
    pub fn new(api_key: String) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::ConfigError("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = Self::endpoint_for_key(&api_key).to_string();

        Ok(Self {
            api_key,
            client,
            base_url,
        })
    }

    /// Create a DeepLProvider from the `DEEPL_API_KEY` environment variable
    pub fn from_env() -> MtResult<Self> {
        let api_key = std::env::var("DEEPL_API_KEY").map_err(|_| {
            MtError::ConfigError("DEEPL_API_KEY environment variable not set".to_string())
        })?;

        Self::new(api_key)
    }

    /// Point the provider at a different endpoint (proxies, staging)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Free-plan keys carry a `:fx` suffix and must use the free endpoint
    fn endpoint_for_key(api_key: &str) -> &'static str {
        if api_key.ends_with(":fx") {
            FREE_API_URL
        } else {
            PRO_API_URL
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Map a non-success HTTP status onto the error taxonomy
    fn classify_status(status: StatusCode, body: String) -> MtError {
        match status {
            StatusCode::FORBIDDEN => MtError::AuthError(format!(
                "API key rejected (403), check that the key is correct: {}",
                body
            )),
            StatusCode::TOO_MANY_REQUESTS => MtError::RateLimited(body),
            _ => MtError::ApiError {
                status: status.as_u16(),
                body,
            },
        }
    }

    /// Decode a 200 response body and check it lines up with the request
    fn parse_response(body: &str, expected: usize) -> MtResult<Vec<String>> {
        let response: TranslateResponse = serde_json::from_str(body).map_err(|e| {
            MtError::TranslationError(format!("Failed to parse API response: {}", e))
        })?;

        if response.translations.is_empty() {
            return Err(MtError::TranslationError(
                "API returned no translations".to_string(),
            ));
        }

        if response.translations.len() != expected {
            return Err(MtError::TranslationError(format!(
                "API returned {} translations for {} texts",
                response.translations.len(),
                expected
            )));
        }

        Ok(response.translations.into_iter().map(|t| t.text).collect())
    }
}

impl std::fmt::Debug for DeepLProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepLProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for DeepLProvider {
    async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> MtResult<Vec<String>> {
        validate_language_code(target_lang)?;

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = TranslateRequest {
            text: texts,
            target_lang,
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status != StatusCode::OK {
            return Err(Self::classify_status(status, text));
        }

        Self::parse_response(&text, texts.len())
    }

    fn provider_name(&self) -> &str {
        "DeepL"
    }
}
