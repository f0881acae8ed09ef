use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    services::providers::SafetyThreshold,
};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Gemini API key; checked when the pipeline is built
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Gemini REST API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Model identifiers tried in order, primary first
    #[serde(default = "default_gemini_models")]
    pub gemini_models: Vec<String>,

    /// Safety threshold sent for every harm category
    #[serde(default)]
    pub gemini_safety_threshold: SafetyThreshold,

    /// Per-call timeout for model generation, in seconds
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,

    /// Google Books API base URL
    #[serde(default = "default_google_books_api_url")]
    pub google_books_api_url: String,

    /// Open Library covers base URL
    #[serde(default = "default_open_library_covers_url")]
    pub open_library_covers_url: String,

    /// Placeholder image service base URL
    #[serde(default = "default_placeholder_image_url")]
    pub placeholder_image_url: String,

    /// Recommendation cache TTL, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached recommendation results
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Cover lookups in flight per request (1 = sequential)
    #[serde(default = "default_cover_concurrency")]
    pub cover_concurrency: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_models() -> Vec<String> {
    vec![
        "gemini-2.0-flash-exp".to_string(),
        "gemini-1.5-flash".to_string(),
    ]
}

fn default_model_timeout_secs() -> u64 {
    60
}

fn default_google_books_api_url() -> String {
    "https://www.googleapis.com/books/v1".to_string()
}

fn default_open_library_covers_url() -> String {
    "https://covers.openlibrary.org".to_string()
}

fn default_placeholder_image_url() -> String {
    "https://via.placeholder.com".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_cache_capacity() -> usize {
    100
}

fn default_cover_concurrency() -> usize {
    1
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Returns the Gemini API key or a configuration error if it is missing
    pub fn require_api_key(&self) -> AppResult<&str> {
        match self.gemini_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(AppError::Configuration(
                "GEMINI_API_KEY must be set".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        envy::from_iter::<_, Config>(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_apply() {
        let config = from_pairs(&[]);
        assert_eq!(config.gemini_models.len(), 2);
        assert_eq!(config.gemini_models[0], "gemini-2.0-flash-exp");
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.cover_concurrency, 1);
        assert_eq!(config.port, 3000);
        assert_eq!(config.gemini_safety_threshold, SafetyThreshold::BlockOnlyHigh);
    }

    #[test]
    fn test_safety_threshold_from_env() {
        let config = from_pairs(&[("GEMINI_SAFETY_THRESHOLD", "BLOCK_NONE")]);
        assert_eq!(config.gemini_safety_threshold, SafetyThreshold::BlockNone);
    }

    #[test]
    fn test_model_list_parses_comma_separated() {
        let config = from_pairs(&[("GEMINI_MODELS", "model-a,model-b,model-c")]);
        assert_eq!(config.gemini_models, vec!["model-a", "model-b", "model-c"]);
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let config = from_pairs(&[("GEMINI_API_KEY", "   ")]);
        assert!(matches!(
            config.require_api_key(),
            Err(AppError::Configuration(_))
        ));

        let config = from_pairs(&[("GEMINI_API_KEY", "secret")]);
        assert_eq!(config.require_api_key().unwrap(), "secret");
    }
}
