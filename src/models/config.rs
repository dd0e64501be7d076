//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Recommendation/ratings backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Library catalogue API settings
    #[serde(default)]
    pub catalogue: CatalogueConfig,

    /// Cover image and book metadata services
    #[serde(default)]
    pub covers: CoversConfig,

    /// HTTP client behavior settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Catalogue rate limiter settings
    #[serde(default)]
    pub limiter: LimiterConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(AppError::validation("backend.base_url is empty"));
        }
        if self.catalogue.base_url.trim().is_empty() {
            return Err(AppError::validation("catalogue.base_url is empty"));
        }
        if self.catalogue.search_limit == 0 {
            return Err(AppError::validation("catalogue.search_limit must be > 0"));
        }
        if self.covers.image_host.trim().is_empty() {
            return Err(AppError::validation("covers.image_host is empty"));
        }
        if self.covers.metadata_api.trim().is_empty() {
            return Err(AppError::validation("covers.metadata_api is empty"));
        }
        if self.client.user_agent.trim().is_empty() {
            return Err(AppError::validation("client.user_agent is empty"));
        }
        if self.client.timeout_secs == 0 {
            return Err(AppError::validation("client.timeout_secs must be > 0"));
        }
        if self.limiter.reservoir == 0 {
            return Err(AppError::validation("limiter.reservoir must be > 0"));
        }
        if self.limiter.refill_interval_secs == 0 {
            return Err(AppError::validation(
                "limiter.refill_interval_secs must be > 0",
            ));
        }
        Ok(())
    }
}

/// Recommendation/ratings backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the REST backend
    #[serde(default = "defaults::backend_base_url")]
    pub base_url: String,

    /// Similar books requested per seed book
    #[serde(default = "defaults::limit_per_book")]
    pub limit_per_book: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::backend_base_url(),
            limit_per_book: defaults::limit_per_book(),
        }
    }
}

/// Library catalogue API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueConfig {
    /// Base URL of the catalogue API
    #[serde(default = "defaults::catalogue_base_url")]
    pub base_url: String,

    /// Client application code header value
    #[serde(default)]
    pub app_code: String,

    /// API key header value
    #[serde(default)]
    pub api_key: String,

    /// Maximum candidate titles requested per search
    #[serde(default = "defaults::search_limit")]
    pub search_limit: u32,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::catalogue_base_url(),
            app_code: String::new(),
            api_key: String::new(),
            search_limit: defaults::search_limit(),
        }
    }
}

/// Cover image and book metadata service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoversConfig {
    /// Deterministic cover image host (probed by ISBN)
    #[serde(default = "defaults::image_host")]
    pub image_host: String,

    /// Fallback metadata API base (thumbnail and description lookup)
    #[serde(default = "defaults::metadata_api")]
    pub metadata_api: String,
}

impl Default for CoversConfig {
    fn default() -> Self {
        Self {
            image_host: defaults::image_host(),
            metadata_api: defaults::metadata_api(),
        }
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Catalogue rate limiter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Minimum delay between call starts in milliseconds
    #[serde(default = "defaults::min_interval_ms")]
    pub min_interval_ms: u64,

    /// Token reservoir capacity per refill window
    #[serde(default = "defaults::reservoir")]
    pub reservoir: u32,

    /// Reservoir refill interval in seconds
    #[serde(default = "defaults::refill_interval")]
    pub refill_interval_secs: u64,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: defaults::min_interval_ms(),
            reservoir: defaults::reservoir(),
            refill_interval_secs: defaults::refill_interval(),
        }
    }
}

mod defaults {
    // Backend defaults
    pub fn backend_base_url() -> String {
        "https://api.betterread.example/prod".into()
    }
    pub fn limit_per_book() -> u32 {
        5
    }

    // Catalogue defaults
    pub fn catalogue_base_url() -> String {
        "https://openweb.nlb.gov.sg/api/v2/Catalogue".into()
    }
    pub fn search_limit() -> u32 {
        100
    }

    // Cover defaults
    pub fn image_host() -> String {
        "https://covers.openlibrary.org".into()
    }
    pub fn metadata_api() -> String {
        "https://www.googleapis.com".into()
    }

    // Client defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; betterread/1.0)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Limiter defaults
    pub fn min_interval_ms() -> u64 {
        3000
    }
    pub fn reservoir() -> u32 {
        15
    }
    pub fn refill_interval() -> u64 {
        60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.client.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_reservoir() {
        let mut config = Config::default();
        config.limiter.reservoir = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_limiter_matches_catalogue_terms() {
        let config = Config::default();
        assert_eq!(config.limiter.min_interval_ms, 3000);
        assert_eq!(config.limiter.reservoir, 15);
        assert_eq!(config.limiter.refill_interval_secs, 60);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [catalogue]
            app_code = "DEV-Test"
            api_key = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.catalogue.app_code, "DEV-Test");
        assert_eq!(config.catalogue.search_limit, 100);
        assert!(config.covers.image_host.contains("openlibrary"));
    }
}
