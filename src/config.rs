//! Client configuration.
//!
//! [`SearchConfig`] collects every tunable used by the transport, the
//! pagination driver, and the vocabulary cache. All fields have defaults, so a
//! configuration file only needs to list what it changes:
//!
//! ```rust
//! use shirabe::config::SearchConfig;
//!
//! let config = SearchConfig::from_toml_str(r#"
//!     page_size = 50
//!     max_retries = 5
//! "#).unwrap();
//!
//! assert_eq!(config.page_size, 50);
//! assert_eq!(config.api_base, "https://api.mangadex.org");
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::net::retry::RetryPolicy;

/// Largest page the catalog serves in one response.
pub const MAX_PAGE_SIZE: usize = 100;

/// Environment variable holding a static API bearer token.
pub const API_TOKEN_ENV: &str = "MANGADEX_API_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Root of the REST API, without a trailing slash.
    pub api_base: String,

    /// Root for cover image URLs.
    pub cover_base: String,

    pub user_agent: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Minimum spacing between two requests, in milliseconds.
    pub rate_limit_ms: u64,

    /// Records requested per page, at most [`MAX_PAGE_SIZE`].
    pub page_size: usize,

    /// Retries after a `429` before giving up on a page.
    pub max_retries: u32,

    /// First backoff delay in milliseconds; doubles on every retry.
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff delay, in milliseconds.
    pub backoff_max_ms: u64,

    /// Age after which a vocabulary miss triggers a refresh, in seconds.
    pub vocabulary_refresh_secs: u64,

    /// Static bearer token sent with every request.
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.mangadex.org".to_string(),
            cover_base: "https://uploads.mangadex.org/covers".to_string(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            rate_limit_ms: 200,
            page_size: MAX_PAGE_SIZE,
            max_retries: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 30_000,
            vocabulary_refresh_secs: 900,
            api_token: std::env::var(API_TOKEN_ENV).ok().filter(|t| !t.is_empty()),
        }
    }
}

impl SearchConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SearchConfig =
            toml::from_str(text).map_err(|e| Error::config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks that base URLs parse and the page size is within the service limit.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("api_base", &self.api_base), ("cover_base", &self.cover_base)] {
            url::Url::parse(value)
                .map_err(|e| Error::config(format!("{} is not a valid URL: {}", name, e)))?;
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::config(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn vocabulary_refresh(&self) -> Duration {
        Duration::from_secs(self.vocabulary_refresh_secs)
    }

    /// The rate-limit retry policy described by this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
            .with_base_delay(Duration::from_millis(self.backoff_base_ms))
            .with_max_delay(Duration::from_millis(self.backoff_max_ms))
    }
}
