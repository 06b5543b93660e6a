//! Network utilities for catalog requests.
//!
//! This module provides the transport infrastructure for Shirabe:
//!
//! - **Transport**: the [`Transport`] trait every component talks to, so tests
//!   and embedding applications can substitute their own HTTP stack
//! - **HTTP Client**: [`HttpClient`], the reqwest-backed transport
//! - **Request Pacing**: [`RateLimiter`] spaces requests to stay under the
//!   service's limits
//! - **Retry Logic**: [`retry::RetryPolicy`] retries rate-limited requests with
//!   exponential backoff
//! - **Query Strings**: [`params::QueryParams`] keeps parameters in a stable order
//!
//! # Examples
//!
//! ```rust,no_run
//! use shirabe::net::{HttpClient, Transport, params::QueryParams};
//!
//! # async fn example() -> shirabe::Result<()> {
//! let client = HttpClient::new()
//!     .with_rate_limit(500)  // 500ms between requests
//!     .with_header("Referer", "https://mangadex.org");
//!
//! let params = QueryParams::new().with("name", "Oda").with("limit", 1);
//! let body = client.get_json("/author", &params).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use reqwest::{
    Client, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use params::QueryParams;

pub mod json;
pub mod params;
pub mod retry;

/// Shared HTTP client used by [`HttpClient::new`].
///
/// This client is configured with:
/// - 30-second timeout
/// - Connection pooling (10 idle connections per host)
/// - Compression support (gzip, brotli)
/// - The crate name and version as User-Agent
///
/// The client is created lazily on first use and reused across all default clients.
static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .gzip(true)
        .brotli(true)
        .build()
        .expect("Failed to build HTTP client")
});

/// Issues GET requests against the catalog API and returns decoded JSON bodies.
///
/// Implementations perform exactly one request per call. They report a `429`
/// response as [`Error::RateLimited`] and leave retrying to
/// [`retry::RetryPolicy`].
///
/// # Errors
///
/// * [`Error::RateLimited`] - The service answered `429`
/// * [`Error::RequestFailed`] - Any other non-success status
/// * [`Error::Api`] - A success status whose body reports `"result": "error"`
/// * [`Error::Network`] / [`Error::Json`] - Connection failures and bodies that
///   are not JSON
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `endpoint` (relative to the API base) with the given parameters.
    async fn get_json(&self, endpoint: &str, params: &QueryParams) -> Result<Value>;
}

/// Request pacer that keeps a minimum delay between consecutive requests.
///
/// Each caller reserves the next free slot under a lock and then sleeps until
/// that slot, so concurrent searches sharing one client are spaced out as well.
///
/// # Thread Safety
///
/// The rate limiter uses a `Mutex` internally and is safe to use across multiple
/// threads and async tasks.
#[derive(Debug)]
pub struct RateLimiter {
    next_slot: Mutex<Option<Instant>>,
    delay: Duration,
}

impl RateLimiter {
    /// Creates a new rate limiter with the specified delay.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shirabe::net::RateLimiter;
    ///
    /// // At most five requests per second
    /// let limiter = RateLimiter::new(200);
    /// ```
    pub fn new(delay_ms: u64) -> Self {
        Self {
            next_slot: Mutex::new(None),
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Waits until the next request slot is free.
    pub async fn wait(&self) {
        let slot = {
            let mut next = self.next_slot.lock();
            let now = Instant::now();
            let slot = match *next {
                Some(free_at) if free_at > now => free_at,
                _ => now,
            };
            *next = Some(slot + self.delay);
            slot
        };

        if slot > Instant::now() {
            tokio::time::sleep_until(tokio::time::Instant::from_std(slot)).await;
        }
    }
}

/// reqwest-backed [`Transport`] with request pacing and static credentials.
///
/// Clones share the same connection pool and rate limiter.
///
/// # Examples
///
/// ```rust,no_run
/// use shirabe::config::SearchConfig;
/// use shirabe::net::HttpClient;
///
/// # fn example() -> shirabe::Result<()> {
/// let config = SearchConfig {
///     api_token: Some("secret".to_string()),
///     ..Default::default()
/// };
/// let client = HttpClient::from_config(&config)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    api_base: String,
    rate_limiter: Arc<RateLimiter>,
    headers: HeaderMap,
}

impl HttpClient {
    /// Creates a client for the public MangaDex API with default settings.
    ///
    /// The client is initialized with:
    /// - `https://api.mangadex.org` as API base
    /// - 200ms between requests
    pub fn new() -> Self {
        Self {
            client: CLIENT.clone(),
            api_base: SearchConfig::default().api_base,
            rate_limiter: Arc::new(RateLimiter::new(200)),
            headers: HeaderMap::new(),
        }
    }

    /// Builds a client with its own connection pool from a configuration.
    ///
    /// # Errors
    ///
    /// * [`Error::Config`] - If the configuration does not validate, or the API
    ///   token cannot be sent as a header
    /// * [`Error::Network`] - If the underlying HTTP client cannot be built
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .pool_max_idle_per_host(10)
            .gzip(true)
            .brotli(true)
            .build()?;

        let mut http = Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit_ms)),
            headers: HeaderMap::new(),
        };

        if let Some(token) = &config.api_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| Error::config("api_token is not valid header text"))?;
            http.headers.insert(AUTHORIZATION, value);
        }

        Ok(http)
    }

    /// Sets the minimum delay between requests.
    pub fn with_rate_limit(mut self, delay_ms: u64) -> Self {
        self.rate_limiter = Arc::new(RateLimiter::new(delay_ms));
        self
    }

    /// Adds a custom header to all requests made by this client.
    ///
    /// Names or values that are not valid header text are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<reqwest::header::HeaderName>(),
            value.parse::<HeaderValue>(),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// The API base every endpoint is resolved against.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url_for(&self, endpoint: &str, params: &QueryParams) -> String {
        if params.is_empty() {
            format!("{}{}", self.api_base, endpoint)
        } else {
            format!("{}{}?{}", self.api_base, endpoint, params.to_query_string())
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get_json(&self, endpoint: &str, params: &QueryParams) -> Result<Value> {
        let url = self.url_for(endpoint, params);

        self.rate_limiter.wait().await;
        tracing::debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());

            return Err(Error::RateLimited { retry_after });
        }

        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(Error::RequestFailed {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let body: Value = serde_json::from_slice(&bytes)?;
        json::check_api_error(&body)?;
        Ok(body)
    }
}
