//! Error types and result handling for Shirabe operations.
//!
//! Every public operation returns a [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`.
//!
//! # Error Categories
//!
//! - **Validation**: bad sort codes, content ratings, result caps, or filter
//!   names that the catalog does not know. These are raised before any page
//!   request is sent.
//! - **Rate Limiting**: the service kept answering `429` after every retry.
//! - **Transport**: non-success HTTP statuses, connection failures, and bodies
//!   that are not valid JSON.
//! - **Payload**: a record missing the fields needed to identify it.
//! - **Interruption**: cancellation, or a failure after some pages were
//!   already retrieved (see [`Error::Incomplete`]).
//!
//! # Examples
//!
//! ```rust,no_run
//! use shirabe::prelude::*;
//! use shirabe::error::{Error, Result};
//!
//! # async fn example() -> Result<()> {
//! let search = Search::new()?;
//!
//! match search.manga("Naruto").await {
//!     Ok(results) => println!("Found {} results", results.len()),
//!     Err(Error::Incomplete { partial, source }) => {
//!         println!("Kept {} results before failing: {}", partial.len(), source)
//!     }
//!     Err(e) => println!("Search failed: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

use crate::types::{EntityKind, NormalizedResult};

/// Type alias for Results with Shirabe errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all Shirabe operations.
///
/// The validation variants ([`InvalidSortCode`](Error::InvalidSortCode),
/// [`InvalidContentRating`](Error::InvalidContentRating),
/// [`InvalidResultCap`](Error::InvalidResultCap),
/// [`UnknownTag`](Error::UnknownTag),
/// [`UnknownDemographic`](Error::UnknownDemographic),
/// [`UnknownAuthor`](Error::UnknownAuthor)) are always detected before the
/// first page request.
#[derive(Error, Debug)]
pub enum Error {
    /// The sort code is not one of the thirteen recognized values.
    #[error("Invalid sort code {0}, expected 1-13")]
    InvalidSortCode(u8),

    /// The content rating is not `safe`, `suggestive`, `erotica` or `all`.
    #[error("Invalid content rating: {0}")]
    InvalidContentRating(String),

    /// The result cap must be a positive integer.
    #[error("Invalid result cap {0}, expected a positive integer")]
    InvalidResultCap(usize),

    /// A tag name that is not present in the catalog vocabulary.
    #[error("Unknown tag: {0}")]
    UnknownTag(String),

    /// A demographic label that is not present in the catalog vocabulary.
    #[error("Unknown demographic: {0}")]
    UnknownDemographic(String),

    /// An author filter that matched no author in the catalog.
    #[error("Unknown author: {0}")]
    UnknownAuthor(String),

    /// A single `429 Too Many Requests` response.
    ///
    /// This is consumed by [`RetryPolicy`](crate::net::retry::RetryPolicy) and
    /// only escapes to callers who use a [`Transport`](crate::net::Transport)
    /// directly.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// The service was still rate limiting after the retry budget ran out.
    ///
    /// # Fields
    ///
    /// * `attempts` - Number of requests sent for the failing page
    /// * `retry_after` - The last `Retry-After` value reported, if any
    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded {
        attempts: u32,
        retry_after: Option<u64>,
    },

    /// A non-success HTTP response other than `429`.
    #[error("Request failed with HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// The service answered with `"result": "error"`.
    #[error("API error [{status}] {title}: {detail} (id: {id})")]
    Api {
        status: String,
        title: String,
        detail: String,
        id: String,
    },

    /// A record lacks a field needed to identify it (id, title or name).
    #[error("Malformed {kind} payload: missing {field}")]
    MalformedPayload {
        kind: EntityKind,
        field: &'static str,
    },

    /// The caller cancelled the search before it finished.
    #[error("Search cancelled")]
    Cancelled,

    /// Some pages were retrieved and normalized before `source` occurred.
    ///
    /// `partial` holds every result collected up to the failure, in service
    /// order, so the caller can decide whether to use it.
    #[error("Search interrupted after {} results: {source}", partial.len())]
    Incomplete {
        partial: Vec<NormalizedResult>,
        #[source]
        source: Box<Error>,
    },

    /// Network-related errors from the HTTP client.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON deserialization errors, including response bodies that are not JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system errors while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a configuration error with the given message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shirabe::Error;
    ///
    /// let error = Error::config("page_size must be between 1 and 100");
    /// assert!(error.to_string().contains("page_size"));
    /// ```
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Creates a malformed payload error for the given entity kind and field.
    pub fn malformed(kind: EntityKind, field: &'static str) -> Self {
        Error::MalformedPayload { kind, field }
    }

    /// Wraps `source` together with the results collected before it.
    ///
    /// With no partial results the bare error is returned unchanged, so a
    /// failure on the very first page looks the same as any other failure.
    pub fn incomplete(partial: Vec<NormalizedResult>, source: Error) -> Self {
        if partial.is_empty() {
            source
        } else {
            Error::Incomplete {
                partial,
                source: Box::new(source),
            }
        }
    }

    /// Returns `true` for errors raised while validating a request.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidSortCode(_)
                | Error::InvalidContentRating(_)
                | Error::InvalidResultCap(_)
                | Error::UnknownTag(_)
                | Error::UnknownDemographic(_)
                | Error::UnknownAuthor(_)
        )
    }

    /// Returns the results retrieved before the failure, if any.
    pub fn partial_results(&self) -> &[NormalizedResult] {
        match self {
            Error::Incomplete { partial, .. } => partial,
            _ => &[],
        }
    }
}
