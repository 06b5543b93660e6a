//! # Shirabe - Typed, paginated search for the MangaDex catalog
//!
//! Shirabe is an async client library for searching the MangaDex catalog. It
//! turns typed search requests into catalog queries, walks the paginated
//! results, and flattens each record into a small, uniform result type.
//!
//! ## Features
//!
//! - **Catalog Entities**: Search manga, scanlation groups, and authors, and
//!   list a manga's chapters
//! - **Typed Requests**: Content ratings, sort codes, and result caps are
//!   validated before anything is sent
//! - **Name Resolution**: Tag and demographic names resolve to identifiers
//!   through a shared, lazily loaded [`Vocabulary`](vocabulary::Vocabulary)
//! - **Pagination**: Offset-based page walking that never overshoots the cap
//! - **Rate Limiting**: Request pacing plus bounded exponential backoff on `429`
//! - **Partial Results**: A failing page keeps what earlier pages returned
//! - **Cancellation**: Searches stop when a token fires, during name
//!   resolution or between pages
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shirabe::prelude::*;
//! use shirabe::error::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let search = Search::new()?;
//!
//!     for manga in search.manga("Naruto").await? {
//!         println!("{} ({})", manga.title, manga.id);
//!         if let Some(cover) = manga.cover_url() {
//!             println!("  cover: {}", cover);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Filtered Searches
//!
//! ```rust,no_run
//! # use shirabe::prelude::*;
//! # use shirabe::error::Result;
//! # async fn example() -> Result<()> {
//! # let search = Search::new()?;
//! let request = SearchRequestBuilder::default()
//!     .content_rating("safe")
//!     .tags(vec!["Action".to_string(), "Adventure".to_string()])
//!     .demographic("shounen")
//!     .sort_by(6u8)
//!     .max_results(50usize)
//!     .build()
//!     .map_err(|e| Error::config(e.to_string()))?;
//!
//! match search.advanced_search(request).await {
//!     Ok(results) => println!("{} results", results.len()),
//!     Err(error) => {
//!         // Results gathered before a failing page are still available
//!         println!("{} partial results: {}", error.partial_results().len(), error);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`search`]: The [`Search`](search::Search) facade and fluent builder
//! - [`query`]: Request validation and query parameter rendering
//! - [`vocabulary`]: Tag and demographic name resolution
//! - [`paginate`]: Offset-based page retrieval
//! - [`normalize`]: Flattening raw records into results
//! - [`net`]: Transport trait, HTTP client, pacing, and retry
//! - [`config`]: Client configuration and TOML loading
//! - [`types`]: Requests, results, and closed value sets
//! - [`error`]: Error handling

pub mod config;
pub mod error;
pub mod net;
pub mod normalize;
pub mod paginate;
pub mod query;
pub mod search;
pub mod types;
pub mod vocabulary;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use shirabe::prelude::*;
///
/// // Now you have access to:
/// // - Search, AdvancedSearch
/// // - SearchRequest, SearchRequestBuilder, NormalizedResult, Details
/// // - EntityKind, ContentRating, SearchConfig, Vocabulary
/// // - Error, Result, CancellationToken
/// ```
pub mod prelude {
    pub use crate::{
        config::SearchConfig,
        error::{Error, Result},
        search::{AdvancedSearch, Search},
        types::{
            ContentRating, Details, EntityKind, NormalizedResult, SearchRequest,
            SearchRequestBuilder,
        },
        vocabulary::Vocabulary,
    };
    pub use tokio_util::sync::CancellationToken;
}

// Re-export main types at crate root for direct access
pub use config::SearchConfig;
pub use error::{Error, Result};
pub use search::{AdvancedSearch, Search};
pub use types::{EntityKind, NormalizedResult, SearchRequest};
