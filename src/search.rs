//! The search facade and its fluent builder.
//!
//! [`Search`] is the entry point for callers. Every operation follows the same
//! fixed pipeline:
//!
//! 1. validate the request and resolve names ([`QueryBuilder`])
//! 2. fetch pages in offset order ([`Paginator`])
//! 3. flatten each record ([`normalize_page`])
//!
//! Results keep the service's own ordering; nothing is re-sorted locally.
//!
//! # Examples
//!
//! ```rust,no_run
//! use shirabe::prelude::*;
//! # use shirabe::error::Result;
//!
//! # async fn example() -> Result<()> {
//! let search = Search::new()?;
//!
//! // Simple searches
//! let manga = search.manga("Naruto").await?;
//! let groups = search.group_search("MangaPlus").await?;
//! let chapters = search.chapters(&manga[0].id, 40).await?;
//!
//! // Filtered search
//! let results = search
//!     .advanced()
//!     .tags(["Action", "Adventure"])
//!     .demographic("shounen")
//!     .sort_by(6u8)
//!     .max_results(50)
//!     .execute()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::{MAX_PAGE_SIZE, SearchConfig};
use crate::error::{Error, Result};
use crate::net::{HttpClient, Transport, json, params::QueryParams, retry::RetryPolicy};
use crate::normalize::{NormalizeOptions, normalize_manga, normalize_page};
use crate::paginate::Paginator;
use crate::query::{self, QueryBuilder};
use crate::types::{ContentRating, EntityKind, NormalizedResult, SearchRequest};
use crate::vocabulary::Vocabulary;

/// Endpoint returning one random manga.
pub const RANDOM_ENDPOINT: &str = "/manga/random";

/// Entry point for catalog searches.
///
/// A `Search` is cheap to share: wrap it in an [`Arc`] and call it from as many
/// tasks as needed. Concurrent calls share the vocabulary cache and nothing
/// else.
pub struct Search {
    transport: Arc<dyn Transport>,
    vocabulary: Arc<Vocabulary>,
    page_size: usize,
    retry: RetryPolicy,
    cover_base: String,
}

impl Search {
    /// Creates a search client for the public API with default settings.
    ///
    /// # Errors
    ///
    /// * [`Error::Network`] - If the HTTP client cannot be built
    pub fn new() -> Result<Self> {
        Self::with_config(SearchConfig::default())
    }

    /// Creates a search client from a configuration.
    ///
    /// # Errors
    ///
    /// * [`Error::Config`] - If the configuration does not validate
    /// * [`Error::Network`] - If the HTTP client cannot be built
    pub fn with_config(config: SearchConfig) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpClient::from_config(&config)?);
        Ok(Self::with_transport(transport, &config))
    }

    /// Creates a search client over any [`Transport`].
    pub fn with_transport(transport: Arc<dyn Transport>, config: &SearchConfig) -> Self {
        let retry = config.retry_policy();
        let vocabulary = Vocabulary::new(Arc::clone(&transport))
            .with_retry(retry)
            .with_refresh_after(config.vocabulary_refresh());

        Self {
            transport,
            vocabulary: Arc::new(vocabulary),
            page_size: config.page_size.clamp(1, MAX_PAGE_SIZE),
            retry,
            cover_base: config.cover_base.clone(),
        }
    }

    /// Replaces the vocabulary, e.g. to share one cache between clients.
    pub fn with_vocabulary(mut self, vocabulary: Arc<Vocabulary>) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    /// Searches manga by title.
    ///
    /// Takes a bare title, or a full [`SearchRequest`] for filters and a
    /// different result cap.
    pub async fn manga(&self, request: impl Into<SearchRequest>) -> Result<Vec<NormalizedResult>> {
        self.execute(EntityKind::Manga, &request.into(), CancellationToken::new())
            .await
    }

    /// Searches scanlation groups by name.
    ///
    /// Only the name and result cap of a [`SearchRequest`] apply to groups.
    pub async fn group_search(
        &self,
        request: impl Into<SearchRequest>,
    ) -> Result<Vec<NormalizedResult>> {
        self.execute(EntityKind::Group, &request.into(), CancellationToken::new())
            .await
    }

    /// Searches authors by name.
    ///
    /// Only the name and result cap of a [`SearchRequest`] apply to authors.
    pub async fn author(&self, request: impl Into<SearchRequest>) -> Result<Vec<NormalizedResult>> {
        self.execute(EntityKind::Author, &request.into(), CancellationToken::new())
            .await
    }

    /// Lists up to `cap` chapters of one manga, newest volume and chapter first.
    ///
    /// Chapters of every content rating are listed, each with the name of its
    /// scanlation group when the service reports one.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidResultCap`] - A cap of zero
    /// * [`Error::Incomplete`] - A page failed after earlier pages succeeded
    /// * Transport errors when the first page fails
    pub async fn chapters(&self, manga_id: &str, cap: usize) -> Result<Vec<NormalizedResult>> {
        if cap == 0 {
            return Err(Error::InvalidResultCap(cap));
        }

        let endpoint = format!("/manga/{}/feed", urlencoding::encode(manga_id.trim()));
        let mut params = QueryParams::new();
        for rating in &ContentRating::ALL {
            params.push("contentRating[]", rating.as_str());
        }
        params.push("includes[]", "scanlation_group");
        params.push("order[volume]", "desc");
        params.push("order[chapter]", "desc");

        self.collect(
            EntityKind::Chapter,
            &endpoint,
            params,
            cap,
            CancellationToken::new(),
            false,
        )
        .await
    }

    /// Searches manga with every filter of a [`SearchRequest`].
    ///
    /// # Errors
    ///
    /// * Validation errors, before any page is requested
    /// * [`Error::Incomplete`] - A page failed after earlier pages succeeded
    /// * Transport errors when the first page fails
    pub async fn advanced_search(&self, request: SearchRequest) -> Result<Vec<NormalizedResult>> {
        self.advanced_search_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Like [`advanced_search`](Search::advanced_search), but stops before the
    /// next page once `cancel` fires.
    pub async fn advanced_search_with_cancel(
        &self,
        request: SearchRequest,
        cancel: CancellationToken,
    ) -> Result<Vec<NormalizedResult>> {
        self.execute(EntityKind::Manga, &request, cancel).await
    }

    /// Starts a fluent advanced search.
    pub fn advanced(&self) -> AdvancedSearch<'_> {
        AdvancedSearch::new(self)
    }

    /// Fetches one random manga.
    ///
    /// `content_rating` takes the same values as a search request and defaults
    /// to safe and suggestive.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidContentRating`] - For an unrecognized rating
    /// * [`Error::MalformedPayload`] - If the returned record cannot be identified
    pub async fn random(&self, content_rating: Option<&str>) -> Result<NormalizedResult> {
        let ratings = match content_rating {
            Some(value) => ContentRating::parse_filter(value)?,
            None => ContentRating::DEFAULT.to_vec(),
        };

        let mut params = QueryParams::new();
        for rating in &ratings {
            params.push("contentRating[]", rating.as_str());
        }
        params.push("includes[]", "cover_art");

        let transport = &self.transport;
        let params = &params;
        let body = self
            .retry
            .run(move || transport.get_json(RANDOM_ENDPOINT, params))
            .await?;

        let record = json::extract_path(&body, "data")
            .cloned()
            .ok_or_else(|| Error::malformed(EntityKind::Manga, "data"))?;

        normalize_manga(record, &self.normalize_options(EntityKind::Manga, true))
    }

    async fn execute(
        &self,
        kind: EntityKind,
        request: &SearchRequest,
        cancel: CancellationToken,
    ) -> Result<Vec<NormalizedResult>> {
        query::validate(request)?;

        // Name resolution may hit the network, so it honours the token too.
        let prepare = async {
            let mut params = QueryBuilder::new(&self.vocabulary)
                .build(kind, request)
                .await?;

            if kind == EntityKind::Manga {
                if let Some(author) = &request.author {
                    let author_id = self.resolve_author(author, &cancel).await?;
                    params.push("authorOrArtist", author_id);
                }
            }

            Ok::<_, Error>(params)
        };

        let prepared = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            params = prepare => params,
        };
        let params = prepared?;

        self.collect(
            kind,
            kind.endpoint(),
            params,
            request.max_results,
            cancel,
            request.include_cover_art,
        )
        .await
    }

    /// Pages through `endpoint` and normalizes what arrived.
    async fn collect(
        &self,
        kind: EntityKind,
        endpoint: &str,
        params: QueryParams,
        cap: usize,
        cancel: CancellationToken,
        include_cover_art: bool,
    ) -> Result<Vec<NormalizedResult>> {
        let run = Paginator::new(Arc::clone(&self.transport), endpoint, params, cap)
            .with_page_size(self.page_size)
            .with_retry(self.retry)
            .with_cancellation(cancel)
            .fetch_all()
            .await;

        let options = self.normalize_options(kind, include_cover_art);
        let received = run.records.len();
        let results = normalize_page(kind, run.records, &options);

        tracing::info!(
            %kind,
            endpoint,
            pages = run.pages,
            received,
            returned = results.len(),
            "search finished"
        );

        match run.error {
            None => Ok(results),
            Some(error) => Err(Error::incomplete(results, error)),
        }
    }

    /// Finds the id of the best-matching author for `name`.
    async fn resolve_author(&self, name: &str, cancel: &CancellationToken) -> Result<String> {
        let params = QueryParams::new().with("name", name.trim());
        let records = Paginator::new(
            Arc::clone(&self.transport),
            EntityKind::Author.endpoint(),
            params,
            1,
        )
        .with_retry(self.retry)
        .with_cancellation(cancel.clone())
        .fetch_all()
        .await
        .into_result()?;

        normalize_page(EntityKind::Author, records, &NormalizeOptions::default())
            .into_iter()
            .next()
            .map(|author| author.id)
            .ok_or_else(|| Error::UnknownAuthor(name.trim().to_string()))
    }

    fn normalize_options(&self, kind: EntityKind, include_cover_art: bool) -> NormalizeOptions {
        NormalizeOptions {
            include_cover_art: include_cover_art && kind == EntityKind::Manga,
            cover_base: self.cover_base.clone(),
        }
    }
}

/// A fluent builder for advanced manga searches.
///
/// Setters only record values; everything is validated when
/// [`execute()`](AdvancedSearch::execute) runs.
///
/// # Examples
///
/// ```rust,no_run
/// # use shirabe::prelude::*;
/// # use shirabe::error::Result;
/// # async fn example() -> Result<()> {
/// # let search = Search::new()?;
/// let romance = search
///     .advanced()
///     .title("kaguya")
///     .content_rating("safe")
///     .tag("Romance")
///     .exclude_tag("Tragedy")
///     .has_available_chapters(true)
///     .max_results(10)
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct AdvancedSearch<'a> {
    search: &'a Search,
    request: SearchRequest,
    cancel: CancellationToken,
}

impl<'a> AdvancedSearch<'a> {
    pub(crate) fn new(search: &'a Search) -> Self {
        Self {
            search,
            request: SearchRequest::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.request.title = Some(title.into());
        self
    }

    /// One of `safe`, `suggestive`, `erotica`, `all`.
    pub fn content_rating(mut self, rating: impl Into<String>) -> Self {
        self.request.content_rating = Some(rating.into());
        self
    }

    /// Adds a tag every result must carry.
    pub fn tag(mut self, name: impl Into<String>) -> Self {
        self.request.tags.push(name.into());
        self
    }

    pub fn tags<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.tags.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds a tag that excludes a result.
    pub fn exclude_tag(mut self, name: impl Into<String>) -> Self {
        self.request.excluded_tags.push(name.into());
        self
    }

    pub fn demographic(mut self, name: impl Into<String>) -> Self {
        self.request.demographic = Some(name.into());
        self
    }

    pub fn has_available_chapters(mut self, available: bool) -> Self {
        self.request.has_available_chapters = Some(available);
        self
    }

    /// Sort code between 1 and 13, see [`sort_order`](crate::types::sort_order).
    pub fn sort_by(mut self, code: u8) -> Self {
        self.request.sort_by = Some(code);
        self
    }

    pub fn max_results(mut self, cap: usize) -> Self {
        self.request.max_results = cap;
        self
    }

    /// Restricts results to titles by this author or artist.
    pub fn author(mut self, name: impl Into<String>) -> Self {
        self.request.author = Some(name.into());
        self
    }

    pub fn include_cover_art(mut self, include: bool) -> Self {
        self.request.include_cover_art = include;
        self
    }

    /// Abandons the search once `token` is cancelled, including while tag,
    /// demographic or author names are still being resolved.
    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns the request without executing it.
    pub fn build(self) -> SearchRequest {
        self.request
    }

    /// Executes the search.
    pub async fn execute(self) -> Result<Vec<NormalizedResult>> {
        self.search
            .advanced_search_with_cancel(self.request, self.cancel)
            .await
    }
}
