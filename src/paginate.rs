//! Offset-based page retrieval.
//!
//! A [`Paginator`] walks one search endpoint from offset 0, one page at a
//! time, until one of these happens:
//!
//! - the caller's cap is reached (the last page only asks for what is left)
//! - the service returns fewer records than were asked for
//! - the service's reported `total` has been consumed
//! - the offset window of [`MAX_OFFSET_WINDOW`] records is exhausted
//! - a request fails, or the caller cancels between pages
//!
//! Rate-limited pages are retried through the configured
//! [`RetryPolicy`](crate::net::retry::RetryPolicy). Any other failure ends the
//! run; records from earlier pages are kept and reported next to the error.

use futures::stream::{self, Stream};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::MAX_PAGE_SIZE;
use crate::error::{Error, Result};
use crate::net::{Transport, params::QueryParams, retry::RetryPolicy};

/// The service refuses requests where `offset + limit` exceeds this.
pub const MAX_OFFSET_WINDOW: usize = 10_000;

/// Collection envelope returned by search endpoints.
#[derive(Debug, Deserialize)]
struct PageEnvelope {
    data: Vec<Value>,
    #[serde(default)]
    total: Option<usize>,
}

/// One `(offset, limit)` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

/// Everything a completed [`Paginator::fetch_all`] run produced.
///
/// `records` is always populated with what was retrieved, even when `error`
/// is set.
#[derive(Debug)]
pub struct PageRun {
    pub records: Vec<Value>,
    pub pages: usize,
    pub error: Option<Error>,
}

impl PageRun {
    /// Converts the run into a result, dropping partial records on failure.
    pub fn into_result(self) -> Result<Vec<Value>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.records),
        }
    }
}

/// Drives paged requests against one endpoint.
///
/// Each paginator runs once; calling [`fetch_all`](Paginator::fetch_all) again
/// means building a new one, which starts over from offset 0.
///
/// # Examples
///
/// ```rust,no_run
/// use shirabe::net::{HttpClient, params::QueryParams};
/// use shirabe::paginate::Paginator;
/// use std::sync::Arc;
///
/// # async fn example() -> shirabe::Result<()> {
/// let params = QueryParams::new().with("title", "Berserk");
/// let run = Paginator::new(Arc::new(HttpClient::new()), "/manga", params, 250)
///     .fetch_all()
///     .await;
///
/// println!("{} records in {} pages", run.records.len(), run.pages);
/// # Ok(())
/// # }
/// ```
pub struct Paginator {
    transport: Arc<dyn Transport>,
    endpoint: String,
    params: QueryParams,
    cap: usize,
    page_size: usize,
    retry: RetryPolicy,
    cancel: CancellationToken,
    offset: usize,
    fetched: usize,
    done: bool,
}

impl Paginator {
    /// Creates a paginator returning at most `cap` records.
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint: impl Into<String>,
        params: QueryParams,
        cap: usize,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            params,
            cap,
            page_size: MAX_PAGE_SIZE,
            retry: RetryPolicy::default(),
            cancel: CancellationToken::new(),
            offset: 0,
            fetched: 0,
            done: false,
        }
    }

    /// Sets the page size, clamped to 1..=[`MAX_PAGE_SIZE`].
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Stops the run before the next page once `token` is cancelled.
    ///
    /// A page request already in flight completes normally.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The next request to issue, or `None` once the run is over.
    pub fn next_request(&self) -> Option<PageRequest> {
        if self.done {
            return None;
        }

        let remaining = self.cap.saturating_sub(self.fetched);
        let window = MAX_OFFSET_WINDOW.saturating_sub(self.offset);
        let limit = self.page_size.min(remaining).min(window);

        (limit > 0).then_some(PageRequest {
            offset: self.offset,
            limit,
        })
    }

    /// Fetches the next page.
    ///
    /// Returns `Ok(None)` once the run is over. After an error the run is over
    /// as well.
    ///
    /// # Errors
    ///
    /// * [`Error::Cancelled`] - The cancellation token fired
    /// * [`Error::RateLimitExceeded`] - The page stayed rate limited
    /// * Any other transport error, unchanged
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        let Some(page) = self.next_request() else {
            self.done = true;
            return Ok(None);
        };

        if self.cancel.is_cancelled() {
            self.done = true;
            return Err(Error::Cancelled);
        }

        match self.fetch(page).await {
            Ok(records) => Ok(Some(records)),
            Err(error) => {
                self.done = true;
                Err(error)
            }
        }
    }

    async fn fetch(&mut self, page: PageRequest) -> Result<Vec<Value>> {
        let params = &self
            .params
            .clone()
            .with("limit", page.limit)
            .with("offset", page.offset);
        let transport = &self.transport;
        let endpoint = self.endpoint.as_str();

        tracing::debug!(endpoint, offset = page.offset, limit = page.limit, "fetching page");
        let body = self
            .retry
            .run(move || transport.get_json(endpoint, params))
            .await?;

        let PageEnvelope { mut data, total } = serde_json::from_value(body)?;
        let received = data.len();
        data.truncate(page.limit);

        self.offset += page.limit;
        self.fetched += data.len();

        let exhausted = received < page.limit || total.is_some_and(|total| self.offset >= total);
        if exhausted || self.fetched >= self.cap {
            self.done = true;
        }

        Ok(data)
    }

    /// Runs to completion, collecting every record.
    pub async fn fetch_all(mut self) -> PageRun {
        let mut records = Vec::new();
        let mut pages = 0;

        loop {
            match self.next_page().await {
                Ok(Some(page)) => {
                    pages += 1;
                    records.extend(page);
                }
                Ok(None) => {
                    return PageRun {
                        records,
                        pages,
                        error: None,
                    };
                }
                Err(error) => {
                    return PageRun {
                        records,
                        pages,
                        error: Some(error),
                    };
                }
            }
        }
    }

    /// Yields pages lazily. The stream ends after the last page or the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<Value>>> {
        stream::unfold(self, |mut paginator| async move {
            match paginator.next_page().await {
                Ok(Some(page)) => Some((Ok(page), paginator)),
                Ok(None) => None,
                Err(error) => Some((Err(error), paginator)),
            }
        })
    }
}
