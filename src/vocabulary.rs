//! Tag and demographic name resolution.
//!
//! Catalog filters take opaque identifiers, while callers think in names
//! ("Action", "shounen"). [`Vocabulary`] owns a snapshot of the service's tag
//! list, fetched once on first use and shared by every search that holds the
//! same `Vocabulary`.
//!
//! # Loading
//!
//! The first resolution loads the snapshot under an async mutex. Concurrent
//! callers wait on that mutex and then read the populated snapshot, so the tag
//! list is fetched at most once per load. A failed load stores nothing; the
//! error is returned and the next call tries again.
//!
//! A name missing from the snapshot triggers a single refresh, but only once
//! the snapshot is older than the configured refresh interval. Newer snapshots
//! answer misses with [`UnknownTag`](crate::Error::UnknownTag) / [`UnknownDemographic`](crate::Error::UnknownDemographic)
//! directly.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::net::{Transport, json, params::QueryParams, retry::RetryPolicy};
use crate::types::{Category, VocabularyEntry};

/// Endpoint listing every tag known to the catalog.
pub const TAG_ENDPOINT: &str = "/manga/tag";

/// Publication demographics accepted by the catalog. Their identifiers are the
/// labels themselves.
pub const DEMOGRAPHICS: [&str; 5] = ["shounen", "shoujo", "seinen", "josei", "none"];

/// Trims and lower-cases a name for lookup.
fn lookup_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug)]
struct Snapshot {
    entries: Vec<VocabularyEntry>,
    index: HashMap<(Category, String), String>,
    loaded_at: Instant,
}

impl Snapshot {
    fn new(entries: Vec<VocabularyEntry>) -> Self {
        let index = entries
            .iter()
            .map(|e| ((e.category, lookup_key(&e.name)), e.id.clone()))
            .collect();

        Self {
            entries,
            index,
            loaded_at: Instant::now(),
        }
    }

    fn lookup(&self, key: &str, category: Category) -> Option<String> {
        self.index.get(&(category, key.to_string())).cloned()
    }
}

/// Process-lifetime cache mapping tag and demographic names to identifiers.
///
/// # Examples
///
/// ```rust,no_run
/// use shirabe::net::HttpClient;
/// use shirabe::types::Category;
/// use shirabe::vocabulary::Vocabulary;
/// use std::sync::Arc;
///
/// # async fn example() -> shirabe::Result<()> {
/// let vocabulary = Vocabulary::new(Arc::new(HttpClient::new()));
///
/// let action = vocabulary.resolve("Action", Category::Tag).await?;
/// let shounen = vocabulary.resolve("shounen", Category::Demographic).await?;
/// # Ok(())
/// # }
/// ```
pub struct Vocabulary {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    refresh_after: Duration,
    state: Mutex<Option<Arc<Snapshot>>>,
}

impl Vocabulary {
    /// Creates an empty vocabulary that loads from `transport` on first use.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            refresh_after: Duration::from_secs(900),
            state: Mutex::new(None),
        }
    }

    /// Creates a vocabulary already populated with `entries`.
    ///
    /// The snapshot counts as freshly loaded, so misses within the refresh
    /// interval fail without contacting the service.
    pub fn preloaded(transport: Arc<dyn Transport>, entries: Vec<VocabularyEntry>) -> Self {
        Self {
            state: Mutex::new(Some(Arc::new(Snapshot::new(entries)))),
            ..Self::new(transport)
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the snapshot age after which a miss triggers a refresh.
    pub fn with_refresh_after(mut self, refresh_after: Duration) -> Self {
        self.refresh_after = refresh_after;
        self
    }

    /// Resolves `name` in `category` to the service identifier.
    ///
    /// Matching ignores case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// * [`UnknownTag`](crate::Error::UnknownTag) / [`UnknownDemographic`](crate::Error::UnknownDemographic) - The name is not
    ///   in the vocabulary
    /// * Transport errors from loading the tag list
    pub async fn resolve(&self, name: &str, category: Category) -> Result<String> {
        let key = lookup_key(name);
        let snapshot = self.snapshot().await?;

        if let Some(id) = snapshot.lookup(&key, category) {
            return Ok(id);
        }

        let snapshot = self.refresh(&snapshot).await?;
        snapshot
            .lookup(&key, category)
            .ok_or_else(|| category.unknown(name.trim()))
    }

    /// Every known entry, loading the vocabulary if needed.
    pub async fn entries(&self) -> Result<Vec<VocabularyEntry>> {
        Ok(self.snapshot().await?.entries.clone())
    }

    /// Identifiers of every entry in `category`, in snapshot order and without
    /// repeats.
    pub async fn ids(&self, category: Category) -> Result<Vec<String>> {
        let snapshot = self.snapshot().await?;
        let mut seen = HashSet::new();

        Ok(snapshot
            .entries
            .iter()
            .filter(|e| e.category == category && seen.insert(e.id.as_str()))
            .map(|e| e.id.clone())
            .collect())
    }

    /// Returns `true` once a snapshot has been loaded.
    pub async fn is_loaded(&self) -> bool {
        self.state.lock().await.is_some()
    }

    async fn snapshot(&self) -> Result<Arc<Snapshot>> {
        let mut state = self.state.lock().await;

        if let Some(snapshot) = state.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let snapshot = Arc::new(self.load().await?);
        *state = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    async fn refresh(&self, stale: &Arc<Snapshot>) -> Result<Arc<Snapshot>> {
        let mut state = self.state.lock().await;

        if let Some(current) = state.as_ref() {
            // Another caller already replaced it, or it is too new to refetch.
            if !Arc::ptr_eq(current, stale) || current.loaded_at.elapsed() < self.refresh_after {
                return Ok(Arc::clone(current));
            }
        }

        tracing::debug!("vocabulary miss, refreshing tag list");
        let snapshot = Arc::new(self.load().await?);
        *state = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    async fn load(&self) -> Result<Snapshot> {
        let transport = &self.transport;
        let params = &QueryParams::new();
        let body = self
            .retry
            .run(move || transport.get_json(TAG_ENDPOINT, params))
            .await?;

        let mut entries = parse_tags(&body);
        entries.extend(
            DEMOGRAPHICS
                .iter()
                .map(|label| VocabularyEntry::demographic(*label, *label)),
        );

        tracing::info!(entries = entries.len(), "vocabulary loaded");
        Ok(Snapshot::new(entries))
    }
}

/// Reads tag entries from a tag-list body. Every localized name of a tag maps
/// to its identifier; records without an id are ignored.
fn parse_tags(body: &Value) -> Vec<VocabularyEntry> {
    let mut entries = Vec::new();

    for tag in json::extract_array(body, "data") {
        let Some(id) = json::extract_str(tag, "id") else {
            continue;
        };

        let names = json::extract_path(tag, "attributes.name").and_then(Value::as_object);
        for name in names.into_iter().flat_map(|m| m.values()).filter_map(Value::as_str) {
            if !name.trim().is_empty() {
                entries.push(VocabularyEntry::tag(name.trim(), id.clone()));
            }
        }
    }

    entries
}
