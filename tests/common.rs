//! Common test utilities and fixtures
//!
//! Shared functionality used across all test modules: a scripted in-memory
//! transport and JSON builders for catalog records.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use shirabe::config::SearchConfig;
use shirabe::net::{Transport, params::QueryParams, retry::RetryPolicy};
use shirabe::search::Search;
use shirabe::types::VocabularyEntry;
use shirabe::vocabulary::Vocabulary;
use shirabe::{Error, Result};

pub const COVER_BASE: &str = "https://uploads.mangadex.org/covers";

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    RateLimited(Option<u64>),
    Status(u16, &'static str),
}

/// In-memory [`Transport`].
///
/// Scripted replies for an endpoint are served first, in order. Once those run
/// out, an endpoint with a catalog answers by slicing it with the request's
/// `limit` and `offset`. Anything else is a 404.
#[derive(Default)]
pub struct FakeTransport {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    catalogs: Mutex<HashMap<String, Vec<Value>>>,
    calls: Mutex<Vec<(String, QueryParams)>>,
    delay: Option<Duration>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every reply, so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn script(self, endpoint: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .entry(endpoint.to_string())
            .or_default()
            .extend(replies);
        self
    }

    pub fn catalog(self, endpoint: &str, records: Vec<Value>) -> Self {
        self.catalogs.lock().insert(endpoint.to_string(), records);
        self
    }

    pub fn calls(&self) -> Vec<(String, QueryParams)> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<QueryParams> {
        self.calls
            .lock()
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls_to(endpoint).len()
    }

    /// The `offset` of every call to `endpoint`, in call order.
    pub fn offsets(&self, endpoint: &str) -> Vec<usize> {
        self.paging_values(endpoint, "offset")
    }

    /// The `limit` of every call to `endpoint`, in call order.
    pub fn limits(&self, endpoint: &str) -> Vec<usize> {
        self.paging_values(endpoint, "limit")
    }

    fn paging_values(&self, endpoint: &str, key: &str) -> Vec<usize> {
        self.calls_to(endpoint)
            .iter()
            .filter_map(|p| p.get(key)?.parse().ok())
            .collect()
    }

    fn serve_catalog(&self, endpoint: &str, params: &QueryParams) -> Option<Value> {
        let catalogs = self.catalogs.lock();
        let records = catalogs.get(endpoint)?;

        let offset: usize = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
        let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(10);
        let data: Vec<Value> = records.iter().skip(offset).take(limit).cloned().collect();

        Some(json!({
            "result": "ok",
            "response": "collection",
            "data": data,
            "limit": limit,
            "offset": offset,
            "total": records.len(),
        }))
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get_json(&self, endpoint: &str, params: &QueryParams) -> Result<Value> {
        self.calls.lock().push((endpoint.to_string(), params.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .scripts
            .lock()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front);

        match scripted {
            Some(Reply::Json(body)) => Ok(body),
            Some(Reply::RateLimited(retry_after)) => Err(Error::RateLimited { retry_after }),
            Some(Reply::Status(status, body)) => Err(Error::RequestFailed {
                status,
                body: body.to_string(),
            }),
            None => self
                .serve_catalog(endpoint, params)
                .ok_or_else(|| Error::RequestFailed {
                    status: 404,
                    body: format!("no route for {}", endpoint),
                }),
        }
    }
}

/// A retry policy that backs off for a millisecond.
pub fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries)
        .with_base_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(5))
}

/// Configuration without pacing and with near-instant backoff.
pub fn test_config() -> SearchConfig {
    SearchConfig {
        rate_limit_ms: 0,
        backoff_base_ms: 1,
        backoff_max_ms: 5,
        api_token: None,
        ..Default::default()
    }
}

/// Vocabulary with `Action -> t1`, `Adventure -> t2` and `shounen -> d1`.
pub fn fixture_vocabulary(transport: Arc<FakeTransport>) -> Vocabulary {
    Vocabulary::preloaded(
        transport,
        vec![
            VocabularyEntry::tag("Action", "t1"),
            VocabularyEntry::tag("Adventure", "t2"),
            VocabularyEntry::demographic("shounen", "d1"),
        ],
    )
}

/// A [`Search`] over `transport` using [`fixture_vocabulary`].
pub fn fixture_search(transport: &Arc<FakeTransport>) -> Search {
    fixture_search_with(transport, test_config())
}

pub fn fixture_search_with(transport: &Arc<FakeTransport>, config: SearchConfig) -> Search {
    Search::with_transport(transport.clone(), &config)
        .with_vocabulary(Arc::new(fixture_vocabulary(transport.clone())))
}

/// A manga record with an English title and a cover art relationship.
pub fn manga(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "type": "manga",
        "attributes": {
            "title": {"en": title},
            "altTitles": [{"ja": format!("{} (ja)", title)}],
            "description": {"en": format!("About {}", title)},
            "year": 2001,
            "status": "ongoing",
            "contentRating": "safe",
            "tags": [
                {"id": "t1", "type": "tag", "attributes": {"name": {"en": "Action"}}}
            ]
        },
        "relationships": [
            {"id": "au1", "type": "author"},
            {"id": format!("c-{}", id), "type": "cover_art", "attributes": {"fileName": format!("{}.jpg", id)}}
        ]
    })
}

/// A manga record without any cover art relationship.
pub fn manga_without_cover(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "type": "manga",
        "attributes": {"title": {"en": title}},
        "relationships": [{"id": "au1", "type": "author"}]
    })
}

/// `count` manga records named `Manga 0`, `Manga 1`, ...
pub fn manga_catalog(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| manga(&format!("m{}", i), &format!("Manga {}", i)))
        .collect()
}

pub fn group(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "type": "scanlation_group",
        "attributes": {
            "name": name,
            "altNames": [],
            "description": "We scanlate things",
            "website": "https://example.org",
            "discord": "abc123",
            "twitter": null,
            "ircServer": ""
        },
        "relationships": [
            {"id": "u1", "type": "leader", "attributes": {"username": "captain"}}
        ]
    })
}

pub fn author(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "type": "author",
        "attributes": {
            "name": name,
            "biography": [],
            "twitter": "https://twitter.com/example",
            "pixiv": null,
            "website": "None"
        }
    })
}

/// A chapter feed entry numbered `number`, scanlated by "Team Leaf".
pub fn chapter(id: &str, number: &str) -> Value {
    json!({
        "id": id,
        "type": "chapter",
        "attributes": {
            "title": null,
            "volume": "3",
            "chapter": number,
            "pages": 19,
            "translatedLanguage": "en",
            "publishAt": "2021-04-01T00:00:00+00:00"
        },
        "relationships": [
            {"id": "g1", "type": "scanlation_group", "attributes": {"name": "Team Leaf"}},
            {"id": "m1", "type": "manga"}
        ]
    })
}

/// `count` numbered chapter entries.
pub fn chapter_feed(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|n| chapter(&format!("c{}", n), &n.to_string()))
        .collect()
}

/// A page envelope holding `records` and reporting `total`.
pub fn page(records: Vec<Value>, total: usize) -> Value {
    json!({
        "result": "ok",
        "response": "collection",
        "data": records,
        "total": total,
    })
}

/// The tag list served by `/manga/tag`.
pub fn tag_list() -> Value {
    let tag = |id: &str, name: &str| {
        json!({
            "id": id,
            "type": "tag",
            "attributes": {"name": {"en": name}, "group": "genre"}
        })
    };

    json!({
        "result": "ok",
        "response": "collection",
        "data": [tag("t1", "Action"), tag("t2", "Adventure"), tag("t3", "Romance")],
        "total": 3,
    })
}
