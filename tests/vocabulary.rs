//! Vocabulary tests
//!
//! Lazy loading, single-flight fetches, and refresh behavior of the tag cache.

use std::sync::Arc;
use std::time::Duration;

use shirabe::prelude::*;
use shirabe::types::Category;
use shirabe::vocabulary::TAG_ENDPOINT;

mod common;
use common::{FakeTransport, Reply, fast_retry, fixture_vocabulary, tag_list};

#[cfg(test)]
mod vocabulary_tests {
    use super::*;

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = fixture_vocabulary(transport.clone());

        let first = vocabulary.resolve("Action", Category::Tag).await.unwrap();
        let second = vocabulary.resolve("Action", Category::Tag).await.unwrap();

        assert_eq!(first, "t1");
        assert_eq!(first, second);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_ignores_case_and_whitespace() {
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = fixture_vocabulary(transport.clone());

        assert_eq!(vocabulary.resolve("  ACTION ", Category::Tag).await.unwrap(), "t1");
        assert_eq!(
            vocabulary.resolve("Shounen", Category::Demographic).await.unwrap(),
            "d1"
        );
    }

    #[tokio::test]
    async fn test_categories_are_separate() {
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = fixture_vocabulary(transport.clone());

        let err = vocabulary.resolve("shounen", Category::Tag).await.unwrap_err();
        assert!(matches!(err, Error::UnknownTag(name) if name == "shounen"));
    }

    #[tokio::test]
    async fn test_loads_once_on_first_use() {
        let transport = Arc::new(
            FakeTransport::new().script(TAG_ENDPOINT, vec![Reply::Json(tag_list())]),
        );
        let vocabulary = Vocabulary::new(transport.clone());
        assert!(!vocabulary.is_loaded().await);

        assert_eq!(vocabulary.resolve("Romance", Category::Tag).await.unwrap(), "t3");
        assert_eq!(vocabulary.resolve("Adventure", Category::Tag).await.unwrap(), "t2");

        assert!(vocabulary.is_loaded().await);
        assert_eq!(transport.call_count(TAG_ENDPOINT), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_fetches_once() {
        let transport = Arc::new(
            FakeTransport::new()
                .with_delay(Duration::from_millis(20))
                .script(TAG_ENDPOINT, vec![Reply::Json(tag_list())]),
        );
        let vocabulary = Arc::new(Vocabulary::new(transport.clone()));

        let (a, b, c) = tokio::join!(
            vocabulary.resolve("Action", Category::Tag),
            vocabulary.resolve("adventure", Category::Tag),
            vocabulary.resolve("seinen", Category::Demographic),
        );

        assert_eq!(a.unwrap(), "t1");
        assert_eq!(b.unwrap(), "t2");
        assert_eq!(c.unwrap(), "seinen");
        assert_eq!(transport.call_count(TAG_ENDPOINT), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let transport = Arc::new(FakeTransport::new().script(
            TAG_ENDPOINT,
            vec![Reply::Status(500, "boom"), Reply::Json(tag_list())],
        ));
        let vocabulary = Vocabulary::new(transport.clone());

        let err = vocabulary.resolve("Action", Category::Tag).await.unwrap_err();
        assert!(matches!(err, Error::RequestFailed { status: 500, .. }));
        assert!(!vocabulary.is_loaded().await);

        assert_eq!(vocabulary.resolve("Action", Category::Tag).await.unwrap(), "t1");
        assert_eq!(transport.call_count(TAG_ENDPOINT), 2);
    }

    #[tokio::test]
    async fn test_rate_limited_load_is_retried() {
        let transport = Arc::new(FakeTransport::new().script(
            TAG_ENDPOINT,
            vec![Reply::RateLimited(None), Reply::Json(tag_list())],
        ));
        let vocabulary = Vocabulary::new(transport.clone()).with_retry(fast_retry(2));

        assert_eq!(vocabulary.resolve("Action", Category::Tag).await.unwrap(), "t1");
        assert_eq!(transport.call_count(TAG_ENDPOINT), 2);
    }

    #[tokio::test]
    async fn test_fresh_snapshot_answers_misses_directly() {
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = fixture_vocabulary(transport.clone());

        let err = vocabulary.resolve("Romance", Category::Tag).await.unwrap_err();
        assert!(matches!(err, Error::UnknownTag(name) if name == "Romance"));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stale_snapshot_refreshes_on_miss() {
        let transport = Arc::new(
            FakeTransport::new().script(TAG_ENDPOINT, vec![Reply::Json(tag_list())]),
        );
        let vocabulary =
            fixture_vocabulary(transport.clone()).with_refresh_after(Duration::ZERO);

        // Romance is missing from the preloaded snapshot but present upstream.
        assert_eq!(vocabulary.resolve("Romance", Category::Tag).await.unwrap(), "t3");
        assert_eq!(transport.call_count(TAG_ENDPOINT), 1);
    }

    #[tokio::test]
    async fn test_unknown_after_refresh() {
        let transport = Arc::new(
            FakeTransport::new().script(TAG_ENDPOINT, vec![Reply::Json(tag_list())]),
        );
        let vocabulary =
            fixture_vocabulary(transport.clone()).with_refresh_after(Duration::ZERO);

        let err = vocabulary.resolve("Isekai", Category::Tag).await.unwrap_err();
        assert!(matches!(err, Error::UnknownTag(name) if name == "Isekai"));
        assert_eq!(transport.call_count(TAG_ENDPOINT), 1);
    }

    #[tokio::test]
    async fn test_entries_include_demographics() {
        let transport = Arc::new(
            FakeTransport::new().script(TAG_ENDPOINT, vec![Reply::Json(tag_list())]),
        );
        let vocabulary = Vocabulary::new(transport.clone());

        let entries = vocabulary.entries().await.unwrap();
        let tags = entries.iter().filter(|e| e.category == Category::Tag).count();
        let demographics: Vec<_> = entries
            .iter()
            .filter(|e| e.category == Category::Demographic)
            .map(|e| e.name.as_str())
            .collect();

        assert_eq!(tags, 3);
        assert_eq!(demographics, vec!["shounen", "shoujo", "seinen", "josei", "none"]);
    }

    #[tokio::test]
    async fn test_ids_by_category() {
        let transport = Arc::new(
            FakeTransport::new().script(TAG_ENDPOINT, vec![Reply::Json(tag_list())]),
        );
        let vocabulary = Vocabulary::new(transport.clone());

        let demographics = vocabulary.ids(Category::Demographic).await.unwrap();
        assert_eq!(demographics, vec!["shounen", "shoujo", "seinen", "josei", "none"]);

        let tags = vocabulary.ids(Category::Tag).await.unwrap();
        assert_eq!(tags, vec!["t1", "t2", "t3"]);
        assert_eq!(transport.call_count(TAG_ENDPOINT), 1);
    }
}
