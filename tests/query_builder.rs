//! Query building tests
//!
//! Validation, name resolution, and parameter rendering for every entity kind.

use std::sync::Arc;

use shirabe::prelude::*;
use shirabe::query::{QueryBuilder, validate};
use shirabe::types::{SortDirection, VocabularyEntry, sort_order};

mod common;
use common::{FakeTransport, fixture_vocabulary};

#[cfg(test)]
mod query_tests {
    use super::*;

    fn request(title: &str) -> SearchRequest {
        SearchRequest::from(title)
    }

    #[test]
    fn test_sort_code_table() {
        let expected = [
            ("relevance", SortDirection::Desc),
            ("latestUploadedChapter", SortDirection::Desc),
            ("latestUploadedChapter", SortDirection::Asc),
            ("title", SortDirection::Asc),
            ("title", SortDirection::Desc),
            ("rating", SortDirection::Desc),
            ("rating", SortDirection::Asc),
            ("followedCount", SortDirection::Desc),
            ("followedCount", SortDirection::Asc),
            ("createdAt", SortDirection::Desc),
            ("createdAt", SortDirection::Asc),
            ("year", SortDirection::Asc),
            ("year", SortDirection::Desc),
        ];

        for (code, (field, direction)) in (1u8..=13).zip(expected) {
            let order = sort_order(code).unwrap();
            assert_eq!(order.field, field, "sort code {}", code);
            assert_eq!(order.direction, direction, "sort code {}", code);
        }
    }

    #[test]
    fn test_sort_code_out_of_range() {
        for code in [0u8, 14, 255] {
            assert!(matches!(sort_order(code), Err(Error::InvalidSortCode(c)) if c == code));
        }
    }

    #[test]
    fn test_validate_content_ratings() {
        let mut req = request("x");
        assert_eq!(validate(&req).unwrap().ratings, ContentRating::DEFAULT.to_vec());

        req.content_rating = Some("all".to_string());
        assert_eq!(validate(&req).unwrap().ratings.len(), 3);

        req.content_rating = Some(" Erotica ".to_string());
        assert_eq!(validate(&req).unwrap().ratings, vec![ContentRating::Erotica]);

        req.content_rating = Some("pg-13".to_string());
        assert!(matches!(validate(&req), Err(Error::InvalidContentRating(v)) if v == "pg-13"));
    }

    #[test]
    fn test_validate_result_cap() {
        let req = SearchRequest {
            max_results: 0,
            ..request("x")
        };
        let err = validate(&req).unwrap_err();
        assert!(matches!(err, Error::InvalidResultCap(0)));
        assert!(err.is_validation());

        let req = SearchRequest {
            max_results: 1,
            ..request("x")
        };
        assert_eq!(validate(&req).unwrap().cap, 1);
    }

    #[tokio::test]
    async fn test_default_manga_query() {
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = fixture_vocabulary(transport.clone());

        let params = QueryBuilder::new(&vocabulary)
            .build(EntityKind::Manga, &request("Naruto"))
            .await
            .unwrap();

        assert_eq!(
            params.to_query_string(),
            "title=Naruto&contentRating[]=safe&contentRating[]=suggestive&includes[]=cover_art"
        );
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_filtered_manga_query() {
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = fixture_vocabulary(transport.clone());

        let req = SearchRequest {
            title: None,
            tags: vec!["action".to_string(), "adventure".to_string()],
            demographic: Some("shounen".to_string()),
            sort_by: Some(1),
            max_results: 10,
            ..Default::default()
        };

        let params = QueryBuilder::new(&vocabulary)
            .build(EntityKind::Manga, &req)
            .await
            .unwrap();

        assert_eq!(
            params.to_query_string(),
            "contentRating[]=safe&contentRating[]=suggestive\
             &includedTags[]=t1&includedTags[]=t2&includedTagsMode=AND\
             &publicationDemographic[]=d1&includes[]=cover_art&order[relevance]=desc"
        );
    }

    #[tokio::test]
    async fn test_all_demographics() {
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = Vocabulary::preloaded(
            transport.clone(),
            vec![
                VocabularyEntry::tag("Action", "t1"),
                VocabularyEntry::demographic("shounen", "shounen"),
                VocabularyEntry::demographic("Shounen", "shounen"),
                VocabularyEntry::demographic("seinen", "seinen"),
            ],
        );

        let req = SearchRequest {
            demographic: Some(" ALL ".to_string()),
            ..request("x")
        };
        let params = QueryBuilder::new(&vocabulary)
            .build(EntityKind::Manga, &req)
            .await
            .unwrap();

        assert_eq!(params.get_all("publicationDemographic[]"), vec!["shounen", "seinen"]);
        assert!(transport.calls().is_empty());

        let fixture = fixture_vocabulary(transport.clone());
        let params = QueryBuilder::new(&fixture)
            .build(EntityKind::Manga, &req)
            .await
            .unwrap();
        assert_eq!(params.get_all("publicationDemographic[]"), vec!["d1"]);
    }

    #[tokio::test]
    async fn test_excluded_tags_and_chapter_filter() {
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = fixture_vocabulary(transport.clone());

        let req = SearchRequest {
            tags: vec!["Action".to_string()],
            excluded_tags: vec!["Adventure".to_string()],
            has_available_chapters: Some(true),
            include_cover_art: false,
            ..request("Berserk")
        };

        let params = QueryBuilder::new(&vocabulary)
            .build(EntityKind::Manga, &req)
            .await
            .unwrap();

        assert_eq!(params.get_all("includedTags[]"), vec!["t1"]);
        assert_eq!(params.get("includedTagsMode"), Some("AND"));
        assert_eq!(params.get_all("excludedTags[]"), vec!["t2"]);
        assert_eq!(params.get("excludedTagsMode"), Some("OR"));
        assert_eq!(params.get("hasAvailableChapters"), Some("true"));
        assert!(params.get("includes[]").is_none());
        assert!(params.get("order[relevance]").is_none());
    }

    #[tokio::test]
    async fn test_repeated_tags_are_deduplicated() {
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = fixture_vocabulary(transport.clone());

        let req = SearchRequest {
            tags: vec!["Action".to_string(), " action ".to_string(), "Adventure".to_string()],
            ..request("x")
        };

        let params = QueryBuilder::new(&vocabulary)
            .build(EntityKind::Manga, &req)
            .await
            .unwrap();

        assert_eq!(params.get_all("includedTags[]"), vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn test_query_is_deterministic() {
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = fixture_vocabulary(transport.clone());
        let builder = QueryBuilder::new(&vocabulary);

        let req = SearchRequest {
            tags: vec!["Adventure".to_string(), "Action".to_string()],
            sort_by: Some(6),
            ..request("One Piece")
        };

        let first = builder.build(EntityKind::Manga, &req).await.unwrap();
        let second = builder.build(EntityKind::Manga, &req).await.unwrap();

        assert_eq!(first.to_query_string(), second.to_query_string());
        assert!(first.to_query_string().starts_with("title=One%20Piece&"));
        assert!(first.to_query_string().ends_with("&order[rating]=desc"));
    }

    #[tokio::test]
    async fn test_group_and_author_queries() {
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = fixture_vocabulary(transport.clone());
        let builder = QueryBuilder::new(&vocabulary);

        let group = builder
            .build(EntityKind::Group, &request("MangaPlus"))
            .await
            .unwrap();
        assert_eq!(group.to_query_string(), "name=MangaPlus&includes[]=leader");

        let author = builder
            .build(EntityKind::Author, &request("Oda"))
            .await
            .unwrap();
        assert_eq!(author.to_query_string(), "name=Oda");
    }

    #[tokio::test]
    async fn test_blank_title_is_omitted() {
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = fixture_vocabulary(transport.clone());

        let params = QueryBuilder::new(&vocabulary)
            .build(EntityKind::Manga, &request("   "))
            .await
            .unwrap();

        assert!(params.get("title").is_none());
    }

    #[tokio::test]
    async fn test_unknown_names_fail_without_network() {
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = fixture_vocabulary(transport.clone());
        let builder = QueryBuilder::new(&vocabulary);

        let req = SearchRequest {
            tags: vec!["Action".to_string(), "Nonexistent".to_string()],
            ..request("x")
        };
        let err = builder.build(EntityKind::Manga, &req).await.unwrap_err();
        assert!(matches!(err, Error::UnknownTag(name) if name == "Nonexistent"));

        let req = SearchRequest {
            demographic: Some("kodomo".to_string()),
            ..request("x")
        };
        let err = builder.build(EntityKind::Manga, &req).await.unwrap_err();
        assert!(matches!(err, Error::UnknownDemographic(name) if name == "kodomo"));

        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_validation_precedes_vocabulary_load() {
        // Unloaded vocabulary: any resolution would hit the transport.
        let transport = Arc::new(FakeTransport::new());
        let vocabulary = Vocabulary::new(transport.clone());

        let req = SearchRequest {
            tags: vec!["Action".to_string()],
            sort_by: Some(14),
            ..request("x")
        };

        let err = QueryBuilder::new(&vocabulary)
            .build(EntityKind::Manga, &req)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidSortCode(14)));
        assert!(transport.calls().is_empty());
        assert!(!vocabulary.is_loaded().await);
    }
}
