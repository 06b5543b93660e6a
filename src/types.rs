//! Core data types for search requests, sort orders, and normalized results.
//!
//! This module defines the fundamental data structures used throughout Shirabe:
//!
//! - [`SearchRequest`] - A declarative description of one catalog query
//! - [`ContentRating`] - Maturity classes accepted by the catalog
//! - [`SortOrder`] - The `(field, direction)` pair selected by a sort code
//! - [`NormalizedResult`] - One uniform record per manga, group or author
//! - [`VocabularyEntry`] - A tag or demographic name and its identifier
//!
//! # Examples
//!
//! ```rust
//! use shirabe::types::*;
//!
//! let request = SearchRequestBuilder::default()
//!     .title("One Piece")
//!     .tags(vec!["Action".to_string(), "Adventure".to_string()])
//!     .sort_by(6u8)
//!     .max_results(10usize)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.title.as_deref(), Some("One Piece"));
//! assert_eq!(sort_order(6).unwrap().field, "rating");
//! ```

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Number of results returned when the caller does not set a cap.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Declarative description of one catalog search.
///
/// Values are stored exactly as the caller supplied them; validation happens in
/// [`QueryBuilder::build`](crate::query::QueryBuilder::build) so that a request
/// loaded from a configuration file reports the same errors as one built in code.
///
/// The serde field names follow the configuration surface used by embedding
/// applications (`contentRating`, `sortBy`, `MaxSearch`, ...), so saved search
/// profiles can be deserialized directly:
///
/// ```rust
/// use shirabe::types::SearchRequest;
///
/// let request: SearchRequest = toml::from_str(r#"
///     tags = ["action", "adventure"]
///     demographic = "shounen"
///     sortBy = 1
///     MaxSearch = 10
/// "#).unwrap();
///
/// assert_eq!(request.max_results, 10);
/// assert_eq!(request.sort_by, Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct SearchRequest {
    /// Free-text title (or name, for group and author searches).
    #[builder(setter(into, strip_option))]
    pub title: Option<String>,

    /// One of `safe`, `suggestive`, `erotica`, `all`. Defaults to safe and suggestive.
    #[builder(setter(into, strip_option))]
    #[serde(rename = "contentRating")]
    pub content_rating: Option<String>,

    /// Tag names that every result must carry.
    pub tags: Vec<String>,

    /// Tag names that exclude a result if any of them is present.
    #[serde(rename = "excludedTags")]
    pub excluded_tags: Vec<String>,

    /// Publication demographic label such as `shounen`.
    #[builder(setter(into, strip_option))]
    pub demographic: Option<String>,

    /// Restrict to titles that have chapters available to read.
    #[builder(setter(into, strip_option))]
    #[serde(rename = "hasAvailableChapters")]
    pub has_available_chapters: Option<bool>,

    /// Sort code between 1 and 13, see [`sort_order`].
    #[builder(setter(into, strip_option))]
    #[serde(rename = "sortBy")]
    pub sort_by: Option<u8>,

    /// Maximum number of results returned across all pages.
    #[serde(rename = "MaxSearch")]
    pub max_results: usize,

    /// Author or artist name; resolved to an identifier before searching.
    #[builder(setter(into, strip_option))]
    pub author: Option<String>,

    /// Ask the service to embed cover art so results carry cover URLs.
    #[serde(rename = "includeCoverArt")]
    pub include_cover_art: bool,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            title: None,
            content_rating: None,
            tags: Vec::new(),
            excluded_tags: Vec::new(),
            demographic: None,
            has_available_chapters: None,
            sort_by: None,
            max_results: DEFAULT_MAX_RESULTS,
            author: None,
            include_cover_art: true,
        }
    }
}

impl From<&str> for SearchRequest {
    /// Creates a request with only the title set.
    ///
    /// ```rust
    /// use shirabe::types::SearchRequest;
    ///
    /// let request: SearchRequest = "naruto".into();
    /// assert_eq!(request.title.as_deref(), Some("naruto"));
    /// assert_eq!(request.max_results, 20);
    /// ```
    fn from(title: &str) -> Self {
        SearchRequest {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }
}

impl From<String> for SearchRequest {
    fn from(title: String) -> Self {
        SearchRequest {
            title: Some(title),
            ..Default::default()
        }
    }
}

/// Maturity classification accepted by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRating {
    Safe,
    Suggestive,
    Erotica,
}

impl ContentRating {
    /// Ratings used when the request leaves the filter unset.
    pub const DEFAULT: [ContentRating; 2] = [ContentRating::Safe, ContentRating::Suggestive];

    /// Every rating, as selected by `all`.
    pub const ALL: [ContentRating; 3] = [
        ContentRating::Safe,
        ContentRating::Suggestive,
        ContentRating::Erotica,
    ];

    /// Parses a content-rating filter value into the ratings it selects.
    ///
    /// `all` expands to every rating. Matching ignores case and surrounding
    /// whitespace.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidContentRating`] - For any other value
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shirabe::types::ContentRating;
    ///
    /// assert_eq!(ContentRating::parse_filter("safe").unwrap(), vec![ContentRating::Safe]);
    /// assert_eq!(ContentRating::parse_filter("all").unwrap().len(), 3);
    /// assert!(ContentRating::parse_filter("pg-13").is_err());
    /// ```
    pub fn parse_filter(value: &str) -> Result<Vec<ContentRating>> {
        match value.trim().to_lowercase().as_str() {
            "safe" => Ok(vec![ContentRating::Safe]),
            "suggestive" => Ok(vec![ContentRating::Suggestive]),
            "erotica" => Ok(vec![ContentRating::Erotica]),
            "all" => Ok(ContentRating::ALL.to_vec()),
            _ => Err(Error::InvalidContentRating(value.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentRating::Safe => "safe",
            ContentRating::Suggestive => "suggestive",
            ContentRating::Erotica => "erotica",
        }
    }
}

/// Direction of a sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// The `(field, direction)` ordering selected by a sort code.
///
/// Rendered into the query as `order[<field>]=<direction>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: &'static str,
    pub direction: SortDirection,
}

impl SortOrder {
    const fn new(field: &'static str, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// The query parameter key, e.g. `order[rating]`.
    pub fn param_key(&self) -> String {
        format!("order[{}]", self.field)
    }
}

/// Sort codes 1 through 13, in code order.
const SORT_ORDERS: [SortOrder; 13] = [
    SortOrder::new("relevance", SortDirection::Desc),
    SortOrder::new("latestUploadedChapter", SortDirection::Desc),
    SortOrder::new("latestUploadedChapter", SortDirection::Asc),
    SortOrder::new("title", SortDirection::Asc),
    SortOrder::new("title", SortDirection::Desc),
    SortOrder::new("rating", SortDirection::Desc),
    SortOrder::new("rating", SortDirection::Asc),
    SortOrder::new("followedCount", SortDirection::Desc),
    SortOrder::new("followedCount", SortDirection::Asc),
    SortOrder::new("createdAt", SortDirection::Desc),
    SortOrder::new("createdAt", SortDirection::Asc),
    SortOrder::new("year", SortDirection::Asc),
    SortOrder::new("year", SortDirection::Desc),
];

/// Looks up the ordering for a sort code.
///
/// | Code | Field                   | Direction |
/// |------|-------------------------|-----------|
/// | 1    | relevance               | desc      |
/// | 2    | latestUploadedChapter   | desc      |
/// | 3    | latestUploadedChapter   | asc       |
/// | 4    | title                   | asc       |
/// | 5    | title                   | desc      |
/// | 6    | rating                  | desc      |
/// | 7    | rating                  | asc       |
/// | 8    | followedCount           | desc      |
/// | 9    | followedCount           | asc       |
/// | 10   | createdAt               | desc      |
/// | 11   | createdAt               | asc       |
/// | 12   | year                    | asc       |
/// | 13   | year                    | desc      |
///
/// # Errors
///
/// * [`Error::InvalidSortCode`] - For any code outside 1-13
pub fn sort_order(code: u8) -> Result<SortOrder> {
    (code as usize)
        .checked_sub(1)
        .and_then(|index| SORT_ORDERS.get(index))
        .copied()
        .ok_or(Error::InvalidSortCode(code))
}

/// The kinds of entity the catalog returns.
///
/// Chapters are listed per manga through its feed rather than searched by text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Manga,
    Group,
    Author,
    Chapter,
}

impl EntityKind {
    /// The search endpoint for this kind, relative to the API base.
    pub fn endpoint(&self) -> &'static str {
        match self {
            EntityKind::Manga => "/manga",
            EntityKind::Group => "/group",
            EntityKind::Author => "/author",
            EntityKind::Chapter => "/chapter",
        }
    }

    /// The free-text query parameter for this kind.
    pub fn text_param(&self) -> &'static str {
        match self {
            EntityKind::Manga | EntityKind::Chapter => "title",
            EntityKind::Group | EntityKind::Author => "name",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Manga => "manga",
            EntityKind::Group => "group",
            EntityKind::Author => "author",
            EntityKind::Chapter => "chapter",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a vocabulary name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tag,
    Demographic,
}

impl Category {
    /// The "unknown name" error for this category.
    pub(crate) fn unknown(&self, name: impl Into<String>) -> Error {
        match self {
            Category::Tag => Error::UnknownTag(name.into()),
            Category::Demographic => Error::UnknownDemographic(name.into()),
        }
    }
}

/// A human-readable name and the stable identifier the service uses for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub name: String,
    pub id: String,
    pub category: Category,
}

impl VocabularyEntry {
    pub fn new(name: impl Into<String>, id: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            category,
        }
    }

    pub fn tag(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(name, id, Category::Tag)
    }

    pub fn demographic(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(name, id, Category::Demographic)
    }
}

/// One catalog entity flattened into a uniform shape.
///
/// Every result carries an `id`, its `kind`, and a display `title` (the manga
/// title, the group or author name, or a chapter label). Kind-specific data lives in
/// [`details`](NormalizedResult::details).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub id: String,
    pub kind: EntityKind,
    pub title: String,
    pub details: Details,
}

impl NormalizedResult {
    /// Full-size cover URL, for manga results that carry cover art.
    pub fn cover_url(&self) -> Option<&str> {
        match &self.details {
            Details::Manga(manga) => manga.cover.as_ref().map(|c| c.large_url.as_str()),
            _ => None,
        }
    }

    /// Social and contact links, for group and author results.
    pub fn social_links(&self) -> Option<&BTreeMap<String, String>> {
        match &self.details {
            Details::Group(group) => Some(&group.social_links),
            Details::Author(author) => Some(&author.social_links),
            Details::Manga(_) | Details::Chapter(_) => None,
        }
    }
}

/// Kind-specific attributes of a [`NormalizedResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Details {
    Manga(MangaDetails),
    Group(GroupDetails),
    Author(AuthorDetails),
    Chapter(ChapterDetails),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MangaDetails {
    #[serde(default)]
    pub alt_titles: Vec<String>,
    pub description: Option<String>,
    pub year: Option<u32>,
    pub status: Option<String>,
    pub content_rating: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// `None` when cover art was not requested or the title has none.
    pub cover: Option<Cover>,
}

/// Cover art URLs for a manga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cover {
    pub file_name: String,
    /// 256px thumbnail.
    pub small_url: String,
    pub large_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupDetails {
    #[serde(default)]
    pub alt_names: Vec<String>,
    pub description: Option<String>,
    pub leader: Option<String>,
    /// Only links present in the payload appear here.
    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorDetails {
    pub biography: Option<String>,
    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
}

/// One entry of a manga's chapter feed.
///
/// Chapter and volume numbers are kept as text (`"10.5"`, `"Extra"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChapterDetails {
    pub chapter: Option<String>,
    pub volume: Option<String>,
    /// Translated language code, e.g. `en`.
    pub language: Option<String>,
    /// Name of the scanlation group that released it.
    pub group: Option<String>,
    pub pages: Option<u32>,
    pub published_at: Option<String>,
}
