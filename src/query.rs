//! Translation of [`SearchRequest`]s into catalog query parameters.
//!
//! [`QueryBuilder::build`] validates a request, resolves tag and demographic
//! names through a [`Vocabulary`], and emits parameters in a fixed order:
//!
//! 1. free text (`title` for manga, `name` for groups and authors)
//! 2. `contentRating[]`
//! 3. `includedTags[]` and `includedTagsMode=AND`
//! 4. `excludedTags[]` and `excludedTagsMode=OR`
//! 5. `publicationDemographic[]` (one per demographic for `all`)
//! 6. `hasAvailableChapters`
//! 7. `includes[]`
//! 8. `order[<field>]`
//!
//! Paging parameters (`limit`, `offset`) are added later by the
//! [`Paginator`](crate::paginate::Paginator).

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::net::params::QueryParams;
use crate::types::{Category, ContentRating, EntityKind, SearchRequest, SortOrder, sort_order};
use crate::vocabulary::Vocabulary;

/// The parts of a request that can be checked without the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub ratings: Vec<ContentRating>,
    pub order: Option<SortOrder>,
    pub cap: usize,
}

/// Checks the sort code, content rating, and result cap of a request.
///
/// # Errors
///
/// * [`Error::InvalidSortCode`] - Sort code outside 1-13
/// * [`Error::InvalidContentRating`] - Rating outside the closed set
/// * [`Error::InvalidResultCap`] - A cap of zero
pub fn validate(request: &SearchRequest) -> Result<Validated> {
    let order = request.sort_by.map(sort_order).transpose()?;

    let ratings = match &request.content_rating {
        Some(value) => ContentRating::parse_filter(value)?,
        None => ContentRating::DEFAULT.to_vec(),
    };

    if request.max_results == 0 {
        return Err(Error::InvalidResultCap(request.max_results));
    }

    Ok(Validated {
        ratings,
        order,
        cap: request.max_results,
    })
}

/// Builds query parameters for one entity kind.
///
/// # Examples
///
/// ```rust
/// use shirabe::net::HttpClient;
/// use shirabe::query::QueryBuilder;
/// use shirabe::types::{EntityKind, SearchRequest, VocabularyEntry};
/// use shirabe::vocabulary::Vocabulary;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> shirabe::Result<()> {
/// let vocabulary = Vocabulary::preloaded(
///     Arc::new(HttpClient::new()),
///     vec![VocabularyEntry::tag("Action", "t1")],
/// );
///
/// let request = SearchRequest {
///     tags: vec!["action".to_string()],
///     ..SearchRequest::from("Naruto")
/// };
/// let params = QueryBuilder::new(&vocabulary).build(EntityKind::Manga, &request).await?;
///
/// assert_eq!(params.get("title"), Some("Naruto"));
/// assert_eq!(params.get_all("includedTags[]"), vec!["t1"]);
/// # Ok(())
/// # }
/// ```
pub struct QueryBuilder<'a> {
    vocabulary: &'a Vocabulary,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Validates `request` and renders it for `kind`.
    ///
    /// Sort codes and content ratings are validated for every kind, but only
    /// manga searches emit the manga filters (ratings, tags, demographic,
    /// chapter availability, sort order).
    ///
    /// # Errors
    ///
    /// * Everything [`validate`] reports, before any name is resolved
    /// * [`Error::UnknownTag`] / [`Error::UnknownDemographic`] - A name the
    ///   vocabulary does not know
    pub async fn build(&self, kind: EntityKind, request: &SearchRequest) -> Result<QueryParams> {
        let validated = validate(request)?;
        let mut params = QueryParams::new();

        if let Some(text) = request.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            params.push(kind.text_param(), text);
        }

        match kind {
            EntityKind::Manga => {
                for rating in &validated.ratings {
                    params.push("contentRating[]", rating.as_str());
                }

                let included = self.resolve_tags(&request.tags).await?;
                if !included.is_empty() {
                    for id in &included {
                        params.push("includedTags[]", id);
                    }
                    params.push("includedTagsMode", "AND");
                }

                let excluded = self.resolve_tags(&request.excluded_tags).await?;
                if !excluded.is_empty() {
                    for id in &excluded {
                        params.push("excludedTags[]", id);
                    }
                    params.push("excludedTagsMode", "OR");
                }

                if let Some(name) = &request.demographic {
                    for id in self.resolve_demographic(name).await? {
                        params.push("publicationDemographic[]", id);
                    }
                }

                if let Some(available) = request.has_available_chapters {
                    params.push("hasAvailableChapters", available);
                }

                if request.include_cover_art {
                    params.push("includes[]", "cover_art");
                }

                if let Some(order) = validated.order {
                    params.push(order.param_key(), order.direction.as_str());
                }
            }
            EntityKind::Group => {
                params.push("includes[]", "leader");
            }
            EntityKind::Author | EntityKind::Chapter => {}
        }

        Ok(params)
    }

    /// `all` selects every demographic; any other name resolves to one id.
    async fn resolve_demographic(&self, name: &str) -> Result<Vec<String>> {
        if name.trim().eq_ignore_ascii_case("all") {
            return self.vocabulary.ids(Category::Demographic).await;
        }

        let id = self.vocabulary.resolve(name, Category::Demographic).await?;
        Ok(vec![id])
    }

    /// Resolves tag names in order, dropping repeated identifiers.
    async fn resolve_tags(&self, names: &[String]) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(names.len());

        for name in names {
            let id = self.vocabulary.resolve(name, Category::Tag).await?;
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }

        Ok(ids)
    }
}
