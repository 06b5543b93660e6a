//! Flattening of catalog records into [`NormalizedResult`]s.
//!
//! Each entity kind has its own normalizing function. Only the fields needed to
//! identify a record are required: its `id`, plus the title or name for manga,
//! groups and authors. Every other field is read leniently. A value that is
//! missing, `null`, or of an unexpected type leaves the corresponding attribute
//! empty instead of failing the record.
//!
//! When normalizing whole pages, malformed records are skipped and logged so
//! the rest of the page still reaches the caller.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::net::json;
use crate::types::{
    AuthorDetails, ChapterDetails, Cover, Details, EntityKind, GroupDetails, MangaDetails,
    NormalizedResult,
};

/// Link fields reported on group records.
pub const GROUP_LINK_FIELDS: [&str; 7] = [
    "website",
    "ircServer",
    "ircChannel",
    "discord",
    "contactEmail",
    "twitter",
    "mangaUpdates",
];

/// Link fields reported on author records.
pub const AUTHOR_LINK_FIELDS: [&str; 14] = [
    "twitter",
    "pixiv",
    "melonBook",
    "fanBox",
    "booth",
    "namicomi",
    "nicoVideo",
    "skeb",
    "fantia",
    "tumblr",
    "youtube",
    "weibo",
    "naver",
    "website",
];

/// Language preference when picking one text out of a localized map.
const LANGUAGE_PRIORITY: [&str; 4] = ["en", "en-us", "ja", "ja-ro"];

/// One raw record, tagged with the kind it was fetched as.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEntity {
    Manga(Value),
    Group(Value),
    Author(Value),
    Chapter(Value),
}

impl RawEntity {
    pub fn new(kind: EntityKind, payload: Value) -> Self {
        match kind {
            EntityKind::Manga => RawEntity::Manga(payload),
            EntityKind::Group => RawEntity::Group(payload),
            EntityKind::Author => RawEntity::Author(payload),
            EntityKind::Chapter => RawEntity::Chapter(payload),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            RawEntity::Manga(_) => EntityKind::Manga,
            RawEntity::Group(_) => EntityKind::Group,
            RawEntity::Author(_) => EntityKind::Author,
            RawEntity::Chapter(_) => EntityKind::Chapter,
        }
    }
}

/// Settings that influence normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Attach cover URLs to manga results.
    pub include_cover_art: bool,
    /// Root for cover URLs, without a trailing slash.
    pub cover_base: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            include_cover_art: true,
            cover_base: "https://uploads.mangadex.org/covers".to_string(),
        }
    }
}

/// Normalizes one record.
///
/// # Errors
///
/// * [`Error::MalformedPayload`] - The record has no `id` or no title/name
///   (`field` names which), or is not a JSON object (`field` is `"record"`)
///
/// # Examples
///
/// ```rust
/// use shirabe::normalize::{normalize, NormalizeOptions, RawEntity};
/// use serde_json::json;
///
/// let raw = RawEntity::Author(json!({
///     "id": "a1",
///     "attributes": {"name": "Oda Eiichiro", "twitter": "https://twitter.com/oda", "pixiv": null}
/// }));
///
/// let author = normalize(raw, &NormalizeOptions::default()).unwrap();
/// assert_eq!(author.title, "Oda Eiichiro");
/// assert_eq!(author.social_links().unwrap().len(), 1);
/// ```
pub fn normalize(raw: RawEntity, options: &NormalizeOptions) -> Result<NormalizedResult> {
    match raw {
        RawEntity::Manga(payload) => normalize_manga(payload, options),
        RawEntity::Group(payload) => normalize_group(payload),
        RawEntity::Author(payload) => normalize_author(payload),
        RawEntity::Chapter(payload) => normalize_chapter(payload),
    }
}

/// Normalizes a page of records of one kind, skipping malformed ones.
///
/// Output order matches input order.
pub fn normalize_page(
    kind: EntityKind,
    records: Vec<Value>,
    options: &NormalizeOptions,
) -> Vec<NormalizedResult> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(position, payload)| {
            match normalize(RawEntity::new(kind, payload), options) {
                Ok(result) => Some(result),
                Err(error) => {
                    tracing::warn!(%kind, position, %error, "skipping malformed record");
                    None
                }
            }
        })
        .collect()
}

// -- field access --

/// Checks the record shape and reads its `id`. Returns the id and the
/// `attributes` object (`Null` when absent).
fn identity(payload: &Value, kind: EntityKind) -> Result<(String, &Value)> {
    if !payload.is_object() {
        return Err(Error::malformed(kind, "record"));
    }

    let id = json::extract_str(payload, "id").ok_or_else(|| Error::malformed(kind, "id"))?;
    let attributes = payload.get("attributes").unwrap_or(&Value::Null);
    Ok((id, attributes))
}

fn required(value: Option<String>, kind: EntityKind, field: &'static str) -> Result<String> {
    value.ok_or_else(|| Error::malformed(kind, field))
}

/// A non-empty string at `path`. Other types count as absent.
fn text(value: &Value, path: &str) -> Option<String> {
    json::extract_path(value, path)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts a `{lang: text}` object. Anything else (the service sends `[]` for
/// empty maps) becomes an empty map; non-string texts are dropped.
fn localized_map(value: &Value) -> HashMap<String, String> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(lang, text)| Some((lang.clone(), text.as_str()?.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// The preferred text of the localized map at `path`.
fn localized(value: &Value, path: &str) -> Option<String> {
    json::extract_path(value, path)
        .map(localized_map)
        .and_then(|texts| best_text(&texts))
}

/// The preferred text of every localized map in the array at `path`.
fn localized_list(value: &Value, path: &str) -> Vec<String> {
    json::extract_array(value, path)
        .iter()
        .filter_map(|item| best_text(&localized_map(item)))
        .collect()
}

/// Picks the preferred language, falling back to any non-empty text.
fn best_text(texts: &HashMap<String, String>) -> Option<String> {
    LANGUAGE_PRIORITY
        .iter()
        .filter_map(|lang| texts.get(*lang))
        .chain(texts.values())
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// A non-negative integer, also accepted as numeric text.
fn number(value: &Value, path: &str) -> Option<u32> {
    match json::extract_path(value, path)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Collects the listed link fields that carry a usable value.
fn links(attributes: &Value, fields: &[&str]) -> BTreeMap<String, String> {
    fields
        .iter()
        .filter_map(|field| {
            let value = text(attributes, field)?;
            (value != "None").then(|| (field.to_string(), value))
        })
        .collect()
}

fn relationship<'a>(payload: &'a Value, kind: &str) -> Option<&'a Value> {
    json::extract_array(payload, "relationships")
        .iter()
        .find(|rel| text(rel, "type").as_deref() == Some(kind))
}

// -- normalizers --

/// Normalizes a manga record.
pub fn normalize_manga(payload: Value, options: &NormalizeOptions) -> Result<NormalizedResult> {
    let kind = EntityKind::Manga;
    let (id, attributes) = identity(&payload, kind)?;
    let title = required(localized(attributes, "title"), kind, "title")?;

    let cover = if options.include_cover_art {
        relationship(&payload, "cover_art")
            .and_then(|rel| text(rel, "attributes.fileName"))
            .map(|file_name| {
                let base = options.cover_base.trim_end_matches('/');
                let large_url = format!("{}/{}/{}", base, id, file_name);
                Cover {
                    small_url: format!("{}.256.jpg", large_url),
                    large_url,
                    file_name,
                }
            })
    } else {
        None
    };

    let tags = json::extract_array(attributes, "tags")
        .iter()
        .filter_map(|tag| localized(tag, "attributes.name"))
        .collect();

    Ok(NormalizedResult {
        id,
        kind,
        title,
        details: Details::Manga(MangaDetails {
            alt_titles: localized_list(attributes, "altTitles"),
            description: localized(attributes, "description"),
            year: number(attributes, "year"),
            status: text(attributes, "status"),
            content_rating: text(attributes, "contentRating"),
            tags,
            cover,
        }),
    })
}

/// Normalizes a scanlation group record.
pub fn normalize_group(payload: Value) -> Result<NormalizedResult> {
    let kind = EntityKind::Group;
    let (id, attributes) = identity(&payload, kind)?;
    let title = required(text(attributes, "name"), kind, "name")?;

    Ok(NormalizedResult {
        id,
        kind,
        title,
        details: Details::Group(GroupDetails {
            alt_names: localized_list(attributes, "altNames"),
            description: text(attributes, "description"),
            leader: relationship(&payload, "leader")
                .and_then(|rel| text(rel, "attributes.username")),
            social_links: links(attributes, &GROUP_LINK_FIELDS),
        }),
    })
}

/// Normalizes an author record.
pub fn normalize_author(payload: Value) -> Result<NormalizedResult> {
    let kind = EntityKind::Author;
    let (id, attributes) = identity(&payload, kind)?;
    let title = required(text(attributes, "name"), kind, "name")?;

    Ok(NormalizedResult {
        id,
        kind,
        title,
        details: Details::Author(AuthorDetails {
            biography: localized(attributes, "biography"),
            social_links: links(attributes, &AUTHOR_LINK_FIELDS),
        }),
    })
}

/// Normalizes a chapter feed entry.
///
/// Chapters often have no title of their own; the result title then falls
/// back to `Chapter <number>`, or `Oneshot` for unnumbered chapters.
pub fn normalize_chapter(payload: Value) -> Result<NormalizedResult> {
    let kind = EntityKind::Chapter;
    let (id, attributes) = identity(&payload, kind)?;

    let chapter = json::extract_str(attributes, "chapter");
    let title = text(attributes, "title")
        .or_else(|| chapter.as_ref().map(|n| format!("Chapter {}", n)))
        .unwrap_or_else(|| "Oneshot".to_string());

    Ok(NormalizedResult {
        id,
        kind,
        title,
        details: Details::Chapter(ChapterDetails {
            chapter,
            volume: json::extract_str(attributes, "volume"),
            language: text(attributes, "translatedLanguage"),
            group: relationship(&payload, "scanlation_group")
                .and_then(|rel| text(rel, "attributes.name")),
            pages: number(attributes, "pages"),
            published_at: text(attributes, "publishAt"),
        }),
    })
}
