//! Shared record types for content metadata and emitted artifacts.
//!
//! These types are the trust boundary of the pipeline: raw YAML and front
//! matter are deserialized into them (a typed parse — a missing or
//! mistyped field fails with a field-level serde error), then
//! [`validate`](Validate::validate) applies the semantic rules serde
//! cannot express (non-empty primary-locale titles, non-empty IDs,
//! duplicate chapter IDs). Everything downstream of a successful parse +
//! validate may assume well-formed records.
//!
//! The same types are serialized back out as the feed and book manifests,
//! so wire names (camelCase, `type` discriminant) live here and nowhere
//! else. Field declaration order is emission order — the feed is written
//! with `serde_json::to_string_pretty`, and stable field order is what
//! makes re-runs byte-identical.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Locale code of the mandatory primary locale.
pub const PRIMARY_LOCALE: &str = "zh";

/// User-facing text keyed by locale code.
///
/// The primary locale is mandatory; everything else is optional. Display
/// fallback order is `zh` → `en` → the owning record's identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedString(pub BTreeMap<String, String>);

impl LocalizedString {
    /// Build a localized string carrying only the primary locale.
    pub fn primary_only(text: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(PRIMARY_LOCALE.to_string(), text.into());
        LocalizedString(map)
    }

    /// The primary-locale text, if present and non-empty.
    pub fn primary(&self) -> Option<&str> {
        self.0
            .get(PRIMARY_LOCALE)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Display text: `zh` → `en` → `fallback`.
    pub fn display<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.primary()
            .or_else(|| self.0.get("en").map(String::as_str))
            .unwrap_or(fallback)
    }

    fn check(&self, field: &str, violations: &mut Vec<String>) {
        if self.primary().is_none() {
            violations.push(format!("{field}: missing or empty '{PRIMARY_LOCALE}' text"));
        }
    }
}

/// Publication status of a book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Complete,
    #[default]
    Ongoing,
    Hiatus,
}

/// A catalog category, defined once in configuration and referenced by ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: LocalizedString,
    pub icon: String,
    pub order: i64,
}

/// One chapter of a book, as emitted in the book manifest.
///
/// `file` is relative to the book's output directory. The scanner records
/// the markdown source path here; the emitter rewrites it to the rendered
/// `.html` path. A chapter left unrendered (missing source) keeps its
/// `.md` reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub title: LocalizedString,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
}

/// Book metadata as authored in `content/books/{id}/_index.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMeta {
    pub id: String,
    pub title: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    pub difficulty: String,
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
    /// Authored chapter list. Normally absent — chapters are discovered
    /// from the `chapters/` directory — but honored as a degraded
    /// fallback when that directory is empty or missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<Vec<Chapter>>,
    /// `YYYY-MM-DD`; dated items sort before dateless ones, newest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Pagebook metadata as authored in `content/pagebooks/{id}.yaml`.
///
/// A pagebook is a pointer to an externally hosted interactive resource —
/// no chapters, no body, nothing to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBook {
    pub id: String,
    pub title: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub home_url: String,
    pub difficulty: String,
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Article metadata as authored in front matter of
/// `content/articles/{id}.md`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMeta {
    pub id: String,
    pub title: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    /// Explicit cover reference. When absent the first image in the body
    /// is promoted to cover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub difficulty: String,
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

// ============================================================================
// Feed item variants
// ============================================================================

/// A book as it appears in the discovery feed: metadata plus derived
/// URLs, with the chapter sequence replaced by `manifest_url` +
/// `chapters_count` (the manifest is the chapter source of truth).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookItem {
    pub id: String,
    pub title: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    pub difficulty: String,
    pub categories: Vec<String>,
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters_count: Option<u64>,
}

/// An article as it appears in the discovery feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleItem {
    pub id: String,
    pub title: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    pub difficulty: String,
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// One entry in the feed's `items` collection.
///
/// The `type` discriminant is the wire contract; every place an item is
/// turned into feed or manifest form matches exhaustively on this enum,
/// so adding a variant is a compile error until every site handles it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedItem {
    Book(BookItem),
    Pagebook(PageBook),
    Article(ArticleItem),
}

impl FeedItem {
    pub fn id(&self) -> &str {
        match self {
            FeedItem::Book(b) => &b.id,
            FeedItem::Pagebook(p) => &p.id,
            FeedItem::Article(a) => &a.id,
        }
    }

    pub fn title(&self) -> &LocalizedString {
        match self {
            FeedItem::Book(b) => &b.title,
            FeedItem::Pagebook(p) => &p.title,
            FeedItem::Article(a) => &a.title,
        }
    }

    pub fn difficulty(&self) -> &str {
        match self {
            FeedItem::Book(b) => &b.difficulty,
            FeedItem::Pagebook(p) => &p.difficulty,
            FeedItem::Article(a) => &a.difficulty,
        }
    }

    pub fn categories(&self) -> &[String] {
        match self {
            FeedItem::Book(b) => &b.categories,
            FeedItem::Pagebook(p) => &p.categories,
            FeedItem::Article(a) => &a.categories,
        }
    }

    pub fn created_at(&self) -> Option<&str> {
        match self {
            FeedItem::Book(b) => b.created_at.as_deref(),
            FeedItem::Pagebook(p) => p.created_at.as_deref(),
            FeedItem::Article(a) => a.created_at.as_deref(),
        }
    }

    /// Human-readable kind for messages, matching the wire discriminant.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedItem::Book(_) => "book",
            FeedItem::Pagebook(_) => "pagebook",
            FeedItem::Article(_) => "article",
        }
    }
}

// ============================================================================
// Emitted artifacts
// ============================================================================

/// The root discovery document (`public/discover/feed.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub version: String,
    /// Build wall-clock time — the only non-deterministic field.
    pub last_updated: String,
    pub default_locale: String,
    pub supported_locales: Vec<String>,
    pub categories: Vec<Category>,
    pub featured: Vec<String>,
    pub items: Vec<FeedItem>,
}

/// Per-book artifact (`public/books/{id}/_index.json`): the resolved
/// chapter sequence plus a subset of the book's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookManifest {
    pub id: String,
    pub title: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub difficulty: String,
    pub total_chapters: u64,
    pub status: ContentStatus,
    pub chapters: Vec<Chapter>,
}

// ============================================================================
// Semantic validation
// ============================================================================

/// Semantic rules a record must satisfy after a successful typed parse.
///
/// Returns every violation rather than the first, so an author fixing a
/// file sees the whole list at once.
pub trait Validate {
    fn validate(&self) -> Vec<String>;
}

fn check_id(id: &str, violations: &mut Vec<String>) {
    if id.trim().is_empty() {
        violations.push("id: must not be empty".to_string());
    }
}

impl Validate for Category {
    fn validate(&self) -> Vec<String> {
        let mut v = Vec::new();
        check_id(&self.id, &mut v);
        self.name.check("name", &mut v);
        v
    }
}

impl Validate for BookMeta {
    fn validate(&self) -> Vec<String> {
        let mut v = Vec::new();
        check_id(&self.id, &mut v);
        self.title.check("title", &mut v);
        if let Some(chapters) = &self.chapters {
            let mut seen = std::collections::BTreeSet::new();
            for ch in chapters {
                if !seen.insert(ch.id.as_str()) {
                    v.push(format!("chapters: duplicate chapter id '{}'", ch.id));
                }
            }
        }
        v
    }
}

impl Validate for PageBook {
    fn validate(&self) -> Vec<String> {
        let mut v = Vec::new();
        check_id(&self.id, &mut v);
        self.title.check("title", &mut v);
        if self.home_url.trim().is_empty() {
            v.push("homeUrl: must not be empty".to_string());
        }
        v
    }
}

impl Validate for ArticleMeta {
    fn validate(&self) -> Vec<String> {
        let mut v = Vec::new();
        check_id(&self.id, &mut v);
        self.title.check("title", &mut v);
        v
    }
}
