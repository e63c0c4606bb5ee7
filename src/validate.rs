//! Post-build validation of emitted artifacts.
//!
//! Re-reads the feed and every book manifest from disk and re-validates
//! them against the same schemas used at write time — catching emitter
//! bugs and hand-edited output alike — then checks the cross-file
//! consistency the schemas cannot see (chapter files actually existing
//! under the book's output directory).
//!
//! Findings use the same two severities as the build:
//!
//! - **errors** — structural corruption: unparsable artifacts, missing
//!   primary-locale titles, missing `manifestUrl`/`homeUrl`, manifest
//!   chapter files absent from disk. The process exits non-zero.
//! - **warnings** — catalog polish: missing difficulty, empty category
//!   sets, zero-chapter books, dangling featured IDs, unused categories.
//!   Reported, never blocking.
//!
//! Unlike the loaders, nothing here aborts early: the validator walks
//! everything and reports the full list, because it runs against output
//! that already shipped or is about to.

use crate::schema::{BookManifest, Feed, FeedItem};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Aggregate result of a validation run.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Validate the emitted tree under `public_dir`.
pub fn validate(public_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_feed(public_dir, &mut report);
    validate_manifests(public_dir, &mut report);
    report
}

// ============================================================================
// Feed
// ============================================================================

fn validate_feed(public_dir: &Path, report: &mut ValidationReport) {
    let feed_path = public_dir.join("discover").join("feed.json");
    if !feed_path.is_file() {
        report.error("feed.json not found - run build first");
        return;
    }

    let feed: Feed = match read_json(&feed_path) {
        Ok(feed) => feed,
        Err(message) => {
            report.error(format!("feed schema validation failed: {message}"));
            return;
        }
    };

    for item in &feed.items {
        let id = item.id();

        if item.title().primary().is_none() {
            report.error(format!("item {id}: missing primary-locale title"));
        }
        if item.difficulty().trim().is_empty() {
            report.warn(format!("item {id}: missing difficulty"));
        }
        if item.categories().is_empty() {
            report.warn(format!("item {id}: no categories assigned"));
        }

        match item {
            FeedItem::Book(book) => {
                if book.manifest_url.as_deref().unwrap_or("").trim().is_empty() {
                    report.error(format!("book {id}: missing manifestUrl"));
                }
                if book.chapters_count.unwrap_or(0) == 0 {
                    report.warn(format!("book {id}: no chapters found"));
                }
            }
            FeedItem::Pagebook(pagebook) => {
                if pagebook.home_url.trim().is_empty() {
                    report.error(format!("pagebook {id}: missing homeUrl"));
                }
            }
            FeedItem::Article(_) => {}
        }
    }

    let item_ids: BTreeSet<&str> = feed.items.iter().map(FeedItem::id).collect();
    for featured_id in &feed.featured {
        if !item_ids.contains(featured_id.as_str()) {
            report.warn(format!("featured item not found: {featured_id}"));
        }
    }

    let used: BTreeSet<&str> = feed
        .items
        .iter()
        .flat_map(|i| i.categories().iter().map(String::as_str))
        .collect();
    for category in &feed.categories {
        if !used.contains(category.id.as_str()) {
            report.warn(format!("category not used: {}", category.id));
        }
    }
}

// ============================================================================
// Book manifests
// ============================================================================

fn validate_manifests(public_dir: &Path, report: &mut ValidationReport) {
    let books_dir = public_dir.join("books");
    if !books_dir.is_dir() {
        return;
    }

    let mut book_dirs: Vec<_> = match fs::read_dir(&books_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect(),
        Err(err) => {
            report.error(format!("cannot list {}: {err}", books_dir.display()));
            return;
        }
    };
    book_dirs.sort();

    for book_dir in &book_dirs {
        let book_id = book_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let manifest_path = book_dir.join("_index.json");
        if !manifest_path.is_file() {
            report.error(format!("book {book_id}: missing _index.json"));
            continue;
        }

        let manifest: BookManifest = match read_json(&manifest_path) {
            Ok(manifest) => manifest,
            Err(message) => {
                report.error(format!("book {book_id}: manifest invalid: {message}"));
                continue;
            }
        };

        if manifest.chapters.is_empty() {
            report.warn(format!("book {book_id}: no chapters"));
        }

        for chapter in &manifest.chapters {
            if !book_dir.join(&chapter.file).is_file() {
                report.error(format!(
                    "book {book_id}: chapter file not found: {}",
                    chapter.file
                ));
            }
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}
