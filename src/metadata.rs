//! Metadata resolution priorities for chapters and covers.
//!
//! Chapter titles and book covers can each come from several independent
//! sources. This module owns the priority orders so the scanner stays a
//! plain directory walk.
//!
//! ## Chapter title
//!
//! First available source wins:
//!
//! 1. Sidecar YAML with the same stem (`chapters/01.yaml` next to
//!    `chapters/01.md`), `title:` field.
//! 2. Front matter `title` in the markdown itself. A bare string is
//!    shorthand for the primary-locale value.
//! 3. Synthesized fallback `"Chapter {id}"`.
//!
//! The sidecar wins over front matter for the same reason sidecar
//! descriptions win in most pipelines: the author created a separate
//! file on purpose.
//!
//! ## Cover image
//!
//! A book's cover is `cover.{ext}` in the book directory, tried in a
//! fixed extension order. The first match wins; the order is part of the
//! contract, not a filesystem accident.

use crate::schema::LocalizedString;
use serde_yaml::Value;
use std::path::Path;

/// Cover extension priority. First existing file wins.
pub const COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Resolve a chapter title from its sources, in priority order.
///
/// `sidecar` is the parsed `{stem}.yaml` (if the file exists),
/// `front_matter` the chapter's parsed front matter block (if any).
/// Only the `title` key of either document is meaningful here.
pub fn resolve_chapter_title(
    sidecar: Option<&Value>,
    front_matter: Option<&Value>,
    chapter_id: &str,
) -> LocalizedString {
    for source in [sidecar, front_matter] {
        if let Some(meta) = source
            && let Some(title) = meta.get("title")
            && let Some(resolved) = coerce_title(title)
        {
            return resolved;
        }
    }

    LocalizedString::primary_only(format!("Chapter {chapter_id}"))
}

/// A front matter `title` is either a locale map or a bare string (the
/// primary-locale shorthand).
fn coerce_title(value: &Value) -> Option<LocalizedString> {
    match value {
        Value::String(s) => Some(LocalizedString::primary_only(s.clone())),
        Value::Mapping(_) => serde_yaml::from_value(value.clone()).ok(),
        _ => None,
    }
}

/// Find a book's cover file, trying [`COVER_EXTENSIONS`] in order.
///
/// Returns the cover filename (`cover.jpg`), not a full path — callers
/// build source and destination paths from it.
pub fn find_cover(book_dir: &Path) -> Option<String> {
    COVER_EXTENSIONS.iter().find_map(|ext| {
        let name = format!("cover.{ext}");
        book_dir.join(&name).is_file().then_some(name)
    })
}

/// Read and parse a chapter's sidecar YAML, if present.
///
/// A sidecar that exists but fails to parse is an authoring error and
/// surfaces as `Some(Err)` so the scanner can fail the build with the
/// offending path.
pub fn read_sidecar(md_path: &Path) -> Option<Result<Value, serde_yaml::Error>> {
    let sidecar = md_path.with_extension("yaml");
    let text = std::fs::read_to_string(&sidecar).ok()?;
    Some(serde_yaml::from_str(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    // =========================================================================
    // resolve_chapter_title
    // =========================================================================

    #[test]
    fn sidecar_wins_over_front_matter() {
        let sidecar = yaml("title:\n  zh: 来自边车");
        let fm = yaml("title:\n  zh: 来自正文");
        let title = resolve_chapter_title(Some(&sidecar), Some(&fm), "01");
        assert_eq!(title.primary(), Some("来自边车"));
    }

    #[test]
    fn front_matter_used_when_no_sidecar() {
        let fm = yaml("title:\n  zh: 第一章\n  en: Chapter One");
        let title = resolve_chapter_title(None, Some(&fm), "01");
        assert_eq!(title.primary(), Some("第一章"));
        assert_eq!(title.0.get("en").map(String::as_str), Some("Chapter One"));
    }

    #[test]
    fn bare_string_title_is_primary_locale() {
        let fm = yaml("title: 序章");
        let title = resolve_chapter_title(None, Some(&fm), "00");
        assert_eq!(title.primary(), Some("序章"));
    }

    #[test]
    fn fallback_synthesizes_chapter_id() {
        let title = resolve_chapter_title(None, None, "03");
        assert_eq!(title.primary(), Some("Chapter 03"));
    }

    #[test]
    fn front_matter_without_title_falls_through() {
        let fm = yaml("id: ch-1\nwordCount: 100");
        let title = resolve_chapter_title(None, Some(&fm), "01");
        assert_eq!(title.primary(), Some("Chapter 01"));
    }

    #[test]
    fn sidecar_without_title_falls_through_to_front_matter() {
        let sidecar = yaml("notes: internal");
        let fm = yaml("title: 正文标题");
        let title = resolve_chapter_title(Some(&sidecar), Some(&fm), "01");
        assert_eq!(title.primary(), Some("正文标题"));
    }

    #[test]
    fn non_string_non_map_title_falls_through() {
        let fm = yaml("title: 42");
        let title = resolve_chapter_title(None, Some(&fm), "07");
        assert_eq!(title.primary(), Some("Chapter 07"));
    }

    // =========================================================================
    // find_cover
    // =========================================================================

    #[test]
    fn cover_extension_priority_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cover.png"), b"png").unwrap();
        fs::write(dir.path().join("cover.jpg"), b"jpg").unwrap();
        // jpg comes before png in the priority order
        assert_eq!(find_cover(dir.path()).as_deref(), Some("cover.jpg"));
    }

    #[test]
    fn cover_webp_found_last() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cover.webp"), b"webp").unwrap();
        assert_eq!(find_cover(dir.path()).as_deref(), Some("cover.webp"));
    }

    #[test]
    fn no_cover_returns_none() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("banner.jpg"), b"x").unwrap();
        assert_eq!(find_cover(dir.path()), None);
    }

    // =========================================================================
    // read_sidecar
    // =========================================================================

    #[test]
    fn reads_sidecar_next_to_markdown() {
        let dir = TempDir::new().unwrap();
        let md = dir.path().join("01.md");
        fs::write(&md, "正文").unwrap();
        fs::write(dir.path().join("01.yaml"), "title:\n  zh: 第一章").unwrap();

        let value = read_sidecar(&md).unwrap().unwrap();
        assert_eq!(value["title"]["zh"], Value::from("第一章"));
    }

    #[test]
    fn missing_sidecar_is_none() {
        let dir = TempDir::new().unwrap();
        let md = dir.path().join("01.md");
        fs::write(&md, "正文").unwrap();
        assert!(read_sidecar(&md).is_none());
    }

    #[test]
    fn broken_sidecar_is_some_err() {
        let dir = TempDir::new().unwrap();
        let md = dir.path().join("01.md");
        fs::write(&md, "正文").unwrap();
        fs::write(dir.path().join("01.yaml"), ": [broken").unwrap();
        assert!(read_sidecar(&md).unwrap().is_err());
    }
}
