//! Feed and site emission.
//!
//! Stage 2 of the bookfeed pipeline. Takes the scan [`Manifest`] and
//! writes every published artifact:
//!
//! ```text
//! public/
//! ├── discover/
//! │   └── feed.json                # the discovery feed
//! ├── books/
//! │   └── three-body/
//! │       ├── _index.json          # book manifest
//! │       └── chapters/
//! │           ├── 01.html          # rendered chapters
//! │           └── 02.html
//! ├── articles/
//! │   └── why-read.html            # rendered articles
//! ├── images/
//! │   ├── books/three-body/        # cover + per-book images, centralized
//! │   └── articles/                # shared article image pool
//! └── admin/                       # CMS admin UI, copied verbatim
//! ```
//!
//! The output directory is cleaned and rebuilt from scratch on every run:
//! there is no incremental state, so the emitted tree is a pure function
//! of the content tree and configuration. `lastUpdated` (build wall-clock
//! time) is the single non-deterministic byte in the output.
//!
//! Chapter rendering is CPU work on disjoint data, so it runs through
//! rayon; all writes stay on the calling thread in deterministic order.

use crate::render;
use crate::scan::{self, LoadedArticle, LoadedBook, Manifest, ScanError};
use crate::schema::{ArticleItem, BookItem, BookManifest, Feed, FeedItem};
use chrono::{SecondsFormat, Utc};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source directories the build reads from.
pub struct BuildInputs<'a> {
    pub content_dir: &'a Path,
    /// Static asset root; its `images/` subtree is copied verbatim.
    pub assets_dir: &'a Path,
    /// CMS admin UI tree, copied verbatim. Optional like `assets_dir`.
    pub admin_dir: &'a Path,
}

/// Per-book outcome for CLI reporting.
#[derive(Debug)]
pub struct BookSummary {
    pub id: String,
    pub chapters: usize,
    pub rendered: usize,
}

/// What the build produced, for [`crate::output`] to format.
#[derive(Debug)]
pub struct BuildReport {
    pub books: Vec<BookSummary>,
    pub pagebooks: usize,
    pub articles: usize,
    pub items: usize,
    pub warnings: Vec<String>,
}

/// Run the full build: scan, render, emit.
pub fn build(inputs: &BuildInputs, output_dir: &Path) -> Result<BuildReport, BuildError> {
    let manifest = scan::scan(inputs.content_dir)?;
    emit(&manifest, inputs, output_dir)
}

/// Emit all artifacts from an already-scanned manifest.
pub fn emit(
    manifest: &Manifest,
    inputs: &BuildInputs,
    output_dir: &Path,
) -> Result<BuildReport, BuildError> {
    clean_dir(output_dir)?;

    let base_path = manifest.config.settings.base_path.trim_end_matches('/');

    let mut items: Vec<FeedItem> = Vec::new();
    let mut book_summaries = Vec::new();

    for book in &manifest.books {
        let (item, summary) = emit_book(book, base_path, output_dir)?;
        items.push(FeedItem::Book(item));
        book_summaries.push(summary);
    }

    for pagebook in &manifest.pagebooks {
        items.push(FeedItem::Pagebook(pagebook.clone()));
    }

    for article in &manifest.articles {
        items.push(FeedItem::Article(emit_article(
            article, base_path, output_dir,
        )?));
    }

    // Shared article image pool → centralized location
    copy_tree(
        &inputs.content_dir.join("articles").join("images"),
        &output_dir.join("images").join("articles"),
    )?;

    sort_items(&mut items);

    let feed = Feed {
        version: manifest.config.settings.version.clone(),
        last_updated: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        default_locale: manifest.config.settings.default_locale.clone(),
        supported_locales: manifest.config.settings.supported_locales.clone(),
        categories: manifest.config.categories.clone(),
        featured: manifest.config.featured.clone(),
        items,
    };
    let item_count = feed.items.len();
    write_json(&output_dir.join("discover").join("feed.json"), &feed)?;

    // Static assets and admin UI, verbatim
    copy_tree(
        &inputs.assets_dir.join("images"),
        &output_dir.join("images"),
    )?;
    copy_tree(inputs.admin_dir, &output_dir.join("admin"))?;

    Ok(BuildReport {
        books: book_summaries,
        pagebooks: manifest.pagebooks.len(),
        articles: manifest.articles.len(),
        items: item_count,
        warnings: manifest.warnings.clone(),
    })
}

// ============================================================================
// Books
// ============================================================================

fn emit_book(
    book: &LoadedBook,
    base_path: &str,
    output_dir: &Path,
) -> Result<(BookItem, BookSummary), BuildError> {
    let meta = &book.meta;
    let book_out = output_dir.join("books").join(&meta.id);
    fs::create_dir_all(&book_out)?;

    let image_base = format!("{base_path}/images/books/{}", meta.id);
    let book_title = meta.title.display(&meta.id).to_string();

    // Render every chapter that has a source (CPU-bound, disjoint data)
    let rendered: Vec<Option<String>> = book
        .chapters
        .par_iter()
        .map(|loaded| {
            loaded.body.as_deref().map(|body| {
                let chapter_title = loaded.chapter.title.display(&loaded.chapter.id);
                let title = format!("{book_title} - {chapter_title}");
                render::render_document(body, &title, Some(&image_base))
            })
        })
        .collect();

    let mut chapters = Vec::with_capacity(book.chapters.len());
    let mut rendered_count = 0;
    for (loaded, html) in book.chapters.iter().zip(rendered) {
        let mut chapter = loaded.chapter.clone();
        if let Some(html) = html {
            // chapters/01.md → chapters/01.html
            let dest = format!("chapters/{}.html", loaded.chapter.id);
            let dest_path = book_out.join(&dest);
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest_path, html)?;
            chapter.file = dest;
            rendered_count += 1;
        }
        chapters.push(chapter);
    }

    // Centralize cover and per-book images
    let images_out = output_dir.join("images").join("books").join(&meta.id);
    let image_url = match &book.cover {
        Some(cover) => {
            fs::create_dir_all(&images_out)?;
            fs::copy(book.dir.join(cover), images_out.join(cover))?;
            Some(format!("{image_base}/{cover}"))
        }
        None => None,
    };
    copy_tree(&book.dir.join("images"), &images_out)?;

    let status = meta.status.unwrap_or_default();
    let total = chapters.len();

    let book_manifest = BookManifest {
        id: meta.id.clone(),
        title: meta.title.clone(),
        subtitle: meta.subtitle.clone(),
        author: meta.author.clone(),
        description: meta.description.clone(),
        cover_url: image_url.clone(),
        difficulty: meta.difficulty.clone(),
        total_chapters: total as u64,
        status,
        chapters,
    };
    write_json(&book_out.join("_index.json"), &book_manifest)?;

    let item = BookItem {
        id: meta.id.clone(),
        title: meta.title.clone(),
        subtitle: meta.subtitle.clone(),
        author: meta.author.clone(),
        description: meta.description.clone(),
        difficulty: meta.difficulty.clone(),
        categories: meta.categories.clone(),
        status,
        created_at: meta.created_at.clone(),
        image_url,
        manifest_url: Some(format!("books/{}/_index.json", meta.id)),
        chapters_count: Some(total as u64),
    };

    Ok((
        item,
        BookSummary {
            id: meta.id.clone(),
            chapters: total,
            rendered: rendered_count,
        },
    ))
}

// ============================================================================
// Articles
// ============================================================================

fn emit_article(
    article: &LoadedArticle,
    base_path: &str,
    output_dir: &Path,
) -> Result<ArticleItem, BuildError> {
    let meta = &article.meta;
    let image_base = format!("{base_path}/images/articles");

    let title = meta.title.display(&meta.id);
    let html = render::render_document(&article.body, title, Some(&image_base));

    let articles_out = output_dir.join("articles");
    fs::create_dir_all(&articles_out)?;
    fs::write(articles_out.join(format!("{}.html", meta.id)), html)?;

    // Explicit cover wins; otherwise the first body image is promoted
    let cover = meta
        .cover_image
        .clone()
        .or_else(|| render::first_image(&article.body));
    let image_url = cover.map(|dest| render::rewrite_image_url(&dest, &image_base));

    Ok(ArticleItem {
        id: meta.id.clone(),
        title: meta.title.clone(),
        subtitle: meta.subtitle.clone(),
        description: meta.description.clone(),
        difficulty: meta.difficulty.clone(),
        categories: meta.categories.clone(),
        word_count: meta.word_count,
        created_at: meta.created_at.clone(),
        image_url,
        source_url: Some(format!("articles/{}.html", meta.id)),
    })
}

// ============================================================================
// Feed assembly
// ============================================================================

/// Dated items first, newest first; dateless items keep load order.
/// `sort_by` is stable, so ties and the dateless tail never reshuffle
/// between runs.
fn sort_items(items: &mut [FeedItem]) {
    items.sort_by(|a, b| match (a.created_at(), b.created_at()) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

// ============================================================================
// Filesystem helpers
// ============================================================================

fn clean_dir(dir: &Path) -> std::io::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Copy a directory tree verbatim. A missing source is fine — every
/// copied tree (covers, image pools, assets, admin UI) is optional.
fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<()> {
    if !src.is_dir() {
        return Ok(());
    }
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields children of src");
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ContentStatus;
    use crate::test_helpers::*;
    use std::path::PathBuf;

    fn build_fixture(tmp: &Path) -> (BuildReport, PathBuf) {
        let content_dir = tmp.join("content");
        let assets_dir = tmp.join("static");
        let admin_dir = tmp.join("admin");
        let inputs = BuildInputs {
            content_dir: &content_dir,
            assets_dir: &assets_dir,
            admin_dir: &admin_dir,
        };
        let out = tmp.join("public");
        let report = build(&inputs, &out).unwrap();
        (report, out)
    }

    #[test]
    fn build_emits_expected_layout() {
        let tmp = content_fixture();
        let (report, out) = build_fixture(tmp.path());

        assert!(out.join("discover/feed.json").is_file());
        assert!(out.join("books/three-body/_index.json").is_file());
        assert!(out.join("books/three-body/chapters/01.html").is_file());
        assert!(out.join("books/three-body/chapters/02.html").is_file());
        assert!(out.join("articles/why-read.html").is_file());
        assert!(out.join("images/books/three-body/cover.jpg").is_file());
        assert_eq!(report.items, 3);
        assert_eq!(report.books[0].rendered, 2);
    }

    #[test]
    fn manifest_rewrites_chapter_files_to_html() {
        let tmp = content_fixture();
        let (_, out) = build_fixture(tmp.path());

        let manifest: BookManifest = read_json(&out.join("books/three-body/_index.json"));
        assert_eq!(manifest.total_chapters, 2);
        assert_eq!(manifest.status, ContentStatus::Ongoing);
        let files: Vec<&str> = manifest.chapters.iter().map(|c| c.file.as_str()).collect();
        assert_eq!(files, vec!["chapters/01.html", "chapters/02.html"]);
    }

    #[test]
    fn unsourced_chapter_keeps_markdown_reference() {
        let tmp = content_fixture();
        write_file(
            tmp.path(),
            "content/books/declared/_index.yaml",
            "\
id: declared
title:
  zh: 只有声明
difficulty: easy
categories: [fiction]
chapters:
  - id: '01'
    title:
      zh: 第一章
    file: chapters/01.md
",
        );
        let (report, out) = build_fixture(tmp.path());

        let manifest: BookManifest = read_json(&out.join("books/declared/_index.json"));
        assert_eq!(manifest.chapters[0].file, "chapters/01.md");
        assert!(!out.join("books/declared/chapters/01.html").exists());
        assert!(report.warnings.iter().any(|w| w.contains("unrendered")));
    }

    #[test]
    fn chapter_html_gets_book_scoped_image_urls() {
        let tmp = content_fixture();
        write_chapter(
            tmp.path(),
            "three-body",
            "03.md",
            "插图：\n\n![图](../images/fig.png)\n",
        );
        let (_, out) = build_fixture(tmp.path());

        let html = std::fs::read_to_string(out.join("books/three-body/chapters/03.html")).unwrap();
        assert!(html.contains(r#"src="/images/books/three-body/fig.png""#));
    }

    #[test]
    fn base_path_prefixes_image_urls() {
        let tmp = content_fixture();
        write_file(
            tmp.path(),
            "content/_config/settings.yaml",
            "version: \"1.0\"\ndefaultLocale: zh\nsupportedLocales: [zh]\nbasePath: /reader\n",
        );
        let (_, out) = build_fixture(tmp.path());

        let feed: Feed = read_json(&out.join("discover/feed.json"));
        let book = feed
            .items
            .iter()
            .find_map(|i| match i {
                FeedItem::Book(b) => Some(b),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            book.image_url.as_deref(),
            Some("/reader/images/books/three-body/cover.jpg")
        );
        // Non-image URLs stay relative to the feed origin
        assert_eq!(
            book.manifest_url.as_deref(),
            Some("books/three-body/_index.json")
        );
    }

    #[test]
    fn article_feed_item_derives_urls() {
        let tmp = content_fixture();
        let (_, out) = build_fixture(tmp.path());

        let feed: Feed = read_json(&out.join("discover/feed.json"));
        let article = feed
            .items
            .iter()
            .find_map(|i| match i {
                FeedItem::Article(a) => Some(a),
                _ => None,
            })
            .unwrap();
        assert_eq!(article.source_url.as_deref(), Some("articles/why-read.html"));
        assert_eq!(
            article.image_url.as_deref(),
            Some("/images/articles/reading.png")
        );
        assert!(article.word_count.unwrap() > 0);
    }

    #[test]
    fn explicit_article_cover_wins_over_first_image() {
        let tmp = content_fixture();
        write_file(
            tmp.path(),
            "content/articles/covered.md",
            "\
---
id: covered
title:
  zh: 有封面
coverImage: ./images/chosen.png
difficulty: easy
categories: [fiction]
---
![其他](./images/other.png)
",
        );
        let (_, out) = build_fixture(tmp.path());

        let feed: Feed = read_json(&out.join("discover/feed.json"));
        let article = feed
            .items
            .iter()
            .find_map(|i| match i {
                FeedItem::Article(a) if a.id == "covered" => Some(a),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            article.image_url.as_deref(),
            Some("/images/articles/chosen.png")
        );
    }

    #[test]
    fn feed_sorts_dated_items_first_newest_first() {
        let tmp = content_fixture();
        write_file(
            tmp.path(),
            "content/pagebooks/older.yaml",
            "\
id: older
title:
  zh: 旧站
homeUrl: https://old.example.com
difficulty: easy
categories: [fiction]
createdAt: 2023-01-01
",
        );
        write_file(
            tmp.path(),
            "content/pagebooks/newer.yaml",
            "\
id: newer
title:
  zh: 新站
homeUrl: https://new.example.com
difficulty: easy
categories: [fiction]
createdAt: 2024-06-01
",
        );
        let (_, out) = build_fixture(tmp.path());

        let feed: Feed = read_json(&out.join("discover/feed.json"));
        let ids: Vec<&str> = feed.items.iter().map(|i| i.id()).collect();
        let newer = ids.iter().position(|i| *i == "newer").unwrap();
        let older = ids.iter().position(|i| *i == "older").unwrap();
        let dateless = ids.iter().position(|i| *i == "three-body").unwrap();
        assert!(newer < older);
        assert!(older < dateless);
    }

    #[test]
    fn feed_carries_config_verbatim() {
        let tmp = content_fixture();
        let (_, out) = build_fixture(tmp.path());

        let feed: Feed = read_json(&out.join("discover/feed.json"));
        assert_eq!(feed.version, "1.0");
        assert_eq!(feed.default_locale, "zh");
        assert_eq!(feed.featured, vec!["three-body"]);
        assert_eq!(feed.categories.len(), 1);
    }

    #[test]
    fn book_items_do_not_embed_chapters() {
        let tmp = content_fixture();
        let (_, out) = build_fixture(tmp.path());

        let raw: serde_json::Value =
            read_json(&out.join("discover/feed.json"));
        let book = raw["items"]
            .as_array()
            .unwrap()
            .iter()
            .find(|i| i["type"] == "book")
            .unwrap();
        assert!(book.get("chapters").is_none());
        assert_eq!(book["chaptersCount"], 2);
    }

    #[test]
    fn static_and_admin_trees_copied_verbatim() {
        let tmp = content_fixture();
        write_file(tmp.path(), "static/images/logo.png", "png-bytes");
        write_file(tmp.path(), "admin/index.html", "<html>admin</html>");
        write_file(tmp.path(), "admin/config.yml", "backend: none");
        let (_, out) = build_fixture(tmp.path());

        assert!(out.join("images/logo.png").is_file());
        assert!(out.join("admin/index.html").is_file());
        assert!(out.join("admin/config.yml").is_file());
    }

    #[test]
    fn article_image_pool_is_centralized() {
        let tmp = content_fixture();
        let (_, out) = build_fixture(tmp.path());
        assert!(out.join("images/articles/reading.png").is_file());
    }

    #[test]
    fn rebuild_replaces_stale_output() {
        let tmp = content_fixture();
        let (_, out) = build_fixture(tmp.path());
        std::fs::write(out.join("stale.txt"), "left over").unwrap();

        let (_, out) = build_fixture(tmp.path());
        assert!(!out.join("stale.txt").exists());
    }
}
