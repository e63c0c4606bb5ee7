//! Content discovery and loading.
//!
//! Stage 1 of the bookfeed pipeline. Walks the content tree, parses and
//! validates every metadata document, and produces a [`Manifest`] the
//! emitter consumes. Nothing is written here.
//!
//! ## Directory structure
//!
//! Three content sources, each with its own on-disk shape:
//!
//! ```text
//! content/
//! ├── _config/
//! │   ├── settings.yaml            # version, locales, basePath
//! │   ├── categories.yaml          # category table
//! │   └── featured.yaml            # featured item IDs
//! ├── books/
//! │   └── three-body/
//! │       ├── _index.yaml          # book metadata (required)
//! │       ├── cover.jpg            # optional, first of jpg/jpeg/png/webp
//! │       ├── images/              # optional per-book image pool
//! │       └── chapters/
//! │           ├── 01.md            # chapters, lexicographic order
//! │           ├── 01.yaml          # optional title sidecar
//! │           └── 02.md
//! ├── pagebooks/
//! │   └── hsk-trainer.yaml         # one YAML per external resource
//! └── articles/
//!     ├── images/                  # shared article image pool
//!     └── why-read.md              # front matter + body
//! ```
//!
//! ## Validation policy
//!
//! Content correctness is a precondition, not a best-effort goal: a
//! single malformed metadata document fails the whole scan (no partial
//! feed). Cosmetic gaps — dangling featured IDs, unknown category
//! references, zero-chapter books — are collected as warnings instead,
//! so publication is never blocked on catalog polish.
//!
//! Chapter order is the lexicographic sort of the markdown filenames;
//! authors encode order with zero-padded numeric prefixes (`01.md`,
//! `02.md`). The scanner sorts explicitly rather than trusting directory
//! enumeration order.

use crate::cjk;
use crate::config::{self, Config, ConfigError};
use crate::frontmatter::{self, FrontMatterError};
use crate::metadata;
use crate::schema::{ArticleMeta, BookMeta, Chapter, PageBook, Validate};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        source: FrontMatterError,
    },
    #[error("missing front matter in {0} (articles require a metadata block)")]
    MissingFrontMatter(PathBuf),
    #[error("schema violation in {path}: {}", violations.join("; "))]
    Schema {
        path: PathBuf,
        violations: Vec<String>,
    },
    #[error("duplicate item id '{id}' ({first} and {second})")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },
}

/// A chapter with everything the emitter needs: the manifest record plus
/// the markdown body to render.
#[derive(Debug, Clone)]
pub struct LoadedChapter {
    pub chapter: Chapter,
    /// `None` for a declared chapter whose markdown source is missing —
    /// carried through unrendered (degraded, not fatal).
    pub body: Option<String>,
}

/// A book with its discovered chapters and cover.
#[derive(Debug, Clone)]
pub struct LoadedBook {
    pub meta: BookMeta,
    pub chapters: Vec<LoadedChapter>,
    /// Cover filename inside the book directory (`cover.jpg`).
    pub cover: Option<String>,
    /// Source directory under `content/books/`.
    pub dir: PathBuf,
}

/// An article with its body.
#[derive(Debug, Clone)]
pub struct LoadedArticle {
    pub meta: ArticleMeta,
    pub body: String,
}

/// Everything stage 1 knows: configuration plus all loaded content.
#[derive(Debug)]
pub struct Manifest {
    pub config: Config,
    pub books: Vec<LoadedBook>,
    pub pagebooks: Vec<PageBook>,
    pub articles: Vec<LoadedArticle>,
    /// Cosmetic findings (never fatal); the emitter and `check` both
    /// report these.
    pub warnings: Vec<String>,
}

const BOOK_INDEX: &str = "_index.yaml";

/// Scan the content tree rooted at `content_dir`.
pub fn scan(content_dir: &Path) -> Result<Manifest, ScanError> {
    let config = config::load(content_dir)?;

    let books = load_books(&content_dir.join("books"))?;
    let pagebooks = load_pagebooks(&content_dir.join("pagebooks"))?;
    let articles = load_articles(&content_dir.join("articles"))?;

    check_unique_ids(&books, &pagebooks, &articles)?;

    let mut manifest = Manifest {
        config,
        books,
        pagebooks,
        articles,
        warnings: Vec::new(),
    };
    let warnings = cross_reference_warnings(&manifest);
    manifest.warnings = warnings;
    Ok(manifest)
}

// ============================================================================
// Book loader
// ============================================================================

/// Load every book directory containing an `_index.yaml`.
fn load_books(books_dir: &Path) -> Result<Vec<LoadedBook>, ScanError> {
    let mut books = Vec::new();

    for dir in sorted_subdirs(books_dir)? {
        let index_path = dir.join(BOOK_INDEX);
        if !index_path.is_file() {
            continue;
        }

        let meta: BookMeta = read_yaml_doc(&index_path)?;
        validate_doc(&meta, &index_path)?;

        let discovered = load_chapters(&dir.join("chapters"))?;
        let chapters = if discovered.is_empty() {
            // Degraded fallback: metadata-declared chapters with no
            // sources on disk are carried through unrendered.
            meta.chapters
                .clone()
                .unwrap_or_default()
                .into_iter()
                .map(|chapter| LoadedChapter {
                    chapter,
                    body: None,
                })
                .collect()
        } else {
            discovered
        };

        let cover = metadata::find_cover(&dir);

        books.push(LoadedBook {
            meta,
            chapters,
            cover,
            dir,
        });
    }

    Ok(books)
}

/// Load the chapter sequence of one book.
///
/// Markdown filenames are sorted lexicographically — that sort *is* the
/// canonical chapter order. A missing `chapters/` directory yields zero
/// chapters, not an error.
fn load_chapters(chapters_dir: &Path) -> Result<Vec<LoadedChapter>, ScanError> {
    if !chapters_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut md_files: Vec<PathBuf> = fs::read_dir(chapters_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_extension(p, "md"))
        .collect();
    md_files.sort();

    let mut chapters = Vec::new();
    for md_path in &md_files {
        let chapter_id = md_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_name = md_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let source = fs::read_to_string(md_path)?;
        let doc = frontmatter::parse(&source).map_err(|source| ScanError::FrontMatter {
            path: md_path.clone(),
            source,
        })?;

        let sidecar = match metadata::read_sidecar(md_path) {
            Some(Ok(value)) => Some(value),
            Some(Err(source)) => {
                return Err(ScanError::Yaml {
                    path: md_path.with_extension("yaml"),
                    source,
                });
            }
            None => None,
        };

        let title =
            metadata::resolve_chapter_title(sidecar.as_ref(), doc.metadata.as_ref(), &chapter_id);

        chapters.push(LoadedChapter {
            chapter: Chapter {
                id: chapter_id,
                title,
                file: format!("chapters/{file_name}"),
                word_count: Some(cjk::count(&doc.body) as u64),
            },
            body: Some(doc.body),
        });
    }

    Ok(chapters)
}

// ============================================================================
// Pagebook loader
// ============================================================================

/// Load every `*.yaml` under `content/pagebooks/`, one pagebook each.
fn load_pagebooks(pagebooks_dir: &Path) -> Result<Vec<PageBook>, ScanError> {
    if !pagebooks_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut yaml_files: Vec<PathBuf> = fs::read_dir(pagebooks_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_extension(p, "yaml"))
        .collect();
    yaml_files.sort();

    let mut pagebooks = Vec::new();
    for path in &yaml_files {
        let pagebook: PageBook = read_yaml_doc(path)?;
        validate_doc(&pagebook, path)?;
        pagebooks.push(pagebook);
    }

    Ok(pagebooks)
}

// ============================================================================
// Article loader
// ============================================================================

/// Load every `*.md` under `content/articles/` (flat listing; the shared
/// `images/` subdirectory is not an article).
fn load_articles(articles_dir: &Path) -> Result<Vec<LoadedArticle>, ScanError> {
    if !articles_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut md_files: Vec<PathBuf> = fs::read_dir(articles_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_extension(p, "md"))
        .collect();
    md_files.sort();

    let mut articles = Vec::new();
    for path in &md_files {
        let source = fs::read_to_string(path)?;
        let doc = frontmatter::parse(&source).map_err(|source| ScanError::FrontMatter {
            path: path.clone(),
            source,
        })?;

        let Some(meta_value) = doc.metadata else {
            return Err(ScanError::MissingFrontMatter(path.clone()));
        };

        let mut meta: ArticleMeta =
            serde_yaml::from_value(meta_value).map_err(|source| ScanError::Yaml {
                path: path.clone(),
                source,
            })?;
        validate_doc(&meta, path)?;

        meta.word_count = Some(cjk::count(&doc.body) as u64);

        articles.push(LoadedArticle {
            meta,
            body: doc.body,
        });
    }

    Ok(articles)
}

// ============================================================================
// Cross checks
// ============================================================================

/// Item IDs must be unique across all three sources — two items with the
/// same ID would collide in the feed and on the output filesystem.
fn check_unique_ids(
    books: &[LoadedBook],
    pagebooks: &[PageBook],
    articles: &[LoadedArticle],
) -> Result<(), ScanError> {
    let mut seen: BTreeMap<&str, String> = BTreeMap::new();

    let ids = books
        .iter()
        .map(|b| (b.meta.id.as_str(), format!("book '{}'", b.meta.id)))
        .chain(
            pagebooks
                .iter()
                .map(|p| (p.id.as_str(), format!("pagebook '{}'", p.id))),
        )
        .chain(
            articles
                .iter()
                .map(|a| (a.meta.id.as_str(), format!("article '{}'", a.meta.id))),
        );

    for (id, label) in ids {
        if let Some(first) = seen.insert(id, label.clone()) {
            return Err(ScanError::DuplicateId {
                id: id.to_string(),
                first,
                second: label,
            });
        }
    }
    Ok(())
}

/// Referential findings that never block the build: dangling featured
/// IDs, category references missing from the table, zero-chapter books.
fn cross_reference_warnings(manifest: &Manifest) -> Vec<String> {
    let mut warnings = Vec::new();

    let item_ids: BTreeSet<&str> = manifest
        .books
        .iter()
        .map(|b| b.meta.id.as_str())
        .chain(manifest.pagebooks.iter().map(|p| p.id.as_str()))
        .chain(manifest.articles.iter().map(|a| a.meta.id.as_str()))
        .collect();

    for featured_id in &manifest.config.featured {
        if !item_ids.contains(featured_id.as_str()) {
            warnings.push(format!("featured item not found: {featured_id}"));
        }
    }

    let known_categories: BTreeSet<&str> = manifest
        .config
        .categories
        .iter()
        .map(|c| c.id.as_str())
        .collect();

    let referenced = manifest
        .books
        .iter()
        .map(|b| (b.meta.id.as_str(), &b.meta.categories))
        .chain(manifest.pagebooks.iter().map(|p| (p.id.as_str(), &p.categories)))
        .chain(
            manifest
                .articles
                .iter()
                .map(|a| (a.meta.id.as_str(), &a.meta.categories)),
        );
    for (item_id, categories) in referenced {
        for category in categories {
            if !known_categories.contains(category.as_str()) {
                warnings.push(format!("item {item_id}: unknown category '{category}'"));
            }
        }
    }

    for book in &manifest.books {
        if book.chapters.is_empty() {
            warnings.push(format!("book {}: no chapters found", book.meta.id));
        }
        for chapter in &book.chapters {
            if chapter.body.is_none() {
                warnings.push(format!(
                    "book {}: chapter {} has no markdown source (left unrendered)",
                    book.meta.id, chapter.chapter.id
                ));
            }
        }
    }

    warnings
}

// ============================================================================
// Shared helpers
// ============================================================================

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut subdirs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    subdirs.sort();
    Ok(subdirs)
}

fn read_yaml_doc<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ScanError> {
    let text = fs::read_to_string(path)?;
    serde_yaml::from_str(&text).map_err(|source| ScanError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

fn validate_doc<T: Validate>(doc: &T, path: &Path) -> Result<(), ScanError> {
    let violations = doc.validate();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ScanError::Schema {
            path: path.to_path_buf(),
            violations,
        })
    }
}
