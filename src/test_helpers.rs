//! Shared test utilities for the bookfeed test suite.
//!
//! Builds a small but complete content tree in a temp directory — one
//! book with two chapters and a cover, one pagebook, one article with an
//! image — plus lookup helpers that panic with the available candidates
//! on a miss.
//!
//! The fixture is deliberately warning-free: a fresh scan or build of it
//! reports nothing, so tests that provoke a specific warning or error
//! see exactly the finding they caused.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::scan::{LoadedBook, LoadedChapter, Manifest};

/// Write a file under `root`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Write a chapter file for a fixture book.
pub fn write_chapter(root: &Path, book_id: &str, file_name: &str, content: &str) {
    write_file(
        root,
        &format!("content/books/{book_id}/chapters/{file_name}"),
        content,
    );
}

/// Create the standard content fixture and return its root.
///
/// ```text
/// content/
/// ├── _config/{settings,categories,featured}.yaml
/// ├── books/three-body/{_index.yaml, cover.jpg, chapters/01.md, chapters/02.md}
/// ├── pagebooks/hsk-trainer.yaml
/// └── articles/{why-read.md, images/reading.png}
/// ```
pub fn content_fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_file(
        root,
        "content/_config/settings.yaml",
        "version: \"1.0\"\ndefaultLocale: zh\nsupportedLocales: [zh, en]\nbasePath: \"\"\n",
    );
    write_file(
        root,
        "content/_config/categories.yaml",
        "\
categories:
  - id: fiction
    name:
      zh: 小说
      en: Fiction
    icon: book
    order: 1
",
    );
    write_file(
        root,
        "content/_config/featured.yaml",
        "featured:\n  - three-body\n",
    );

    write_file(
        root,
        "content/books/three-body/_index.yaml",
        "\
id: three-body
title:
  zh: 三体
  en: The Three-Body Problem
author:
  zh: 刘慈欣
description:
  zh: 地球往事三部曲第一部。
difficulty: advanced
categories: [fiction]
",
    );
    write_chapter(
        root,
        "three-body",
        "01.md",
        "---\ntitle:\n  zh: 科学边界\n---\n汪淼觉得，来找他的这四个人是个奇怪的组合。\n",
    );
    write_chapter(
        root,
        "three-body",
        "02.md",
        "---\ntitle: 台球\n---\n丁仪把一个黑色的金属球放在台球桌上。\n",
    );
    write_file(root, "content/books/three-body/cover.jpg", "jpg-bytes");

    write_file(
        root,
        "content/pagebooks/hsk-trainer.yaml",
        "\
id: hsk-trainer
title:
  zh: 汉语水平训练
homeUrl: https://hsk.example.com
difficulty: beginner
categories: [fiction]
",
    );

    write_file(
        root,
        "content/articles/why-read.md",
        "\
---
id: why-read
title:
  zh: 为什么要读长篇
difficulty: easy
categories: [fiction]
---
读长篇小说是一种长期的陪伴。

![配图](./images/reading.png)
",
    );
    write_file(root, "content/articles/images/reading.png", "png-bytes");

    tmp
}

// =========================================================================
// Manifest lookups — panics with a clear message on miss
// =========================================================================

/// Find a loaded book by ID. Panics if not found.
pub fn find_book<'a>(manifest: &'a Manifest, id: &str) -> &'a LoadedBook {
    manifest
        .books
        .iter()
        .find(|b| b.meta.id == id)
        .unwrap_or_else(|| {
            let ids: Vec<&str> = manifest.books.iter().map(|b| b.meta.id.as_str()).collect();
            panic!("book '{id}' not found. Available: {ids:?}")
        })
}

/// Find a chapter by ID within a loaded book. Panics if not found.
pub fn find_chapter<'a>(book: &'a LoadedBook, id: &str) -> &'a LoadedChapter {
    book.chapters
        .iter()
        .find(|c| c.chapter.id == id)
        .unwrap_or_else(|| {
            let ids: Vec<&str> = book
                .chapters
                .iter()
                .map(|c| c.chapter.id.as_str())
                .collect();
            panic!(
                "chapter '{id}' not found in book '{}'. Available: {ids:?}",
                book.meta.id
            )
        })
}

/// Read and deserialize a JSON artifact. Panics with the path on failure.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> T {
    let text = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("cannot parse {}: {e}", path.display()))
}
