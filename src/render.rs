//! Markdown to standalone HTML rendering.
//!
//! Every chapter and article becomes a self-contained HTML document a
//! client WebView can load directly: charset and viewport metas, an
//! embedded stylesheet tuned for CJK serif reading (with dark-mode
//! support), and an escaped `<title>`.
//!
//! ## Image path rewriting
//!
//! Authored content references images relatively so the content tree
//! stays portable:
//!
//! - `../images/foo.png` from a book chapter (`chapters/01.md` reaching
//!   up into the book's `images/` directory)
//! - `./images/foo.png` from an article (the shared article image pool)
//!
//! Published output must be CDN-addressable, so both conventions are
//! rewritten during rendering to `{image_base}/foo.png`, where
//! `image_base` is the centralized, base-path-aware location the build
//! copies images to. Absolute paths and `http(s)://` URLs pass through
//! untouched.
//!
//! Rewriting happens on the parsed event stream, not the source text, so
//! an `../images/` inside a code block stays literal.
//!
//! ## Markdown dialect
//!
//! GitHub-flavored syntax (tables, strikethrough, task lists) with soft
//! line breaks promoted to hard breaks — Chinese prose is authored one
//! sentence per line and readers expect those lines to hold.
//!
//! ## HTML generation
//!
//! The document chrome is [maud](https://maud.lambda.xyz/): compile-time
//! checked and auto-escaping, which is what makes title escaping (titles
//! are user-authored metadata) non-optional by construction.

use maud::{DOCTYPE, PreEscaped, html};
use pulldown_cmark::{Event, Options, Parser, Tag, html as md_html};

const READER_CSS: &str = include_str!("../static/reader.css");

/// Relative prefixes recognized for rewriting, in match order.
const IMAGE_PREFIXES: &[&str] = &["../images/", "./images/"];

fn markdown_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Rewrite a single image destination against the centralized image
/// location. Returns `None` when the destination is not one of the
/// recognized relative conventions.
fn rewrite_image_dest(dest: &str, image_base: &str) -> Option<String> {
    IMAGE_PREFIXES
        .iter()
        .find_map(|prefix| dest.strip_prefix(prefix))
        .map(|rest| format!("{image_base}/{rest}"))
}

/// Convert a markdown body to an HTML fragment, rewriting relative image
/// references against `image_base` when one is given.
pub fn markdown_to_fragment(markdown: &str, image_base: Option<&str>) -> String {
    let events = Parser::new_ext(markdown, markdown_options()).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let dest = image_base
                .and_then(|base| rewrite_image_dest(&dest_url, base))
                .map(pulldown_cmark::CowStr::from)
                .unwrap_or(dest_url);
            Event::Start(Tag::Image {
                link_type,
                dest_url: dest,
                title,
                id,
            })
        }
        other => other,
    });

    let mut fragment = String::with_capacity(markdown.len() * 2);
    md_html::push_html(&mut fragment, events);
    fragment
}

/// Render a markdown body as a standalone HTML document.
pub fn render_document(markdown: &str, title: &str, image_base: Option<&str>) -> String {
    let fragment = markdown_to_fragment(markdown, image_base);

    let markup = html! {
        (DOCTYPE)
        html lang="zh-CN" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(READER_CSS)) }
            }
            body {
                (PreEscaped(&fragment))
            }
        }
    };

    markup.into_string()
}

/// Destination of the first image in a markdown body, if any.
///
/// Used to derive an article's cover when no explicit one is set. The
/// destination is returned as authored — callers apply the same rewrite
/// rules the renderer does.
pub fn first_image(markdown: &str) -> Option<String> {
    Parser::new_ext(markdown, markdown_options()).find_map(|event| match event {
        Event::Start(Tag::Image { dest_url, .. }) => Some(dest_url.into_string()),
        _ => None,
    })
}

/// Apply the image rewrite rules to a bare destination string.
///
/// Same semantics as the in-document rewrite: relative conventions move
/// under `image_base`, everything else is returned unchanged.
pub fn rewrite_image_url(dest: &str, image_base: &str) -> String {
    rewrite_image_dest(dest, image_base).unwrap_or_else(|| dest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Image path rewriting
    // =========================================================================

    #[test]
    fn chapter_relative_image_is_rewritten() {
        let html = markdown_to_fragment("![x](../images/a.png)", Some("/img/books/b1"));
        assert!(html.contains(r#"src="/img/books/b1/a.png""#));
    }

    #[test]
    fn article_relative_image_is_rewritten() {
        let html = markdown_to_fragment("![x](./images/pic.jpg)", Some("/images/articles"));
        assert!(html.contains(r#"src="/images/articles/pic.jpg""#));
    }

    #[test]
    fn absolute_path_is_untouched() {
        let html = markdown_to_fragment("![x](/static/logo.png)", Some("/img"));
        assert!(html.contains(r#"src="/static/logo.png""#));
    }

    #[test]
    fn external_url_is_untouched() {
        let html = markdown_to_fragment("![x](https://cdn.example.com/a.png)", Some("/img"));
        assert!(html.contains(r#"src="https://cdn.example.com/a.png""#));
    }

    #[test]
    fn no_image_base_means_no_rewriting() {
        let html = markdown_to_fragment("![x](../images/a.png)", None);
        assert!(html.contains(r#"src="../images/a.png""#));
    }

    #[test]
    fn code_block_mention_is_not_rewritten() {
        let md = "```\n![x](../images/a.png)\n```\n";
        let html = markdown_to_fragment(md, Some("/img"));
        assert!(!html.contains("/img/a.png"));
    }

    #[test]
    fn rewrite_image_url_passes_through_unrecognized() {
        assert_eq!(
            rewrite_image_url("../images/a.png", "/img/books/b1"),
            "/img/books/b1/a.png"
        );
        assert_eq!(
            rewrite_image_url("https://x.test/a.png", "/img"),
            "https://x.test/a.png"
        );
    }

    // =========================================================================
    // Markdown dialect
    // =========================================================================

    #[test]
    fn soft_breaks_become_hard_breaks() {
        let html = markdown_to_fragment("第一行\n第二行", None);
        assert!(html.contains("<br"));
    }

    #[test]
    fn gfm_tables_render() {
        let md = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        let html = markdown_to_fragment(md, None);
        assert!(html.contains("<table>"));
    }

    #[test]
    fn strikethrough_renders() {
        let html = markdown_to_fragment("~~旧~~", None);
        assert!(html.contains("<del>"));
    }

    // =========================================================================
    // Standalone document
    // =========================================================================

    #[test]
    fn document_has_chrome() {
        let doc = render_document("正文", "三体 - 第一章", None);
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains(r#"<html lang="zh-CN">"#));
        assert!(doc.contains(r#"<meta charset="UTF-8">"#));
        assert!(doc.contains("<title>三体 - 第一章</title>"));
        assert!(doc.contains("Noto Serif SC"));
        assert!(doc.contains("正文"));
    }

    #[test]
    fn title_metacharacters_are_escaped() {
        let doc = render_document("body", r#"<b> & "quotes"'"#, None);
        assert!(!doc.contains("<title><b>"));
        assert!(doc.contains("&lt;b&gt;"));
        assert!(doc.contains("&amp;"));
    }

    #[test]
    fn body_markdown_is_converted() {
        let doc = render_document("# 标题\n\n段落。", "t", None);
        assert!(doc.contains("<h1>标题</h1>"));
        assert!(doc.contains("<p>段落。</p>"));
    }

    // =========================================================================
    // first_image
    // =========================================================================

    #[test]
    fn first_image_returns_authored_destination() {
        let md = "开头\n\n![one](./images/first.png)\n\n![two](./images/second.png)";
        assert_eq!(first_image(md).as_deref(), Some("./images/first.png"));
    }

    #[test]
    fn first_image_none_without_images() {
        assert_eq!(first_image("只有文字。"), None);
    }

    #[test]
    fn first_image_ignores_code_blocks() {
        let md = "```\n![x](./images/fake.png)\n```\n\n![real](./images/real.png)";
        assert_eq!(first_image(md).as_deref(), Some("./images/real.png"));
    }
}
