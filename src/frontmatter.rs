//! YAML front matter extraction for markdown documents.
//!
//! Articles and chapters may open with a front matter block:
//!
//! ```text
//! ---
//! id: why-read
//! title:
//!   zh: 为什么要阅读
//! ---
//! 正文从这里开始。
//! ```
//!
//! The block is delimited by `---` lines; the first must be the very first
//! line of the document. A document without a leading `---` has no front
//! matter and the whole text is the body. An opening `---` without a
//! closing one is an authoring error, not an empty body.

use serde_yaml::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("unterminated front matter block (missing closing '---')")]
    Unterminated,
    #[error("invalid front matter YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A markdown document split into metadata and body.
#[derive(Debug, Clone)]
pub struct Document {
    /// Parsed front matter, if the document has a block.
    pub metadata: Option<Value>,
    /// Everything after the closing delimiter (or the whole input).
    pub body: String,
}

const DELIMITER: &str = "---";

/// Split a markdown source into front matter and body.
///
/// The front matter YAML is parsed but not interpreted — callers
/// deserialize it into their own record type.
pub fn parse(source: &str) -> Result<Document, FrontMatterError> {
    let Some(rest) = strip_opening_delimiter(source) else {
        return Ok(Document {
            metadata: None,
            body: source.to_string(),
        });
    };

    let mut yaml_lines = Vec::new();
    let mut lines = rest.lines();
    loop {
        match lines.next() {
            Some(line) if line.trim_end() == DELIMITER => break,
            Some(line) => yaml_lines.push(line),
            None => return Err(FrontMatterError::Unterminated),
        }
    }

    let metadata = if yaml_lines.is_empty() {
        None
    } else {
        let value: Value = serde_yaml::from_str(&yaml_lines.join("\n"))?;
        // `---\n---` parses as null; treat it the same as no block
        (!value.is_null()).then_some(value)
    };

    let body: String = lines.collect::<Vec<_>>().join("\n");

    Ok(Document { metadata, body })
}

/// Returns the text after the opening `---` line, or `None` if the
/// document does not start with one.
fn strip_opening_delimiter(source: &str) -> Option<&str> {
    let mut lines = source.splitn(2, '\n');
    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }
    Some(lines.next().unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_without_front_matter() {
        let doc = parse("# Title\n\nBody text.").unwrap();
        assert!(doc.metadata.is_none());
        assert_eq!(doc.body, "# Title\n\nBody text.");
    }

    #[test]
    fn splits_metadata_and_body() {
        let doc = parse("---\nid: a1\n---\nBody here.").unwrap();
        let meta = doc.metadata.unwrap();
        assert_eq!(meta["id"], Value::from("a1"));
        assert_eq!(doc.body, "Body here.");
    }

    #[test]
    fn nested_localized_title() {
        let src = "---\ntitle:\n  zh: 测试\n  en: Test\n---\n正文";
        let doc = parse(src).unwrap();
        let meta = doc.metadata.unwrap();
        assert_eq!(meta["title"]["zh"], Value::from("测试"));
        assert_eq!(doc.body, "正文");
    }

    #[test]
    fn empty_block_yields_no_metadata() {
        let doc = parse("---\n---\nBody").unwrap();
        assert!(doc.metadata.is_none());
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let err = parse("---\nid: a1\nBody without closing").unwrap_err();
        assert!(matches!(err, FrontMatterError::Unterminated));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let err = parse("---\n: [unbalanced\n---\nBody").unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));
    }

    #[test]
    fn delimiter_mid_document_is_plain_text() {
        let src = "Intro\n---\nnot: metadata\n---\n";
        let doc = parse(src).unwrap();
        assert!(doc.metadata.is_none());
        assert_eq!(doc.body, src);
    }

    #[test]
    fn body_preserves_blank_lines() {
        let doc = parse("---\nid: x\n---\n\nPara one.\n\nPara two.").unwrap();
        assert_eq!(doc.body, "\nPara one.\n\nPara two.");
    }

    #[test]
    fn crlf_delimiters_are_tolerated() {
        let doc = parse("---\r\nid: x\r\n---\r\nBody").unwrap();
        assert_eq!(doc.metadata.unwrap()["id"], Value::from("x"));
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn empty_body_after_block() {
        let doc = parse("---\nid: x\n---\n").unwrap();
        assert!(doc.metadata.is_some());
        assert_eq!(doc.body, "");
    }
}
