//! Centralized CJK ideograph counting.
//!
//! Every "length" shown to readers — chapter word counts, article word
//! counts — is computed by this one function so the metric cannot drift
//! between loaders.
//!
//! The metric counts characters in the CJK Unified Ideographs block
//! (U+4E00–U+9FFF) and Extension A (U+3400–U+4DBF). Latin text, digits,
//! punctuation, and whitespace all count as zero: for Chinese prose the
//! ideograph count *is* the word count, and mixing in space-separated
//! word counting for embedded English fragments would make the number
//! meaningless for its purpose (estimating reading time).

/// Count CJK ideographs in a text body.
///
/// ```
/// use bookfeed::cjk::count;
///
/// assert_eq!(count("你好，世界"), 4);
/// assert_eq!(count("hello world"), 0);
/// assert_eq!(count("第1章 Introduction"), 2);
/// ```
pub fn count(text: &str) -> usize {
    text.chars()
        .filter(|c| matches!(c, '\u{4e00}'..='\u{9fff}' | '\u{3400}'..='\u{4dbf}'))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_common_ideographs() {
        assert_eq!(count("你好世界"), 4);
    }

    #[test]
    fn ignores_cjk_punctuation() {
        // Fullwidth punctuation sits outside the counted blocks
        assert_eq!(count("你好，世界。"), 4);
    }

    #[test]
    fn ignores_latin_text() {
        assert_eq!(count("hello, world! 123"), 0);
    }

    #[test]
    fn mixed_text_counts_only_ideographs() {
        assert_eq!(count("第1章 The Beginning 开始"), 4);
    }

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(count(""), 0);
    }

    #[test]
    fn extension_a_block_is_counted() {
        // U+3400 is the first character of Extension A
        assert_eq!(count("\u{3400}\u{4dbf}"), 2);
    }

    #[test]
    fn block_boundaries() {
        assert_eq!(count("\u{4e00}\u{9fff}"), 2);
        // Immediately outside both blocks
        assert_eq!(count("\u{33ff}\u{4dc0}\u{a000}"), 0);
    }

    #[test]
    fn count_is_additive_across_fragments() {
        let a = "春眠不觉晓 morning";
        let b = "处处闻啼鸟!";
        assert_eq!(count(a) + count(b), count(&format!("{a}{b}")));
    }

    #[test]
    fn markdown_syntax_does_not_count() {
        assert_eq!(count("# 标题\n\n**加粗** `code`"), 4);
    }
}
