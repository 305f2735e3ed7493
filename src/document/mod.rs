//! Assistant text → structured legal document blocks.
//!
//! - `classify`: ordered rule table turning lines/paragraphs into blocks
//! - `inline`: `**bold**` span parsing used at render time
//! - `render`: terminal rendering of classified blocks

pub mod classify;
pub mod inline;
pub mod render;

pub use classify::{
    classify, classify_unit, classify_with, Align, BlockKind, ClassifyMode, DisplayBlock, Line,
    RenderIntent,
};
pub use inline::{inline_spans, strip_inline_markers, InlineSpan};
pub use render::{render_plain, RenderOptions};

/// Greedy word wrap to at most `width` characters per line.
///
/// Words longer than `width` are split. Embedded newlines start a new line.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for source_line in text.lines() {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in source_line.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed > width && current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }

        if current_len > 0 || source_line.trim().is_empty() {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_words_basic() {
        assert_eq!(wrap_words("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_words("one two three", 100), vec!["one two three"]);
    }

    #[test]
    fn test_wrap_words_splits_long_words() {
        assert_eq!(wrap_words("abcdefghij xy", 4), vec!["abcd", "efgh", "ij", "xy"]);
        assert_eq!(wrap_words("ab abcdefgh", 4), vec!["ab", "abcd", "efgh"]);
    }

    #[test]
    fn test_wrap_words_keeps_line_breaks() {
        assert_eq!(wrap_words("first\n\nsecond", 20), vec!["first", "", "second"]);
        assert_eq!(wrap_words("", 20), vec![""]);
    }
}
