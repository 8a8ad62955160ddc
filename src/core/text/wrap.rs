//! Word wrapping for plain text.

use super::width::{grapheme_segments, grapheme_width, visible_width};

/// Wrap `text` into lines no wider than `width` cells.
///
/// Explicit newlines are kept; words longer than the width are broken at grapheme boundaries.
/// Whitespace at a wrap point is dropped. An empty input yields one empty line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph.trim_end_matches('\r'), width, &mut lines);
    }
    lines
}

fn wrap_paragraph(paragraph: &str, width: usize, lines: &mut Vec<String>) {
    let mut line = String::new();
    let mut line_width = 0;

    for token in split_words(paragraph) {
        let token_width = visible_width(token);
        let is_space = token.chars().all(char::is_whitespace);

        if line_width + token_width <= width {
            line.push_str(token);
            line_width += token_width;
            continue;
        }

        if is_space {
            lines.push(std::mem::take(&mut line).trim_end().to_string());
            line_width = 0;
            continue;
        }

        if line_width > 0 && token_width <= width {
            lines.push(std::mem::take(&mut line).trim_end().to_string());
            line.push_str(token);
            line_width = token_width;
            continue;
        }

        for grapheme in grapheme_segments(token) {
            let grapheme_cells = grapheme_width(grapheme);
            if line_width + grapheme_cells > width && line_width > 0 {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            line.push_str(grapheme);
            line_width += grapheme_cells;
        }
    }

    lines.push(line.trim_end().to_string());
}

/// Split into alternating runs of whitespace and non-whitespace.
fn split_words(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (idx, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        match in_space {
            Some(previous) if previous != space => {
                tokens.push(&text[start..idx]);
                start = idx;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::wrap_text;
    use crate::core::text::width::visible_width;

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrap_text("hello world", 20), vec!["hello world"]);
    }

    #[test]
    fn wraps_at_word_boundaries() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
    }

    #[test]
    fn keeps_explicit_newlines_and_blank_lines() {
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn breaks_words_longer_than_width() {
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn wide_graphemes_never_exceed_width() {
        let lines = wrap_text("프로젝트마감일", 5);
        assert!(lines.iter().all(|line| visible_width(line) <= 5));
        assert_eq!(lines.concat(), "프로젝트마감일");
    }

    #[test]
    fn empty_input_is_one_empty_line() {
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }
}
