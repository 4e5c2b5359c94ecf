//! Greedy line breaking with backtrack for a fixed-size text display.

use crate::types::RenderFrame;

/// Last line of a frame whose content did not fit.
pub const TRUNCATION_INDICATOR: &str = "...";

/// A line may end right after one of these.
const SENTENCE_END: [char; 6] = ['.', '!', '?', '。', '！', '？'];

/// Display geometry in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextWrapRenderer {
    pub max_line_width: usize,
    pub max_lines: usize,
}

impl TextWrapRenderer {
    pub fn new(max_line_width: usize, max_lines: usize) -> Self {
        Self { max_line_width, max_lines }
    }

    pub fn frame(&self, title: &str, content: &str) -> RenderFrame {
        layout(title, content, self.max_line_width, self.max_lines)
    }
}

/// Lay `content` out in at most `max_lines` lines of at most `max_line_width` chars.
///
/// Each line fills the window greedily, then backs off to the nearest
/// whitespace or sentence end so words stay whole; a window with no break
/// point is hard-cut at exactly `max_line_width`. Whitespace between lines is
/// dropped. When content remains after the last line, the frame is marked
/// `truncated` and its last line becomes [`TRUNCATION_INDICATOR`]. Content
/// that fits the raw `max_line_width * max_lines` capacity is never truncated:
/// if word-preserving breaks would overflow it, the frame is packed densely.
/// Capacity counts laid-out chars only, so whitespace dropped at line breaks
/// never marks a frame as truncated.
pub fn layout(title: &str, content: &str, max_line_width: usize, max_lines: usize) -> RenderFrame {
    let chars: Vec<char> = content.chars().collect();

    let (mut body_lines, mut truncated) = break_lines(&chars, max_line_width, max_lines, true);
    if truncated && chars.len() <= max_line_width.saturating_mul(max_lines) {
        (body_lines, truncated) = break_lines(&chars, max_line_width, max_lines, false);
    }
    if truncated && max_lines > 0 {
        body_lines.truncate(max_lines - 1);
        body_lines.push(TRUNCATION_INDICATOR.chars().take(max_line_width).collect());
    }

    RenderFrame { title: title.to_owned(), body_lines, truncated }
}

/// Returns the lines and whether content remained after `max_lines`.
fn break_lines(chars: &[char], width: usize, max_lines: usize, backtrack: bool) -> (Vec<String>, bool) {
    let mut lines = Vec::new();
    let mut pos = skip_whitespace(chars, 0);
    if width == 0 {
        return (lines, pos < chars.len());
    }

    while pos < chars.len() {
        if lines.len() == max_lines {
            return (lines, true);
        }
        let end = (pos + width).min(chars.len());
        let cut = if end == chars.len() || !backtrack {
            end
        } else {
            find_break(chars, pos, end).unwrap_or(end)
        };
        lines.push(render_line(&chars[pos..cut]));
        pos = skip_whitespace(chars, cut);
    }
    (lines, false)
}

/// Largest cut in `(start, end]` such that `chars[start..cut]` ends on a legal
/// break: the char at `cut` is whitespace, or the char before it ends a sentence.
/// `end` is always inside `chars` here, since the content continues past the window.
fn find_break(chars: &[char], start: usize, end: usize) -> Option<usize> {
    (start + 1..=end)
        .rev()
        .find(|&cut| chars[cut].is_whitespace() || SENTENCE_END.contains(&chars[cut - 1]))
}

fn skip_whitespace(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && chars[pos].is_whitespace() {
        pos += 1;
    }
    pos
}

fn render_line(chars: &[char]) -> String {
    let line: String = chars
        .iter()
        .map(|&c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    line.trim_end().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_ws(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn short_content_single_line() {
        let f = layout("Reply", "hello", 10, 3);
        assert_eq!(f.body_lines, vec!["hello"]);
        assert!(!f.truncated);
        assert_eq!(f.title, "Reply");
    }

    #[test]
    fn breaks_at_whitespace() {
        let f = layout("t", "the quick brown fox", 10, 5);
        assert_eq!(f.body_lines, vec!["the quick", "brown fox"]);
    }

    #[test]
    fn whitespace_just_past_window_allows_full_line() {
        let f = layout("t", "abcde fgh", 5, 5);
        assert_eq!(f.body_lines, vec!["abcde", "fgh"]);
    }

    #[test]
    fn breaks_after_sentence_end() {
        let f = layout("t", "Hi.Then more", 6, 5);
        assert_eq!(f.body_lines[0], "Hi.");
        let f = layout("t", "你好。今天天气很好", 4, 5);
        assert_eq!(f.body_lines[0], "你好。");
    }

    #[test]
    fn hard_cut_without_break_points() {
        let f = layout("t", "abcdefghijklmnop", 5, 10);
        assert_eq!(f.body_lines, vec!["abcde", "fghij", "klmno", "p"]);
        assert_eq!(f.body_lines[0].chars().count(), 5);
    }

    #[test]
    fn never_cuts_inside_a_word_when_break_exists() {
        let content = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let words: Vec<&str> = content.split(' ').collect();
        let f = layout("t", content, 12, 20);
        for line in &f.body_lines {
            for w in line.split(' ') {
                assert!(words.contains(&w), "split word {w:?} in {line:?}");
            }
        }
    }

    #[test]
    fn fitting_content_is_complete_and_ordered() {
        let content = "One two three. Four five six seven! Eight nine ten eleven twelve";
        let f = layout("t", content, 16, 6);
        assert!(!f.truncated);
        assert_eq!(non_ws(&f.body_lines.concat()), non_ws(content));
    }

    #[test]
    fn dense_fallback_keeps_content_within_capacity() {
        // Word breaks would need three lines; raw capacity is ten chars.
        let content = "ab cdefgh";
        let f = layout("t", content, 5, 2);
        assert!(!f.truncated);
        assert_eq!(f.body_lines.len(), 2);
        assert_eq!(non_ws(&f.body_lines.concat()), non_ws(content));
    }

    #[test]
    fn overflow_sets_flag_and_indicator() {
        let content = "word ".repeat(40);
        let f = layout("t", &content, 10, 4);
        assert!(f.truncated);
        assert_eq!(f.body_lines.len(), 4);
        assert_eq!(f.body_lines.last().map(String::as_str), Some(TRUNCATION_INDICATOR));
    }

    #[test]
    fn whitespace_dropped_at_breaks_is_not_truncation() {
        // Fifteen chars against a capacity of ten; only spaces fall between the lines.
        let f = layout("t", "abcde     fghij", 5, 2);
        assert_eq!(f.body_lines, vec!["abcde", "fghij"]);
        assert!(!f.truncated);

        let f = layout("t", "abcde     fghijk", 5, 2);
        assert!(f.truncated);
        assert_eq!(f.body_lines, vec!["abcde", TRUNCATION_INDICATOR]);
    }

    #[test]
    fn line_count_never_exceeds_capacity() {
        for lines in 1..6 {
            for width in 1..12 {
                let f = layout("t", "lorem ipsum dolor sit amet, consectetur adipiscing elit", width, lines);
                assert!(f.body_lines.len() <= lines);
                assert!(f.body_lines.iter().all(|l| l.chars().count() <= width));
            }
        }
    }

    #[test]
    fn newlines_and_runs_of_space_collapse_between_lines() {
        let f = layout("t", "first line\n\n\nsecond    line", 11, 5);
        assert_eq!(f.body_lines, vec!["first line", "second", "line"]);
    }

    #[test]
    fn empty_and_degenerate_geometry() {
        let f = layout("t", "", 10, 3);
        assert!(f.body_lines.is_empty());
        assert!(!f.truncated);

        let f = layout("t", "abc", 10, 0);
        assert!(f.body_lines.is_empty());
        assert!(f.truncated);
    }
}
