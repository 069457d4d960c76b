//! # Text helpers
//!
//! Line splitting and frame building shared by the renderer and render
//! callbacks, plus the byte-cursor editing used by every free-text field
//! (text and password values, select filters).

use unicode_width::UnicodeWidthChar;

use super::key::{Key, KeyName};

// ============================================================================
// Value editing
// ============================================================================

/// Apply one keystroke to a text value with a byte cursor.
///
/// Backspace deletes the character before the cursor, Left/Right/Home/End
/// move it, and printable characters are inserted at it. Everything else
/// leaves the value untouched. The cursor always lands on a char boundary.
pub fn edit_value(key: &Key, value: &str, cursor: usize) -> (String, usize) {
    let mut value = value.to_string();
    let mut cursor = clamp_to_boundary(&value, cursor);

    match key.name {
        KeyName::Backspace => {
            if cursor > 0 {
                let prev = prev_char_boundary(&value, cursor);
                value.drain(prev..cursor);
                cursor = prev;
            }
        }
        KeyName::Left => cursor = prev_char_boundary(&value, cursor),
        KeyName::Right => cursor = next_char_boundary(&value, cursor),
        KeyName::Home => cursor = 0,
        KeyName::End => cursor = value.len(),
        _ => {
            if let Some(c) = key.char {
                value.insert(cursor, c);
                cursor += c.len_utf8();
            }
        }
    }

    (value, cursor)
}

fn clamp_to_boundary(s: &str, pos: usize) -> usize {
    let mut pos = pos.min(s.len());
    while !s.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Byte position of the char boundary before `pos`.
pub fn prev_char_boundary(s: &str, pos: usize) -> usize {
    s[..pos].char_indices().next_back().map(|(i, _)| i).unwrap_or(0)
}

/// Byte position of the char boundary after `pos`.
pub fn next_char_boundary(s: &str, pos: usize) -> usize {
    s[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(pos)
}

// ============================================================================
// Lines and widths
// ============================================================================

/// Split a frame into lines, treating `\r\n`, `\r` and `\n` alike.
///
/// Empty input yields one empty line. A trailing separator after a non-empty
/// line yields a final empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return vec![""];
    }

    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < bytes.len() {
        lines.push(&text[start..]);
    }

    let ends_with_separator = matches!(bytes.last(), Some(b'\r' | b'\n'));
    if ends_with_separator && lines.last().is_some_and(|line| !line.is_empty()) {
        lines.push("");
    }
    lines
}

/// Index of the first line that differs between two frames, `None` when the
/// frames are identical.
pub fn first_diff_line(old: &str, new: &str) -> Option<usize> {
    if old == new {
        return None;
    }
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let shared = old_lines.len().min(new_lines.len());
    let index = (0..shared)
        .find(|&i| old_lines[i] != new_lines[i])
        .unwrap_or(shared);
    Some(index)
}

/// Wrap a moved list index around both ends of a list of `len` items.
pub fn wrap_index(index: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    if index < 0 {
        len - 1
    } else if index as usize >= len {
        0
    } else {
        index as usize
    }
}

/// Terminal column width of `text`, ignoring ANSI SGR sequences.
pub fn display_width(text: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for c in text.chars() {
        if in_escape {
            if c == 'm' {
                in_escape = false;
            }
            continue;
        }
        if c == '\x1b' {
            in_escape = true;
            continue;
        }
        width += c.width().unwrap_or(0);
    }
    width
}

// ============================================================================
// Frame building
// ============================================================================

/// String builder for render callbacks; every line ends in `\r\n`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrameBuilder {
    buf: String,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_ln(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.buf.push_str(line.as_ref());
        self.buf.push_str("\r\n");
        self
    }

    pub fn write_lines<I, L>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        for line in lines {
            self.write_ln(line);
        }
        self
    }

    pub fn remove_trailing_crlf(&mut self) -> &mut Self {
        if self.buf.ends_with("\r\n") {
            self.buf.truncate(self.buf.len() - 2);
        }
        self
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn build(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_basic() {
        assert_eq!(split_lines(""), vec![""]);
        assert_eq!(split_lines("Hello"), vec!["Hello"]);
        assert_eq!(split_lines("Hello\n"), vec!["Hello", ""]);
        assert_eq!(split_lines("\nHello"), vec!["", "Hello"]);
        assert_eq!(split_lines("\nHello\n"), vec!["", "Hello", ""]);
    }

    #[test]
    fn test_split_lines_mixed_separators() {
        let expected = vec!["Line 1", "Line 2", "Line 3"];
        assert_eq!(split_lines("Line 1\nLine 2\nLine 3"), expected);
        assert_eq!(split_lines("Line 1\r\nLine 2\r\nLine 3"), expected);
        assert_eq!(split_lines("Line 1\r\nLine 2\nLine 3"), expected);
        assert_eq!(split_lines("Line 1\rLine 2\rLine 3\r"), vec!["Line 1", "Line 2", "Line 3", ""]);
        assert_eq!(
            split_lines("\r\nLine 1\n\nLine 2\n\nLine 3\r\n"),
            vec!["", "Line 1", "", "Line 2", "", "Line 3", ""]
        );
    }

    #[test]
    fn test_split_lines_only_separators() {
        for input in ["\n\n\n", "\r\n\r\n\r\n", "\n\r\n\r\n", "\r\n\n\r\n", "\r\n\r\n\n"] {
            assert_eq!(split_lines(input), vec!["", "", ""], "{input:?}");
        }
    }

    #[test]
    fn test_first_diff_line() {
        assert_eq!(first_diff_line("a\r\nb\r\nc", "a\r\nb\r\nc"), None);
        assert_eq!(first_diff_line("a\r\nb\r\nc", "a\r\nb\r\nd"), Some(2));
        assert_eq!(first_diff_line("a\r\nb", "a\r\nb\r\nc"), Some(2));
        assert_eq!(first_diff_line("x\nb", "a\r\nb"), Some(0));
        // Same lines, different separators
        assert_eq!(first_diff_line("a\nb", "a\r\nb"), Some(2));
    }

    #[test]
    fn test_wrap_index() {
        assert_eq!(wrap_index(-1, 3), 2);
        assert_eq!(wrap_index(3, 3), 0);
        assert_eq!(wrap_index(1, 3), 1);
        assert_eq!(wrap_index(-1, 0), 0);
    }

    #[test]
    fn test_display_width_ignores_sgr() {
        assert_eq!(display_width("\x1b[7m \x1b[27m"), 1);
        assert_eq!(display_width("\x1b[36m| foo\x1b[39m"), 5);
        assert_eq!(display_width("\x1b[32m◇\x1b[39m Foo"), 5);
        assert_eq!(display_width("日本"), 4);
    }

    #[test]
    fn test_edit_value_insert_and_delete() {
        let (value, cursor) = edit_value(&Key::char('c'), "ab", 2);
        assert_eq!((value.as_str(), cursor), ("abc", 3));

        let (value, cursor) = edit_value(&Key::named(KeyName::Backspace), "abc", 1);
        assert_eq!((value.as_str(), cursor), ("bc", 0));

        let (value, cursor) = edit_value(&Key::named(KeyName::Backspace), "abc", 0);
        assert_eq!((value.as_str(), cursor), ("abc", 0));

        let (value, cursor) = edit_value(&Key::named(KeyName::Space), "ab", 1);
        assert_eq!((value.as_str(), cursor), ("a b", 2));
    }

    #[test]
    fn test_edit_value_multibyte_cursor() {
        let (value, cursor) = edit_value(&Key::char('é'), "", 0);
        assert_eq!(cursor, 2);
        let (_, cursor) = edit_value(&Key::named(KeyName::Left), &value, cursor);
        assert_eq!(cursor, 0);
        let (_, cursor) = edit_value(&Key::named(KeyName::Right), &value, 0);
        assert_eq!(cursor, 2);
        let (value, cursor) = edit_value(&Key::named(KeyName::Backspace), &value, 2);
        assert_eq!((value.as_str(), cursor), ("", 0));
    }

    #[test]
    fn test_edit_value_ignores_non_printable() {
        for key in [
            Key::named(KeyName::Enter),
            Key::named(KeyName::Tab),
            Key::named(KeyName::Escape),
            Key::control('\u{1}'),
        ] {
            let (value, cursor) = edit_value(&key, "ab", 1);
            assert_eq!((value.as_str(), cursor), ("ab", 1));
        }
    }

    #[test]
    fn test_frame_builder() {
        let mut frame = FrameBuilder::new();
        frame.write_ln("Hello").write_ln("World");
        assert_eq!(frame.as_str(), "Hello\r\nWorld\r\n");
        frame.remove_trailing_crlf();
        assert_eq!(frame.build(), "Hello\r\nWorld");
    }
}
