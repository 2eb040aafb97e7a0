//! Escape-aware text measurement used as the default Line Cache backend.
//!
//! Frames arrive already styled, so widths must skip SGR/CSI/OSC sequences and
//! truncation must never split one of them or a grapheme cluster.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const ESC: u8 = 0x1B;
const RESET: &str = "\x1b[0m";

/// One piece of a styled line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Escape(&'a str),
    Text(&'a str),
}

/// Split a line into escape sequences and printable runs.
pub(crate) fn segments(line: &str) -> impl Iterator<Item = Segment<'_>> {
    let bytes = line.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        if pos >= bytes.len() {
            return None;
        }
        let start = pos;
        if bytes[pos] == ESC {
            pos = escape_end(bytes, pos);
            Some(Segment::Escape(&line[start..pos]))
        } else {
            // ESC is ASCII, so slicing at it never splits a UTF-8 sequence
            while pos < bytes.len() && bytes[pos] != ESC {
                pos += 1;
            }
            Some(Segment::Text(&line[start..pos]))
        }
    })
}

/// Byte index just past the escape sequence starting at `pos`.
fn escape_end(bytes: &[u8], pos: usize) -> usize {
    let len = bytes.len();
    let Some(&kind) = bytes.get(pos + 1) else {
        return len;
    };
    match kind {
        b'[' => {
            let mut i = pos + 2;
            while i < len {
                match bytes[i] {
                    0x40..=0x7E => return i + 1,
                    0x20..=0x3F => i += 1,
                    _ => return i,
                }
            }
            len
        }
        b']' | b'P' | b'_' | b'^' => {
            let mut i = pos + 2;
            while i < len {
                if bytes[i] == 0x07 {
                    return i + 1;
                }
                if bytes[i] == ESC && bytes.get(i + 1) == Some(&b'\\') {
                    return i + 2;
                }
                i += 1;
            }
            len
        }
        // Two-byte escape; step over a whole char in case it is not ASCII
        _ => {
            let mut i = pos + 2;
            while i < len && (bytes[i] & 0xC0) == 0x80 {
                i += 1;
            }
            i
        }
    }
}

/// Terminal cell width of a line, ignoring escape sequences.
pub fn display_width(line: &str) -> usize {
    segments(line)
        .map(|segment| match segment {
            Segment::Text(text) => text.width(),
            Segment::Escape(_) => 0,
        })
        .sum()
}

/// Cut a line to at most `max_width` cells.
///
/// Escape sequences before the cut are kept; if any were present a reset is
/// appended so styling does not bleed into the padding that follows.
pub fn truncate_to_width(line: &str, max_width: usize) -> String {
    let mut out = String::with_capacity(line.len().min(max_width * 4 + 16));
    let mut used = 0;
    let mut styled = false;

    'outer: for segment in segments(line) {
        match segment {
            Segment::Escape(seq) => {
                styled = true;
                out.push_str(seq);
            }
            Segment::Text(text) => {
                for grapheme in text.graphemes(true) {
                    let w = grapheme.width();
                    if used + w > max_width {
                        break 'outer;
                    }
                    out.push_str(grapheme);
                    used += w;
                }
            }
        }
    }

    if styled {
        out.push_str(RESET);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_width() {
        assert_eq!(display_width("hello"), 5);
        assert_eq!(display_width(""), 0);
        assert_eq!(display_width("你好"), 4);
    }

    #[test]
    fn test_width_skips_escapes() {
        assert_eq!(display_width("\x1b[31mred\x1b[0m"), 3);
        assert_eq!(display_width("\x1b]8;;http://x\x07link\x1b]8;;\x07"), 4);
    }

    #[test]
    fn test_segments() {
        let parts: Vec<_> = segments("a\x1b[1mb").collect();
        assert_eq!(
            parts,
            vec![Segment::Text("a"), Segment::Escape("\x1b[1m"), Segment::Text("b")]
        );
    }

    #[test]
    fn test_truncate_plain() {
        assert_eq!(truncate_to_width("hello world", 5), "hello");
        assert_eq!(truncate_to_width("hi", 5), "hi");
        assert_eq!(truncate_to_width("hello", 0), "");
    }

    #[test]
    fn test_truncate_wide_chars_at_boundary() {
        // "你" fits in 3 cells, "好" would need 2 more
        assert_eq!(truncate_to_width("你好世界", 3), "你");
    }

    #[test]
    fn test_truncate_keeps_escapes_and_resets() {
        let out = truncate_to_width("\x1b[31mabcdef\x1b[0m", 3);
        assert_eq!(out, "\x1b[31mabc\x1b[0m");
        assert_eq!(display_width(&out), 3);
    }

    #[test]
    fn test_truncate_does_not_split_graphemes() {
        let accented = "e\u{301}e\u{301}";
        assert_eq!(truncate_to_width(accented, 1), "e\u{301}");
    }

    #[test]
    fn test_unterminated_escape() {
        assert_eq!(display_width("ab\x1b[31"), 2);
        assert_eq!(display_width("ab\x1b"), 2);
    }
}
