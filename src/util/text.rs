use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Calculates the display width of a string in terminal columns.
///
/// CJK characters and most emoji take two columns, combining marks none.
///
/// ```
/// use scholar::util::display_width;
///
/// assert_eq!(display_width("Fees"), 4);
/// assert_eq!(display_width("你好"), 4);
/// ```
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Truncates `s` to at most `max_width` columns, ending in "..." when cut.
///
/// Widths too narrow for a character plus the ellipsis get a plain prefix
/// instead. Returns the input borrowed when it already fits.
///
/// ```
/// use scholar::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Placements", 20), "Placements");
/// assert_eq!(truncate_to_width("College Predictions", 10), "College...");
/// assert_eq!(truncate_to_width("Fees", 2), "Fe");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width <= ELLIPSIS_WIDTH {
        return Cow::Owned(prefix_within(s, max_width).to_string());
    }
    let head = prefix_within(s, max_width - ELLIPSIS_WIDTH);
    Cow::Owned(format!("{}{}", head, ELLIPSIS))
}

/// Longest prefix of `s` that fits in `width` columns.
fn prefix_within(s: &str, width: usize) -> &str {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width {
            return &s[..idx];
        }
        used += w;
    }
    s
}

/// Strip terminal control characters and ANSI escape sequences.
///
/// Assistant replies are remote text drawn straight into the terminal, so
/// anything that could move the cursor or retitle the window is dropped.
/// Tab, newline and carriage return survive.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let needs_strip = s
        .bytes()
        .any(|b| b == 0x1b || b == 0x7f || (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r')));
    if !needs_strip {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\u{1b}' => match chars.peek() {
                // CSI: parameters until a final byte in '@'..='~'
                Some('[') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('@'..='~').contains(&c) {
                            break;
                        }
                    }
                }
                // OSC: until BEL or ESC '\'
                Some(']') => {
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == '\u{7}' {
                            break;
                        }
                        if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            '\t' | '\n' | '\r' => out.push(c),
            c if c.is_ascii_control() => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation() {
        assert_eq!(truncate_to_width("Scholarships", 12), "Scholarships");
        assert_eq!(truncate_to_width("Scholarships", 8), "Schol...");
        assert_eq!(truncate_to_width("Scholarships", 0), "");
        assert_eq!(truncate_to_width("Scholarships", 3), "Sch");
    }

    #[test]
    fn test_wide_chars_never_overflow() {
        let out = truncate_to_width("你好世界", 7);
        assert_eq!(out, "你好...");
        assert!(display_width(&out) <= 7);

        // A two-column char that doesn't fit in one column is dropped.
        assert_eq!(truncate_to_width("你好", 1), "");
    }

    #[test]
    fn test_strip_clean_text_is_borrowed() {
        let s = "What are the tuition fees?\n";
        assert!(matches!(strip_control_chars(s), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_escape_sequences() {
        assert_eq!(strip_control_chars("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(strip_control_chars("\x1b]0;title\x07after"), "after");
        assert_eq!(strip_control_chars("\x1b]0;title\x1b\\after"), "after");
        assert_eq!(strip_control_chars("a\x00b\x7fc\td"), "abc\td");
    }

    #[test]
    fn test_strip_keeps_unicode() {
        assert_eq!(strip_control_chars("café\x1b[1m 你好"), "café 你好");
    }
}
