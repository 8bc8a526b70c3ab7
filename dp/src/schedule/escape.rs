//! Debug-wrapper stripping and backslash unescaping
//!
//! Completion text sometimes arrives as the printed representation of a
//! content block, e.g. `TextBlock(text="# Day Planner\n- [ ] ...")`, with the
//! real newlines turned into `\n` escapes. These helpers recover plain text.

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::CharIndices;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use super::ScheduleError;

/// `Label(text="...")` or `Label(text='...')`, optionally followed by more
/// keyword arguments such as `, type='text'`
static DEBUG_WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)[A-Za-z_][A-Za-z0-9_]*\(text=(?:"(?P<dq>.*?)"|'(?P<sq>.*?)')(?:,\s*[A-Za-z_][A-Za-z0-9_]*=(?:'[^']*'|"[^"]*"|[^,)]*))*\)"#,
    )
    .expect("debug wrapper pattern is valid")
});

/// Replace every labeled text wrapper with its inner text
///
/// Returns `None` when the text carries no wrapper.
pub fn strip_debug_wrapper(text: &str) -> Option<String> {
    debug!(text_len = text.len(), "strip_debug_wrapper: called");
    let stripped = DEBUG_WRAPPER.replace_all(text, |caps: &Captures| {
        caps.name("dq")
            .or_else(|| caps.name("sq"))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    });
    match stripped {
        Cow::Borrowed(_) => None,
        Cow::Owned(inner) => Some(inner),
    }
}

/// Unwrapped text is an escaped representation when it is still a single
/// line carrying backslash escapes.
///
/// Text that already has real newlines was decoded before (or never encoded),
/// so it is left alone.
pub fn is_escaped(text: &str) -> bool {
    !text.contains('\n') && text.contains('\\')
}

/// Decode backslash escape sequences into literal characters
///
/// Unknown escapes are kept as written. Truncated or out-of-range numeric
/// escapes and a trailing lone backslash are errors.
pub fn unescape(text: &str) -> Result<String, ScheduleError> {
    debug!(text_len = text.len(), "unescape: called");
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some((_, esc)) = chars.next() else {
            return Err(ScheduleError::Unescape {
                position,
                reason: "trailing backslash".to_string(),
            });
        };

        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'v' => out.push('\u{0B}'),
            '\n' => {}
            '0'..='7' => out.push(read_octal(esc, &mut chars)),
            'x' => out.push(read_hex(position, 'x', 2, &mut chars)?),
            'u' => out.push(read_hex(position, 'u', 4, &mut chars)?),
            'U' => out.push(read_hex(position, 'U', 8, &mut chars)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Ok(out)
}

fn read_octal(first: char, chars: &mut Peekable<CharIndices<'_>>) -> char {
    let mut value = first.to_digit(8).unwrap_or(0);
    for _ in 0..2 {
        match chars.peek().and_then(|(_, c)| c.to_digit(8)) {
            Some(digit) => {
                value = value * 8 + digit;
                chars.next();
            }
            None => break,
        }
    }
    // at most 0o777, always a valid scalar value
    char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn read_hex(
    position: usize,
    kind: char,
    width: usize,
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<char, ScheduleError> {
    let mut digits = String::with_capacity(width);
    for _ in 0..width {
        match chars.peek() {
            Some((_, c)) if c.is_ascii_hexdigit() => {
                digits.push(*c);
                chars.next();
            }
            _ => {
                return Err(ScheduleError::Unescape {
                    position,
                    reason: format!("truncated \\{}XX escape", kind),
                });
            }
        }
    }

    u32::from_str_radix(&digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| ScheduleError::Unescape {
            position,
            reason: format!("\\{}{} is not a valid character", kind, digits),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_double_quoted_wrapper() {
        let raw = r##"TextBlock(text="# Day Planner\n- [ ] [9:00am-11:00am] Task A")"##;
        assert_eq!(
            strip_debug_wrapper(raw).as_deref(),
            Some(r"# Day Planner\n- [ ] [9:00am-11:00am] Task A")
        );
    }

    #[test]
    fn test_strip_single_quoted_wrapper_with_kwargs() {
        let raw = "[TextBlock(text='# Day Planner\\nWork', type='text')]";
        assert_eq!(strip_debug_wrapper(raw).as_deref(), Some("[# Day Planner\\nWork]"));
    }

    #[test]
    fn test_strip_leaves_plain_text_alone() {
        let plain = "# Day Planner\n- [ ] [9:00am-10:00am] Email (text review)";
        assert_eq!(strip_debug_wrapper(plain), None);
        assert_eq!(strip_debug_wrapper(r"# Day Planner - [ ] copy C:\tmp"), None);
    }

    #[test]
    fn test_unescape_common_sequences() {
        assert_eq!(unescape(r"a\nb\tc").unwrap(), "a\nb\tc");
        assert_eq!(unescape(r#"I\'m \"here\""#).unwrap(), "I'm \"here\"");
        assert_eq!(unescape(r"back\\slash").unwrap(), "back\\slash");
    }

    #[test]
    fn test_unescape_numeric_sequences() {
        assert_eq!(unescape(r"\x41\u00e9\U0001F3AF").unwrap(), "Aé🎯");
        assert_eq!(unescape(r"\101").unwrap(), "A");
    }

    #[test]
    fn test_unescape_keeps_unknown_escapes() {
        assert_eq!(unescape(r"C:\qux").unwrap(), r"C:\qux");
    }

    #[test]
    fn test_unescape_trailing_backslash_is_error() {
        let err = unescape("oops\\").unwrap_err();
        assert!(matches!(err, ScheduleError::Unescape { position: 4, .. }));
    }

    #[test]
    fn test_unescape_truncated_hex_is_error() {
        assert!(unescape(r"\x4").is_err());
        assert!(unescape(r"\uZZZZ").is_err());
    }

    #[test]
    fn test_unescape_surrogate_is_error() {
        assert!(unescape(r"\ud800").is_err());
    }

    #[test]
    fn test_is_escaped() {
        assert!(is_escaped(r"# Day Planner\n- [ ] task"));
        assert!(!is_escaped("# Day Planner\n- [ ] task"));
        assert!(!is_escaped("# Day Planner"));
    }
}
