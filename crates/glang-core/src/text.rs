//! String helpers shared by the lexer, diagnostics and the string builtins.

use std::fmt::Write;

/// Escape `text` so it can be pasted back into a glang string literal.
///
/// With `single_quoted` the result is meant for a `'...'` literal, so single
/// quotes are escaped and double quotes are left alone. Control characters
/// use the shortest hex escape that fits.
pub fn escape(text: &str, single_quoted: bool) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    for c in text.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            '\'' if single_quoted => out.push_str("\\'"),
            '"' if !single_quoted => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if !c.is_control() => out.push(c),
            c => {
                let code = c as u32;
                // Writing into a String cannot fail.
                let _ = match code {
                    0..=0xff => write!(out, "\\x{code:02x}"),
                    0x100..=0xffff => write!(out, "\\u{code:04x}"),
                    _ => write!(out, "\\U{code:08x}"),
                };
            }
        }
    }
    out
}

/// The `index`th line of `text` (0-based), or an empty string.
pub fn get_line(text: &str, index: usize) -> &str {
    text.lines().nth(index).unwrap_or("")
}

/// Render a double the way script output shows it: integral values keep a
/// trailing `.0`.
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{value:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_by_flavor() {
        assert_eq!(escape("it's \"x\"", false), "it's \\\"x\\\"");
        assert_eq!(escape("it's \"x\"", true), "it\\'s \"x\"");
    }

    #[test]
    fn escapes_control_characters() {
        assert_eq!(escape("a\tb\n\\", false), "a\\tb\\n\\\\");
        assert_eq!(escape("\u{1}", false), "\\x01");
        assert_eq!(escape("\u{7f}", false), "\\x7f");
        assert_eq!(escape("\u{85}", false), "\\x85");
    }

    #[test]
    fn get_line_out_of_range_is_empty() {
        assert_eq!(get_line("a\nb\nc", 1), "b");
        assert_eq!(get_line("a", 3), "");
    }

    #[test]
    fn doubles_keep_fraction() {
        assert_eq!(format_double(8.0), "8.0");
        assert_eq!(format_double(0.5), "0.5");
        assert_eq!(format_double(f64::NAN), "NaN");
    }
}
