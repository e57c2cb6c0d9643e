use std::borrow::Cow;

/// Calculates the 1-based line and column number for a byte offset in the
/// source. Columns count characters, not bytes. This is meant to be called
/// only when an error is reported, as it walks the source from the start.
pub fn line_and_column(source: &[u8], offset: usize) -> (usize, usize) {
    let end = offset.min(source.len());
    let prefix = String::from_utf8_lossy(&source[..end]);
    let mut line = 1;
    let mut column = 1;
    for c in prefix.chars() {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Decodes the escape sequences of raw JSON string content.
///
/// Unpaired surrogates decode to U+FFFD. Unknown escapes are kept verbatim,
/// backslash included.
pub fn decode_string(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let high = read_hex4(&mut chars);
                let decoded = match high {
                    Some(h @ 0xD800..=0xDBFF) => {
                        let mut lookahead = chars.clone();
                        if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
                            match read_hex4(&mut lookahead) {
                                Some(l @ 0xDC00..=0xDFFF) => {
                                    chars = lookahead;
                                    char::from_u32(0x10000 + ((h - 0xD800) << 10) + (l - 0xDC00))
                                }
                                _ => None,
                            }
                        } else {
                            None
                        }
                    }
                    Some(code) => char::from_u32(code),
                    None => None,
                };
                out.push(decoded.unwrap_or('\u{FFFD}'));
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

fn read_hex4(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<u32> {
    let mut code = 0;
    for _ in 0..4 {
        let digit = chars.next()?.to_digit(16)?;
        code = code * 16 + digit;
    }
    Some(code)
}

/// Escapes plain text into raw JSON string content (without quotes).
pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_column() {
        let source = b"{\n  \"a\": x\n}";
        assert_eq!(line_and_column(source, 0), (1, 1));
        assert_eq!(line_and_column(source, 9), (2, 8));
        assert_eq!(line_and_column(source, 999), (3, 2));
    }

    #[test]
    fn test_decode_escapes() {
        assert_eq!(decode_string(r#"a\"b\\c\/d\n"#), "a\"b\\c/d\n");
        assert_eq!(decode_string(r"\u00e9"), "é");
        assert_eq!(decode_string(r"\ud83d\ude00"), "😀");
        assert_eq!(decode_string(r"\ud83d!"), "\u{FFFD}!");
        assert_eq!(decode_string(r"\q"), "\\q");
        assert!(matches!(decode_string("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_escape_inverts_decode() {
        let text = "tab\there \"quoted\" \u{1} back\\slash";
        assert_eq!(decode_string(&escape_string(text)), text);
        assert_eq!(escape_string("\u{1}"), "\\u0001");
    }
}
