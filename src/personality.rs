use crate::error::ParseError;
use crate::event::{Event, EventKind};
use crate::parser::Scanner;

/// The lexical rules of one JSON dialect, driven by the event parser.
///
/// Structural recursion lives in the default methods and is shared; [`Strict`]
/// and [`Relaxed`] override only the leaf rules that differ.
///
/// ```text
/// Strict   number  ::= "-"? ("0" | [1-9][0-9]*) ("." [0-9]+)? ([eE] [+-]? [0-9]+)?
///          key     ::= string
/// Relaxed  number  ::= [+-]? ( "0" [xX] hex+ | "0" [bB] bin+ | "0" oct+
///                            | ("0" | [1-9][0-9]*) ("." [0-9]*)? ([eE] [+-]? [0-9]*)? )
///          key     ::= string | [A-Za-z_][A-Za-z0-9_]*
///          comment ::= "#" ... end of line
/// ```
///
/// Every method starts at the scanner's current position and leaves the
/// scanner just past what it consumed. Methods that recognise a token emit
/// exactly one event for it.
pub trait Personality {
    /// Name used in logs and diagnostics.
    const NAME: &'static str;

    fn skip_whitespace(&self, s: &mut Scanner<'_>);

    fn parse_number<'a, F>(&self, s: &mut Scanner<'a>, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>);

    fn parse_key<'a, F>(&self, s: &mut Scanner<'a>, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>);

    /// Called when no known value grammar matches the leading byte.
    fn parse_unknown<'a, F>(&self, s: &mut Scanner<'a>, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>);

    /// Exact, case-sensitive match of `true`, `false` or `null`.
    ///
    /// Fewer remaining bytes than the literal is an overrun; any other
    /// mismatch is a syntax fault at the first byte.
    fn parse_literal<'a, F>(
        &self,
        s: &mut Scanner<'a>,
        expected: &'static [u8],
        kind: EventKind,
        emit: &mut F,
    ) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>),
    {
        let start = s.position();
        let rest = s.remaining();
        if rest.len() < expected.len() {
            return Err(ParseError::overrun(s.len(), literal_name(expected)));
        }
        if &rest[..expected.len()] != expected {
            return Err(ParseError::syntax(start, literal_name(expected)));
        }
        s.advance(expected.len());
        emit(s.event(kind, start));
        Ok(())
    }

    /// A quoted string, reported raw with both quotes. Escapes are checked
    /// for shape only and never decoded.
    fn parse_string<'a, F>(&self, s: &mut Scanner<'a>, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>),
    {
        let start = s.position();
        s.expect_byte(b'"', "'\"'")?;
        loop {
            match s.peek() {
                None => return Err(ParseError::overrun(s.len(), "a closing '\"'")),
                Some(b'"') => {
                    s.bump();
                    break;
                }
                Some(b'\\') => {
                    s.bump();
                    match s.peek() {
                        None => return Err(ParseError::overrun(s.len(), "an escape character")),
                        Some(b'u') => {
                            s.bump();
                            for _ in 0..4 {
                                match s.peek() {
                                    None => {
                                        return Err(ParseError::overrun(s.len(), "a hex digit"))
                                    }
                                    Some(c) if c.is_ascii_hexdigit() => s.bump(),
                                    Some(_) => {
                                        return Err(ParseError::syntax(s.position(), "a hex digit"))
                                    }
                                }
                            }
                        }
                        Some(_) => s.bump(),
                    }
                }
                Some(c) if c < 0x20 => {
                    return Err(ParseError::syntax(s.position(), "a string character"));
                }
                Some(_) => s.bump(),
            }
        }
        emit(s.event(EventKind::String, start));
        Ok(())
    }

    /// Dispatches on the leading byte of a value.
    fn parse_value<'a, F>(&self, s: &mut Scanner<'a>, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>),
    {
        match s.peek() {
            None => s.err_unexpected("a value"),
            Some(b'+' | b'-' | b'0'..=b'9') => self.parse_number(s, emit),
            Some(b'"') => self.parse_string(s, emit),
            Some(b't') => self.parse_literal(s, b"true", EventKind::Boolean, emit),
            Some(b'f') => self.parse_literal(s, b"false", EventKind::Boolean, emit),
            Some(b'n') => self.parse_literal(s, b"null", EventKind::None, emit),
            Some(b'[') => self.parse_array(s, emit),
            Some(b'{') => self.parse_object(s, emit),
            Some(_) => self.parse_unknown(s, emit),
        }
    }

    /// Array ::= "[" [ Value { "," Value } ] "]"
    fn parse_array<'a, F>(&self, s: &mut Scanner<'a>, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>),
    {
        let start = s.position();
        s.enter()?;
        s.expect_byte(b'[', "'['")?;
        emit(s.event(EventKind::ArrayBegin, start));

        self.skip_whitespace(s);
        if s.peek() != Some(b']') {
            loop {
                self.parse_value(s, emit)?;
                self.skip_whitespace(s);
                match s.peek() {
                    Some(b',') => {
                        s.bump();
                        self.skip_whitespace(s);
                        if s.peek() == Some(b']') {
                            return Err(ParseError::syntax(s.position(), "a value after ','"));
                        }
                    }
                    Some(b']') => break,
                    _ => return s.err_unexpected("',' or ']'"),
                }
            }
        }

        let end = s.position();
        s.expect_byte(b']', "']'")?;
        emit(s.event(EventKind::ArrayEnd, end));
        s.leave();
        Ok(())
    }

    /// Object ::= "{" [ Member { "," Member } ] "}"
    /// Member ::= Key ":" Value
    fn parse_object<'a, F>(&self, s: &mut Scanner<'a>, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>),
    {
        let start = s.position();
        s.enter()?;
        s.expect_byte(b'{', "'{'")?;
        emit(s.event(EventKind::ObjectBegin, start));

        self.skip_whitespace(s);
        if s.peek() != Some(b'}') {
            loop {
                self.parse_key(s, emit)?;
                self.skip_whitespace(s);
                s.expect_byte(b':', "':' after key")?;
                self.skip_whitespace(s);
                self.parse_value(s, emit)?;
                self.skip_whitespace(s);
                match s.peek() {
                    Some(b',') => {
                        s.bump();
                        self.skip_whitespace(s);
                        if s.peek() == Some(b'}') {
                            return Err(ParseError::syntax(s.position(), "a key after ','"));
                        }
                    }
                    Some(b'}') => break,
                    _ => return s.err_unexpected("',' or '}'"),
                }
            }
        }

        let end = s.position();
        s.expect_byte(b'}', "'}'")?;
        emit(s.event(EventKind::ObjectEnd, end));
        s.leave();
        Ok(())
    }
}

/// Standard JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Strict;

impl Personality for Strict {
    const NAME: &'static str = "strict";

    fn skip_whitespace(&self, s: &mut Scanner<'_>) {
        s.take_while(is_json_whitespace);
    }

    fn parse_number<'a, F>(&self, s: &mut Scanner<'a>, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>),
    {
        let start = s.position();
        if s.peek() == Some(b'-') {
            s.bump();
        }
        match s.peek() {
            Some(b'0') => s.bump(),
            Some(b'1'..=b'9') => {
                s.take_while(|c| c.is_ascii_digit());
            }
            _ => return s.err_unexpected("a digit"),
        }
        if s.peek() == Some(b'.') {
            s.bump();
            require_run(s, |c| c.is_ascii_digit(), "a fraction digit")?;
        }
        if matches!(s.peek(), Some(b'e' | b'E')) {
            s.bump();
            if matches!(s.peek(), Some(b'+' | b'-')) {
                s.bump();
            }
            require_run(s, |c| c.is_ascii_digit(), "an exponent digit")?;
        }
        finish_number(s, start, emit)
    }

    fn parse_key<'a, F>(&self, s: &mut Scanner<'a>, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>),
    {
        if s.peek() == Some(b'"') {
            self.parse_string(s, emit)
        } else {
            s.err_unexpected("a quoted key")
        }
    }

    fn parse_unknown<'a, F>(&self, s: &mut Scanner<'a>, _emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>),
    {
        s.err_unexpected("a value")
    }
}

/// JSON plus `+` signs, radix literals, bare identifiers and `#` comments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relaxed;

impl Personality for Relaxed {
    const NAME: &'static str = "relaxed";

    fn skip_whitespace(&self, s: &mut Scanner<'_>) {
        loop {
            s.take_while(is_json_whitespace);
            if s.peek() != Some(b'#') {
                break;
            }
            s.take_while(|c| c != b'\n');
        }
    }

    fn parse_number<'a, F>(&self, s: &mut Scanner<'a>, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>),
    {
        let start = s.position();
        if matches!(s.peek(), Some(b'+' | b'-')) {
            s.bump();
        }
        match s.peek() {
            Some(b'0') => {
                s.bump();
                match s.peek() {
                    Some(b'x' | b'X') => {
                        s.bump();
                        require_run(s, |c| c.is_ascii_hexdigit(), "a hex digit")?;
                        return finish_number(s, start, emit);
                    }
                    Some(b'b' | b'B') => {
                        s.bump();
                        require_run(s, |c| c == b'0' || c == b'1', "a binary digit")?;
                        return finish_number(s, start, emit);
                    }
                    Some(b'0'..=b'7') => {
                        s.take_while(|c| (b'0'..=b'7').contains(&c));
                        return finish_number(s, start, emit);
                    }
                    _ => {}
                }
            }
            Some(b'1'..=b'9') => {
                s.take_while(|c| c.is_ascii_digit());
            }
            _ => return s.err_unexpected("a digit"),
        }
        if s.peek() == Some(b'.') {
            s.bump();
            s.take_while(|c| c.is_ascii_digit());
        }
        if matches!(s.peek(), Some(b'e' | b'E')) {
            s.bump();
            if matches!(s.peek(), Some(b'+' | b'-')) {
                s.bump();
            }
            s.take_while(|c| c.is_ascii_digit());
        }
        finish_number(s, start, emit)
    }

    fn parse_key<'a, F>(&self, s: &mut Scanner<'a>, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>),
    {
        match s.peek() {
            Some(b'"') => self.parse_string(s, emit),
            Some(c) if is_identifier_start(c) => parse_identifier(s, emit),
            _ => s.err_unexpected("a quoted or bare key"),
        }
    }

    fn parse_unknown<'a, F>(&self, s: &mut Scanner<'a>, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>),
    {
        match s.peek() {
            Some(c) if is_identifier_start(c) => parse_identifier(s, emit),
            _ => s.err_unexpected("a value"),
        }
    }

    /// Literals are identifiers that happen to spell `true`, `false` or
    /// `null`; anything else starting with `t`, `f` or `n` is a bare word.
    fn parse_literal<'a, F>(
        &self,
        s: &mut Scanner<'a>,
        expected: &'static [u8],
        kind: EventKind,
        emit: &mut F,
    ) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>),
    {
        let start = s.position();
        s.take_while(is_identifier_continue);
        let word = &s.input()[start..s.position()];
        if word == expected {
            emit(s.event(kind, start));
        } else if s.is_at_end() && expected.starts_with(word) {
            return Err(ParseError::overrun(s.len(), literal_name(expected)));
        } else {
            emit(s.event(EventKind::String, start));
        }
        Ok(())
    }
}

fn is_json_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_identifier_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn literal_name(expected: &'static [u8]) -> &'static str {
    match expected {
        b"true" => "`true`",
        b"false" => "`false`",
        _ => "`null`",
    }
}

/// Consumes a non-empty run of bytes matching `pred`.
fn require_run(
    s: &mut Scanner<'_>,
    pred: impl Fn(u8) -> bool,
    expected: &str,
) -> Result<(), ParseError> {
    if s.take_while(pred) == 0 {
        return s.err_unexpected(expected);
    }
    Ok(())
}

/// A number has to end at a token boundary: `01`, `0x1` or `1.2.3` are not
/// one number followed by something else.
fn finish_number<'a, F>(s: &mut Scanner<'a>, start: usize, emit: &mut F) -> Result<(), ParseError>
where
    F: FnMut(Event<'a>),
{
    if let Some(c) = s.peek() {
        if is_identifier_continue(c) || c == b'.' {
            return Err(ParseError::syntax(s.position(), "a delimiter after the number"));
        }
    }
    emit(s.event(EventKind::Number, start));
    Ok(())
}

fn parse_identifier<'a, F>(s: &mut Scanner<'a>, emit: &mut F) -> Result<(), ParseError>
where
    F: FnMut(Event<'a>),
{
    let start = s.position();
    s.take_while(is_identifier_continue);
    emit(s.event(EventKind::String, start));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserOptions;

    fn run<P: Personality>(p: P, input: &str) -> Result<Vec<(EventKind, String)>, ParseError> {
        let mut s = Scanner::new(input.as_bytes(), ParserOptions::default());
        let mut out = Vec::new();
        p.parse_value(&mut s, &mut |e: Event<'_>| {
            out.push((e.kind, e.as_str_lossy().into_owned()))
        })?;
        Ok(out)
    }

    #[test]
    fn test_number_stops_at_delimiter() {
        let out = run(Strict, "-12.5e-3,").unwrap();
        assert_eq!(out, vec![(EventKind::Number, "-12.5e-3".to_string())]);
    }

    #[test]
    fn test_strict_number_faults() {
        assert!(matches!(run(Strict, "-x"), Err(ParseError::Syntax { offset: 1, .. })));
        assert!(matches!(run(Strict, "+1"), Err(ParseError::Syntax { offset: 0, .. })));
        assert!(matches!(run(Strict, "1e+"), Err(ParseError::Overrun { offset: 3, .. })));
        assert!(matches!(run(Strict, "00"), Err(ParseError::Syntax { offset: 1, .. })));
    }

    #[test]
    fn test_relaxed_radix_runs() {
        assert_eq!(run(Relaxed, "0x1F]").unwrap()[0].1, "0x1F");
        assert_eq!(run(Relaxed, "-0b11 ").unwrap()[0].1, "-0b11");
        assert_eq!(run(Relaxed, "0755,").unwrap()[0].1, "0755");
        assert!(matches!(run(Relaxed, "08"), Err(ParseError::Syntax { offset: 1, .. })));
        assert!(matches!(run(Relaxed, "0xg"), Err(ParseError::Syntax { offset: 2, .. })));
    }

    #[test]
    fn test_relaxed_comment_only_whitespace() {
        let mut s = Scanner::new(b"  # one\n# two\n  7", ParserOptions::default());
        Relaxed.skip_whitespace(&mut s);
        assert_eq!(s.peek(), Some(b'7'));

        let mut s = Scanner::new(b"# unterminated", ParserOptions::default());
        Relaxed.skip_whitespace(&mut s);
        assert!(s.is_at_end());
    }

    #[test]
    fn test_relaxed_literal_prefix_word() {
        let out = run(Relaxed, "nullable").unwrap();
        assert_eq!(out, vec![(EventKind::String, "nullable".to_string())]);
        let out = run(Relaxed, "false]").unwrap();
        assert_eq!(out, vec![(EventKind::Boolean, "false".to_string())]);
    }

    #[test]
    fn test_strict_literal_is_byte_exact() {
        assert!(matches!(run(Strict, "fals"), Err(ParseError::Overrun { offset: 4, .. })));
        assert!(matches!(run(Strict, "falsy"), Err(ParseError::Syntax { offset: 0, .. })));
    }

    #[test]
    fn test_relaxed_key_forms() {
        let out = run(Relaxed, r#"{a_1: 1, "b": 2}"#).unwrap();
        let keys: Vec<_> = out
            .iter()
            .filter(|(k, _)| *k == EventKind::String)
            .map(|(_, t)| t.as_str())
            .collect();
        assert_eq!(keys, vec!["a_1", "\"b\""]);
        assert!(matches!(run(Relaxed, "{1: 2}"), Err(ParseError::Syntax { offset: 1, .. })));
    }
}
