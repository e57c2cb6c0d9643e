use crate::error::ParseError;
use crate::event::{Event, EventKind, Span};
use crate::personality::{Personality, Strict};
use log::trace;
use serde::{Deserialize, Serialize};

/// Nesting limit applied unless the caller asks for something else.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Parser configuration.
///
/// The reference behaviour has no nesting limit at all, which lets hostile
/// input exhaust the call stack. The default here caps nesting at
/// [`DEFAULT_MAX_DEPTH`]; `max_depth: None` restores the unbounded behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    pub max_depth: Option<usize>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// No nesting limit. Deep input recurses as deep as it is nested.
    pub fn unbounded() -> Self {
        ParserOptions { max_depth: None }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Read cursor over an immutable input buffer.
///
/// Personalities drive the cursor; it never copies or retains the input past
/// the parse call that created it.
#[derive(Debug)]
pub struct Scanner<'a> {
    input: &'a [u8],
    position: usize,
    depth: usize,
    max_depth: Option<usize>,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a [u8], options: ParserOptions) -> Self {
        Scanner {
            input,
            position: 0,
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.position.min(self.input.len())..]
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    pub fn bump(&mut self) {
        if self.position < self.input.len() {
            self.position += 1;
        }
    }

    pub fn advance(&mut self, count: usize) {
        self.position = (self.position + count).min(self.input.len());
    }

    /// Consumes bytes while `pred` holds and returns how many were consumed.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let start = self.position;
        while let Some(byte) = self.peek() {
            if !pred(byte) {
                break;
            }
            self.position += 1;
        }
        self.position - start
    }

    /// Builds the event spanning `start` up to the current position.
    pub fn event(&self, kind: EventKind, start: usize) -> Event<'a> {
        let span = Span::new(start, self.position);
        Event::new(kind, span, &self.input[start..self.position])
    }

    /// Enters one container level, failing once the depth limit is passed.
    pub fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        match self.max_depth {
            Some(limit) if self.depth > limit => {
                Err(ParseError::depth_exceeded(self.position, limit))
            }
            _ => Ok(()),
        }
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Fails at the cursor: an overrun when the input is exhausted, a syntax
    /// fault otherwise.
    pub fn err_unexpected<T>(&self, expected: &str) -> Result<T, ParseError> {
        if self.is_at_end() {
            Err(ParseError::overrun(self.input.len(), expected))
        } else {
            Err(ParseError::syntax(self.position, expected))
        }
    }

    /// Consumes `byte` or fails via [`Scanner::err_unexpected`].
    pub fn expect_byte(&mut self, byte: u8, expected: &str) -> Result<(), ParseError> {
        if self.peek() == Some(byte) {
            self.bump();
            Ok(())
        } else {
            self.err_unexpected(expected)
        }
    }
}

/// A recursive descent event parser over one byte buffer, parameterised by
/// the grammar personality.
#[derive(Debug)]
pub struct Parser<'a, P: Personality = Strict> {
    input: &'a [u8],
    personality: P,
    options: ParserOptions,
}

impl<'a> Parser<'a, Strict> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_personality(input, Strict)
    }
}

impl<'a, P: Personality> Parser<'a, P> {
    pub fn with_personality(input: &'a [u8], personality: P) -> Self {
        Parser {
            input,
            personality,
            options: ParserOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// Parses one complete value, invoking `emit` once per token in document
    /// order.
    ///
    /// Returns the offset just past the value and any whitespace that
    /// follows it. Bytes after that offset are left alone.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` at the offset where the grammar was violated;
    /// `ParseError::Overrun` when the buffer ended mid-token.
    pub fn parse<F>(&self, mut emit: F) -> Result<usize, ParseError>
    where
        F: FnMut(Event<'a>),
    {
        let mut scanner = Scanner::new(self.input, self.options);
        self.personality.skip_whitespace(&mut scanner);
        self.personality.parse_value(&mut scanner, &mut emit)?;
        self.personality.skip_whitespace(&mut scanner);
        trace!(
            "{} grammar consumed {} of {} bytes",
            P::NAME,
            scanner.position(),
            self.input.len()
        );
        Ok(scanner.position())
    }

    /// Parses one value and collects its events.
    ///
    /// # Errors
    ///
    /// Same as [`Parser::parse`].
    pub fn events(&self) -> Result<Vec<Event<'a>>, ParseError> {
        let mut events = Vec::new();
        self.parse(|event| events.push(event))?;
        Ok(events)
    }
}

/// Parses one value out of `input` with the given grammar.
///
/// # Errors
///
/// Same as [`Parser::parse`].
pub fn parse<'a, P, F>(personality: P, input: &'a [u8], emit: F) -> Result<usize, ParseError>
where
    P: Personality,
    F: FnMut(Event<'a>),
{
    Parser::with_personality(input, personality).parse(emit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personality::Relaxed;
    use EventKind as K;

    fn kinds(input: &str) -> Vec<EventKind> {
        Parser::new(input.as_bytes())
            .events()
            .unwrap_or_else(|err| panic!("{input:?} failed: {err}"))
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    fn strict_err(input: &str) -> ParseError {
        match Parser::new(input.as_bytes()).events() {
            Ok(events) => panic!("{input:?} parsed into {events:?}"),
            Err(err) => err,
        }
    }

    fn relaxed_texts(input: &str) -> Vec<String> {
        Parser::with_personality(input.as_bytes(), Relaxed)
            .events()
            .unwrap_or_else(|err| panic!("{input:?} failed: {err}"))
            .iter()
            .map(|e| e.as_str_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_single_number() {
        let events = Parser::new(b"1").events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, K::Number);
        assert_eq!(events[0].span, Span::new(0, 1));
        assert_eq!(events[0].text, b"1");
    }

    #[test]
    fn test_full_number_token() {
        let events = Parser::new(b"-1.0e+1").events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].span, Span::new(0, 7));
    }

    #[test]
    fn test_array_events() {
        assert_eq!(kinds("[1,2]"), vec![K::ArrayBegin, K::Number, K::Number, K::ArrayEnd]);
        assert_eq!(kinds("[ ]"), vec![K::ArrayBegin, K::ArrayEnd]);
    }

    #[test]
    fn test_object_events() {
        assert_eq!(
            kinds(r#"{"a": true, "b": [null, false], "c": {}}"#),
            vec![
                K::ObjectBegin,
                K::String,
                K::Boolean,
                K::String,
                K::ArrayBegin,
                K::None,
                K::Boolean,
                K::ArrayEnd,
                K::String,
                K::ObjectBegin,
                K::ObjectEnd,
                K::ObjectEnd,
            ]
        );
    }

    #[test]
    fn test_spans_cover_only_tokens() {
        let input = r#" { "a" : [1, -2.5e3 , "x\"y"], "b":null } "#;
        let events = Parser::new(input.as_bytes()).events().unwrap();

        let mut last_end = 0;
        let mut rebuilt = String::new();
        for event in &events {
            assert!(event.span.start >= last_end, "overlapping span {event}");
            let gap = &input[last_end..event.span.start];
            assert!(gap.bytes().all(|b| b" \t\r\n:,".contains(&b)), "gap {gap:?}");
            rebuilt.push_str(&event.as_str_lossy());
            last_end = event.span.end;
        }
        let expected: String = input
            .chars()
            .filter(|c| !matches!(c, ' ' | ':' | ','))
            .collect();
        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn test_returns_cursor_after_trailing_whitespace() {
        let parser = Parser::new(b"[1] \n x");
        let end = parser.parse(|_| {}).unwrap();
        assert_eq!(end, 6);
    }

    #[test]
    fn test_string_is_raw() {
        let input = "\"a\\né\"".as_bytes();
        let events = Parser::new(input).events().unwrap();
        assert_eq!(events[0].text, input);
    }

    #[test]
    fn test_strict_rejects_relaxed_numbers() {
        for input in ["+1", "01", "1.", "1.0e", "0x1", "0b101", "-", "1.5.2"] {
            strict_err(input);
        }
    }

    #[test]
    fn test_exponent_fault_kinds() {
        let err = strict_err("1.0e");
        assert!(err.is_overrun(), "{err:?}");
        assert_eq!(err.offset(), 4);

        let err = strict_err("1.0e ");
        assert!(!err.is_overrun(), "{err:?}");
        assert_eq!(err.offset(), 4);

        let err = strict_err("[1.]");
        assert!(matches!(err, ParseError::Syntax { offset: 3, .. }));
    }

    #[test]
    fn test_relaxed_accepts_extended_numbers() {
        for input in ["+1", "01", "1.", "1.0e", "0x1", "0b101", "0XfF", "017"] {
            assert_eq!(relaxed_texts(input), vec![input.to_string()]);
        }
    }

    #[test]
    fn test_relaxed_rejects_bad_radix_digits() {
        let err = Parser::with_personality(b"0b102", Relaxed)
            .events()
            .unwrap_err();
        assert_eq!(err.offset(), 4);

        let err = Parser::with_personality(b"0x", Relaxed).events().unwrap_err();
        assert!(err.is_overrun());
    }

    #[test]
    fn test_trailing_comma() {
        let err = strict_err("[1,2,]");
        assert!(matches!(err, ParseError::Syntax { offset: 5, .. }));
        let err = strict_err(r#"{"a":1,}"#);
        assert!(matches!(err, ParseError::Syntax { offset: 7, .. }));
    }

    #[test]
    fn test_missing_terminators_overrun() {
        assert!(strict_err("[1, 2").is_overrun());
        assert!(strict_err(r#"{"a": 1"#).is_overrun());
        assert!(strict_err(r#""abc"#).is_overrun());
        assert!(strict_err("").is_overrun());
    }

    #[test]
    fn test_structural_faults() {
        let err = strict_err(r#"{"a" 1}"#);
        assert!(matches!(err, ParseError::Syntax { offset: 5, .. }));
        let err = strict_err(r#"{a: 1}"#);
        assert!(matches!(err, ParseError::Syntax { offset: 1, .. }));
        let err = strict_err("[1 2]");
        assert!(matches!(err, ParseError::Syntax { offset: 3, .. }));
    }

    #[test]
    fn test_literals() {
        assert_eq!(kinds("true"), vec![K::Boolean]);
        assert_eq!(kinds("false"), vec![K::Boolean]);
        assert_eq!(kinds("null"), vec![K::None]);

        let err = strict_err("tru");
        assert!(err.is_overrun());
        assert_eq!(err.offset(), 3);

        let err = strict_err("nul]");
        assert!(matches!(err, ParseError::Syntax { offset: 0, .. }));
        let err = strict_err("True");
        assert!(matches!(err, ParseError::Syntax { offset: 0, .. }));
    }

    #[test]
    fn test_unicode_escape_validation() {
        let err = strict_err(r#""\u12G4""#);
        assert!(matches!(err, ParseError::Syntax { offset: 5, .. }));
        assert!(strict_err(r#""\u12"#).is_overrun());
        assert!(strict_err(r#""abc\"#).is_overrun());
    }

    #[test]
    fn test_control_byte_in_string() {
        let err = strict_err("\"a\nb\"");
        assert!(matches!(err, ParseError::Syntax { offset: 2, .. }));
    }

    #[test]
    fn test_relaxed_keys_and_comments() {
        let input = "# header\n{ name: \"x\", _id2: 3 # trailing\n, \"q\": null }";
        assert_eq!(
            relaxed_texts(input),
            vec!["{", "name", "\"x\"", "_id2", "3", "\"q\"", "null", "}"]
        );
    }

    #[test]
    fn test_relaxed_bare_values() {
        assert_eq!(relaxed_texts("[alpha, nothing, true]"), vec!["[", "alpha", "nothing", "true", "]"]);
        let err = Parser::with_personality(b"tru", Relaxed).events().unwrap_err();
        assert!(err.is_overrun());
    }

    #[test]
    fn test_strict_rejects_comments_and_bare_words() {
        assert!(matches!(strict_err("# c\n1"), ParseError::Syntax { offset: 0, .. }));
        assert!(matches!(strict_err("[alpha]"), ParseError::Syntax { offset: 1, .. }));
    }

    #[test]
    fn test_depth_limit() {
        let deep = "[".repeat(10) + &"]".repeat(10);
        let options = ParserOptions::new().with_max_depth(Some(4));
        let err = Parser::new(deep.as_bytes())
            .with_options(options)
            .events()
            .unwrap_err();
        assert!(matches!(err, ParseError::DepthExceeded { offset: 4, limit: 4, .. }));

        let unbounded = Parser::new(deep.as_bytes()).with_options(ParserOptions::unbounded());
        assert_eq!(unbounded.events().unwrap().len(), 20);
    }

    #[test]
    fn test_free_function() {
        let mut count = 0;
        let end = parse(Strict, b"[[], {}]", |_| count += 1).unwrap();
        assert_eq!(end, 8);
        assert_eq!(count, 6);
    }
}
