use miette::SourceSpan;
use std::fmt;

/// The kinds of events the parser emits.
/// Each event is one lexical or structural token of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // == Structure ==
    /// Opening brace: `{`
    ObjectBegin,
    /// Closing brace: `}`
    ObjectEnd,
    /// Opening bracket: `[`
    ArrayBegin,
    /// Closing bracket: `]`
    ArrayEnd,

    // == Scalars ==
    /// A quoted string including both quotes, or a bare identifier in the
    /// relaxed grammar. Object keys are reported with this kind as well.
    String,
    /// A number token from its sign through its last digit.
    Number,
    /// `true` or `false`.
    Boolean,
    /// `null`.
    None,
}

impl EventKind {
    pub fn is_begin(self) -> bool {
        matches!(self, EventKind::ObjectBegin | EventKind::ArrayBegin)
    }

    pub fn is_end(self) -> bool {
        matches!(self, EventKind::ObjectEnd | EventKind::ArrayEnd)
    }

    pub fn is_scalar(self) -> bool {
        !self.is_begin() && !self.is_end()
    }
}

/// A half-open byte range `[start, end)` into the parser's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Span {
        debug_assert!(start <= end);
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the bytes this span covers, or `None` if it lies outside `input`.
    pub fn slice<'a>(&self, input: &'a [u8]) -> Option<&'a [u8]> {
        input.get(self.start..self.end)
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> SourceSpan {
        (span.start, span.len()).into()
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Span {
        Span::new(range.start, range.end)
    }
}

/// One parser event: a kind plus the raw, un-decoded bytes it covers.
///
/// `text` borrows the caller's buffer. A callback that needs the bytes after
/// it returns has to copy them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event<'a> {
    pub kind: EventKind,
    pub span: Span,
    pub text: &'a [u8],
}

impl<'a> Event<'a> {
    pub fn new(kind: EventKind, span: Span, text: &'a [u8]) -> Event<'a> {
        Event { kind, span, text }
    }

    /// The event bytes as text. Lossy only for invalid UTF-8 inside strings.
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'a, str> {
        String::from_utf8_lossy(self.text)
    }
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{}..{} `{}`",
            self.kind,
            self.span.start,
            self.span.end,
            self.as_str_lossy()
        )
    }
}
