use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Any fault raised by the parse → build → validate pipeline.
///
/// Validation *failures* are not errors; they are reported as `false` (or as a
/// list of violations). Only faults that stop the pipeline end up here.
#[derive(Error, Debug, Diagnostic)]
pub enum JsonError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error("Failed to read {path}")]
    #[diagnostic(code(json::io), help("Check that the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl JsonError {
    /// The byte offset the fault points at, if it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            JsonError::Parse(err) => Some(err.offset()),
            JsonError::Build(err) => err.offset(),
            JsonError::Schema(_) | JsonError::Io { .. } => None,
        }
    }

    /// 1-based line and column of the fault within `source`.
    pub fn line_and_column(&self, source: &[u8]) -> Option<(usize, usize)> {
        self.offset()
            .map(|offset| crate::utils::line_and_column(source, offset))
    }
}

/// A grammar rule was violated at a known byte offset.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected input at offset {offset}: expected {expected}")]
    #[diagnostic(
        code(parser::syntax),
        help("The parser found a byte it did not expect in this position.")
    )]
    Syntax {
        offset: usize,
        expected: String,
        #[label("Expected {expected} here")]
        span: SourceSpan,
    },

    #[error("Input ended at offset {offset} while {expected} was still expected")]
    #[diagnostic(
        code(parser::overrun),
        help("The buffer ended in the middle of a token. Retry once more bytes are available.")
    )]
    Overrun {
        offset: usize,
        expected: String,
        #[label("Input ended here")]
        span: SourceSpan,
    },

    #[error("Nesting depth exceeds the configured limit of {limit}")]
    #[diagnostic(
        code(parser::depth_exceeded),
        help("Raise `ParserOptions::max_depth` if deeply nested input is expected.")
    )]
    DepthExceeded {
        offset: usize,
        limit: usize,
        #[label("Container opened past the depth limit")]
        span: SourceSpan,
    },
}

impl ParseError {
    pub(crate) fn syntax(offset: usize, expected: impl Into<String>) -> Self {
        ParseError::Syntax {
            offset,
            expected: expected.into(),
            span: (offset, 1).into(),
        }
    }

    pub(crate) fn overrun(offset: usize, expected: impl Into<String>) -> Self {
        ParseError::Overrun {
            offset,
            expected: expected.into(),
            span: (offset, 0).into(),
        }
    }

    pub(crate) fn depth_exceeded(offset: usize, limit: usize) -> Self {
        ParseError::DepthExceeded {
            offset,
            limit,
            span: (offset, 1).into(),
        }
    }

    /// Byte offset at which the grammar rule was violated.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::Syntax { offset, .. }
            | ParseError::Overrun { offset, .. }
            | ParseError::DepthExceeded { offset, .. } => *offset,
        }
    }

    /// True when the fault was caused only by running out of input; a
    /// streaming caller may retry once more bytes arrive.
    pub fn is_overrun(&self) -> bool {
        matches!(self, ParseError::Overrun { .. })
    }
}

/// The event stream handed to the document builder was inconsistent.
///
/// These indicate a parser/builder contract violation (or a hand-fed event
/// stream), never a recoverable input problem.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Container end at offset {offset} with no open container")]
    #[diagnostic(code(builder::unbalanced_end))]
    UnbalancedEnd {
        offset: usize,
        #[label("Nothing to close here")]
        span: SourceSpan,
    },

    #[error("Container end at offset {offset} does not match the open {expected}")]
    #[diagnostic(code(builder::mismatched_end))]
    MismatchedEnd {
        offset: usize,
        expected: &'static str,
        #[label("Expected the end of an {expected}")]
        span: SourceSpan,
    },

    #[error("Object member at offset {offset} has no key")]
    #[diagnostic(code(builder::missing_key))]
    MissingKey {
        offset: usize,
        #[label("Expected a string key before this value")]
        span: SourceSpan,
    },

    #[error("Object closed at offset {offset} while key `{key}` was still waiting for a value")]
    #[diagnostic(code(builder::dangling_key))]
    DanglingKey {
        offset: usize,
        key: String,
        #[label("Object ends here")]
        span: SourceSpan,
    },

    #[error("A second root value starts at offset {offset}")]
    #[diagnostic(code(builder::multiple_roots))]
    MultipleRoots {
        offset: usize,
        #[label("The document was already complete")]
        span: SourceSpan,
    },

    #[error("Event stream ended with {depth} unclosed container(s)")]
    #[diagnostic(code(builder::unterminated))]
    Unterminated { depth: usize },

    #[error("Event stream contained no value")]
    #[diagnostic(code(builder::empty))]
    Empty,

    #[error("Number `{text}` at offset {offset} cannot be decoded")]
    #[diagnostic(code(builder::invalid_number))]
    InvalidNumber {
        offset: usize,
        text: String,
        #[label("Not a decodable number")]
        span: SourceSpan,
    },

    #[error("Unexpected data after the root value at offset {offset}")]
    #[diagnostic(
        code(builder::trailing_data),
        help("A document holds exactly one root value.")
    )]
    TrailingData {
        offset: usize,
        #[label("Trailing data starts here")]
        span: SourceSpan,
    },
}

impl BuildError {
    pub fn offset(&self) -> Option<usize> {
        match self {
            BuildError::UnbalancedEnd { offset, .. }
            | BuildError::MismatchedEnd { offset, .. }
            | BuildError::MissingKey { offset, .. }
            | BuildError::DanglingKey { offset, .. }
            | BuildError::MultipleRoots { offset, .. }
            | BuildError::InvalidNumber { offset, .. }
            | BuildError::TrailingData { offset, .. } => Some(*offset),
            BuildError::Unterminated { .. } | BuildError::Empty => None,
        }
    }
}

/// The schema cannot be evaluated. Distinct from a plain validation failure.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema keyword `{keyword}` at `{path}` is not implemented")]
    #[diagnostic(
        code(schema::unsupported),
        help("The validator recognises this keyword but cannot evaluate it; the document was neither accepted nor rejected.")
    )]
    Unsupported { keyword: String, path: String },

    #[error("Invalid schema keyword `{keyword}` at `{path}`: {reason}")]
    #[diagnostic(code(schema::invalid))]
    Invalid {
        keyword: String,
        path: String,
        reason: String,
    },

    #[error("Validation nesting exceeds the configured limit of {limit} at `{path}`")]
    #[diagnostic(
        code(schema::depth_exceeded),
        help("Raise `ValidatorOptions::max_depth` if deeply nested documents are expected.")
    )]
    DepthExceeded { limit: usize, path: String },
}

impl SchemaError {
    pub(crate) fn invalid(keyword: &str, path: &str, reason: impl Into<String>) -> Self {
        SchemaError::Invalid {
            keyword: keyword.to_string(),
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
