use crate::builder::build_document;
use crate::error::{JsonError, SchemaError};
use crate::event::Event;
use crate::parser::{Parser, ParserOptions};
use crate::personality::{Relaxed, Strict};
use crate::schema::{Validation, Validator};
use crate::serialization::{to_string, SerializeOptions};
use crate::value::Value;
use log::debug;
use miette::{GraphicalReportHandler, GraphicalTheme, NamedSource, Report};
use serde::{Deserialize, Serialize, Serializer};
use std::path::Path;

/// Runtime grammar selection for the convenience layer. The core parser
/// takes its personality as a type parameter instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    #[default]
    Strict,
    Relaxed,
}

/// A parsed document together with the name it was loaded under.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: String,
    pub root: Value,
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.root.serialize(serializer)
    }
}

impl Document {
    pub fn new(name: impl Into<String>, root: Value) -> Self {
        Document {
            name: name.into(),
            root,
        }
    }

    /// Pretty-printed JSON with string escapes decoded and re-encoded by
    /// `serde_json`.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }

    /// Canonical JSON from the crate's own writer: sorted keys, strings
    /// exactly as stored.
    #[must_use]
    pub fn to_canonical(&self, options: SerializeOptions) -> String {
        to_string(&self.root, options)
    }

    /// Validates the document against `schema` without modifying it.
    ///
    /// # Errors
    /// Returns a `SchemaError` if the schema cannot be evaluated.
    pub fn check(&self, schema: &Value) -> Result<Validation, SchemaError> {
        Validator::new(schema).check(&self.root)
    }

    /// Validates the document, injecting schema defaults into it.
    ///
    /// # Errors
    /// Returns a `SchemaError` if the schema cannot be evaluated.
    pub fn check_and_fill(&mut self, schema: &Value) -> Result<Validation, SchemaError> {
        Validator::new(schema).check_and_fill(&mut self.root)
    }
}

/// Parses one complete document from a byte buffer.
///
/// # Errors
///
/// Returns a `JsonError` for a parse fault or a build fault.
pub fn parse_document(input: &[u8], grammar: Grammar) -> Result<Value, JsonError> {
    parse_with_options(input, grammar, ParserOptions::default())
}

/// # Errors
///
/// Returns a `JsonError` for a parse fault or a build fault.
pub fn parse_with_options(
    input: &[u8],
    grammar: Grammar,
    options: ParserOptions,
) -> Result<Value, JsonError> {
    match grammar {
        Grammar::Strict => build_document(input, Strict, options),
        Grammar::Relaxed => build_document(input, Relaxed, options),
    }
}

/// # Errors
///
/// Returns a `JsonError` for a parse fault or a build fault.
pub fn parse_str(source: &str, grammar: Grammar) -> Result<Value, JsonError> {
    parse_document(source.as_bytes(), grammar)
}

/// Collects the raw event stream of `input`.
///
/// # Errors
///
/// Returns a `JsonError` for a parse fault.
pub fn events(input: &[u8], grammar: Grammar) -> Result<Vec<Event<'_>>, JsonError> {
    let events = match grammar {
        Grammar::Strict => Parser::new(input).events()?,
        Grammar::Relaxed => Parser::with_personality(input, Relaxed).events()?,
    };
    Ok(events)
}

/// Parses `source` into a named [`Document`].
///
/// # Errors
///
/// Returns a `JsonError` for a parse fault or a build fault.
pub fn analyze(source: &str, name: &str, grammar: Grammar) -> Result<Document, JsonError> {
    let root = parse_str(source, grammar)?;
    Ok(Document::new(name, root))
}

/// Reads and parses a file. The document is named after its path.
///
/// # Errors
///
/// Returns `JsonError::Io` if the file cannot be read, otherwise any parse or
/// build fault.
pub fn parse_file(path: impl AsRef<Path>, grammar: Grammar) -> Result<Document, JsonError> {
    let path = path.as_ref();
    let name = path.to_string_lossy().to_string();
    let bytes = std::fs::read(path).map_err(|source| JsonError::Io {
        path: name.clone(),
        source,
    })?;
    debug!("parsing {} bytes from {name}", bytes.len());
    let root = parse_document(&bytes, grammar)?;
    Ok(Document::new(name, root))
}

/// Renders `err` as a miette report with `source` attached under `name`, so
/// labelled faults point into the text.
#[must_use]
pub fn render_error(err: JsonError, name: &str, source: &str) -> String {
    let report =
        Report::new(err).with_source_code(NamedSource::new(name, source.to_string()));
    let mut out = String::new();
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    if handler.render_report(&mut out, &*report).is_err() {
        return format!("{report}");
    }
    out
}
