pub mod api;
pub mod builder;
pub mod error;
pub mod event;
pub mod parser;
pub mod personality;
pub mod schema;
pub mod serialization;
pub mod utils;
pub mod value;

pub use api::{analyze, parse_document, parse_file, parse_str, Document, Grammar};
pub use builder::DocumentBuilder;
pub use error::{BuildError, JsonError, ParseError, SchemaError};
pub use event::{Event, EventKind, Span};
pub use parser::{Parser, ParserOptions};
pub use personality::{Personality, Relaxed, Strict};
pub use schema::{validate, validate_and_fill, Validation, Validator, ValidatorOptions, Violation};
pub use serialization::SerializeOptions;
pub use value::{Map, Value};
