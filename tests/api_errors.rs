// API error path tests
// These check that every fault class reaches the caller as the right variant

use spanjson::api::{analyze, parse_file, parse_with_options, render_error, Grammar};
use spanjson::error::{BuildError, JsonError, ParseError, SchemaError};
use spanjson::{validate, ParserOptions, Value};

#[test]
fn test_api_parse_error() {
    let result = analyze("{ invalid syntax", "test.json", Grammar::Strict);
    match result {
        Err(JsonError::Parse(err)) => {
            assert!(!err.is_overrun());
            assert_eq!(err.offset(), 2);
        }
        other => panic!("Expected parse error, got {other:?}"),
    }
}

#[test]
fn test_api_overrun_error() {
    let result = analyze(r#"{"key": "unterminated"#, "test.json", Grammar::Strict);
    match result {
        Err(JsonError::Parse(err)) => {
            assert!(err.is_overrun());
            assert_eq!(err.offset(), 21);
        }
        other => panic!("Expected overrun, got {other:?}"),
    }
}

#[test]
fn test_api_build_error() {
    let result = analyze("[1] 2", "test.json", Grammar::Strict);
    assert!(matches!(
        result,
        Err(JsonError::Build(BuildError::TrailingData { offset: 4, .. }))
    ));
}

#[test]
fn test_api_empty_input() {
    let err = analyze("   ", "empty.json", Grammar::Strict).unwrap_err();
    assert!(matches!(err, JsonError::Parse(ParseError::Overrun { offset: 3, .. })));
}

#[test]
fn test_api_depth_limit() {
    let deep = "[".repeat(20) + &"]".repeat(20);
    let options = ParserOptions::new().with_max_depth(Some(8));
    let err = parse_with_options(deep.as_bytes(), Grammar::Strict, options).unwrap_err();
    assert!(matches!(
        err,
        JsonError::Parse(ParseError::DepthExceeded { limit: 8, offset: 8, .. })
    ));

    let value = parse_with_options(deep.as_bytes(), Grammar::Strict, ParserOptions::unbounded());
    assert!(value.is_ok());
}

#[test]
fn test_api_missing_file() {
    let err = parse_file("definitely/not/here.json", Grammar::Strict).unwrap_err();
    match err {
        JsonError::Io { path, source } => {
            assert_eq!(path, "definitely/not/here.json");
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("Expected io error, got {other:?}"),
    }
}

#[test]
fn test_api_unsupported_schema_is_not_a_failure() {
    let schema = Value::from(serde_json::json!({"patternProperties": {"^x": {}}}));
    let err = validate(&Value::from(serde_json::json!({"x": 1})), &schema).unwrap_err();
    assert!(matches!(err, SchemaError::Unsupported { .. }));

    let wrapped: JsonError = err.into();
    assert_eq!(wrapped.offset(), None);
}

#[test]
fn test_render_error_report() {
    let source = "{\n  \"a\": tru\n}";
    let err = analyze(source, "config.json", Grammar::Strict).unwrap_err();
    let rendered = render_error(err, "config.json", source);
    assert!(rendered.contains("parser::syntax"), "{rendered}");
    assert!(rendered.contains("config.json"), "{rendered}");
}

#[test]
fn test_error_line_and_column() {
    let source = "{\n  \"a\": [1,\n  2,]\n}";
    let err = analyze(source, "t.json", Grammar::Strict).unwrap_err();
    assert_eq!(err.offset(), Some(17));
    assert_eq!(err.line_and_column(source.as_bytes()), Some((3, 5)));
}

#[test]
fn test_error_messages() {
    let err = analyze("[1,", "t.json", Grammar::Strict).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Input ended at offset 3 while a value was still expected"
    );
    let err = analyze("[1 2]", "t.json", Grammar::Strict).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unexpected input at offset 3: expected ',' or ']'"
    );
}
