use spanjson::api::{analyze, events, parse_file, Grammar};
use spanjson::serialization::SerializeOptions;
use spanjson::{EventKind, Value};
use std::io::Write;

#[test]
fn test_simple_parse_to_json() {
    let source = r#"
        {
            "name": "My App",
            "version": 1.5,
            "is_enabled": true,
            "features": ["a", "b", "c"],
            "config": {
                "host": "localhost",
                "port": 8080
            }
        }
    "#;

    let expected_json = serde_json::json!({
        "name": "My App",
        "version": 1.5,
        "is_enabled": true,
        "features": ["a", "b", "c"],
        "config": {
            "host": "localhost",
            "port": 8080,
        }
    });

    let document = analyze(source, "test.json", Grammar::Strict).unwrap();
    let result = document.to_json().unwrap();
    let result_json: serde_json::Value = serde_json::from_str(&result).unwrap();

    assert_eq!(result_json, expected_json);
}

#[test]
fn test_escapes_are_decoded_for_serde_output() {
    let source = r#"{ "greeting" : "café \"ok\"" }"#;
    let document = analyze(source, "escapes.json", Grammar::Strict).unwrap();

    let canonical = document.to_canonical(SerializeOptions::compact());
    assert_eq!(canonical, r#"{"greeting":"café \"ok\""}"#);

    let json: serde_json::Value = serde_json::from_str(&document.to_json().unwrap()).unwrap();
    assert_eq!(json["greeting"], "café \"ok\"");
}

#[test]
fn test_simple_parse_to_yaml() {
    let source = r#"
        {
            "name": "My App",
            "version": 1.5,
            "is_enabled": true
        }
    "#;

    let expected_yaml = "is_enabled: true\nname: My App\nversion: 1.5\n";

    let document = analyze(source, "test.json", Grammar::Strict).unwrap();
    let result = document.to_yaml().unwrap();

    assert_eq!(result, expected_yaml);
}

#[test]
fn test_relaxed_document_to_json() {
    let source = "{ retries: 0x10, mode: 0644, name: worker } # trailing comment";
    let document = analyze(source, "relaxed.json", Grammar::Relaxed).unwrap();
    let json: serde_json::Value = serde_json::from_str(&document.to_json().unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"retries": 16, "mode": 420, "name": "worker"})
    );
}

#[test]
fn test_parse_file_names_the_document() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{\"items\": [1, 2, 3]}}").unwrap();

    let document = parse_file(file.path(), Grammar::Strict).unwrap();
    assert_eq!(document.name, file.path().to_string_lossy());
    assert_eq!(
        document.root.pointer("/items/2"),
        Some(&Value::Number(3.0))
    );
}

#[test]
fn test_document_validation() {
    let schema = Value::from(serde_json::json!({
        "properties": {"level": {"enum": ["debug", "info"], "default": "info"}},
        "required": ["level"],
    }));

    let mut document = analyze("{}", "cfg.json", Grammar::Strict).unwrap();
    let report = document.check(&schema).unwrap();
    assert!(report.is_valid());
    assert!(document.root.get("level").is_none());

    let report = document.check_and_fill(&schema).unwrap();
    assert!(report.is_valid());
    assert_eq!(document.root.get("level"), Some(&Value::from("info")));
}

#[test]
fn test_events_cover_tokens() {
    let input = br#"{"k": [null, -2]}"#;
    let events = events(input, Grammar::Strict).unwrap();
    let texts: Vec<_> = events.iter().map(|e| e.as_str_lossy().into_owned()).collect();
    assert_eq!(texts, vec!["{", "\"k\"", "[", "null", "-2", "]", "}"]);
    assert_eq!(events[1].kind, EventKind::String);
    assert_eq!(events[4].kind, EventKind::Number);
}
