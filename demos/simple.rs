use spanjson::api::{analyze, render_error, Grammar};
use spanjson::Value;

fn main() {
    let json_data = r#"
        {
            "user": {
                "name": "John Doe",
                "email": "john.doe@example.com"
            }
        }
    "#;

    let schema = Value::from(serde_json::json!({
        "properties": {
            "user": {
                "required": ["name", "email"],
                "properties": {"role": {"enum": ["admin", "member"], "default": "member"}}
            }
        }
    }));

    match analyze(json_data, "example.json", Grammar::Strict) {
        Ok(mut document) => match document.check_and_fill(&schema) {
            Ok(report) if report.is_valid() => {
                let json_output = document.to_json().unwrap_or_default();
                println!("Validated and filled document:\n{json_output}");
            }
            Ok(report) => {
                for violation in report.violations() {
                    eprintln!("{violation}");
                }
            }
            Err(e) => eprintln!("Schema cannot be evaluated: {e}"),
        },
        Err(e) => {
            eprintln!("{}", render_error(e, "example.json", json_data));
        }
    }
}
