use proptest::prelude::*;
use spanjson::api::{parse_document, Grammar};
use spanjson::serialization::{to_string, SerializeOptions};
use spanjson::utils::escape_string;
use spanjson::{Parser, Value};

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Boolean),
        any::<i32>().prop_map(Value::from),
        (-1e12f64..1e12f64).prop_map(Value::Number),
        (1e-9f64..1e-3f64).prop_map(Value::Number),
        "[a-zA-Z0-9 _\\-\"\\\\/\n\té€]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z\"\\\\ ]{0,6}", inner, 0..6).prop_map(|map| {
                map.into_iter()
                    .map(|(key, value)| (escape_string(&key), value))
                    .collect::<Value>()
            }),
        ]
    })
}

proptest! {
    #[test]
    fn serialize_then_parse_is_structurally_equal(value in arb_value()) {
        for options in [SerializeOptions::compact(), SerializeOptions::default()] {
            let text = to_string(&value, options);
            let back = parse_document(text.as_bytes(), Grammar::Strict).unwrap();
            prop_assert_eq!(&back, &value);
        }
    }

    #[test]
    fn event_spans_are_ordered_and_exact(value in arb_value()) {
        let text = to_string(&value, SerializeOptions::default());
        let input = text.as_bytes();
        let events = Parser::new(input).events().unwrap();

        let mut cursor = 0;
        for event in &events {
            prop_assert!(event.span.start >= cursor);
            prop_assert_eq!(event.span.slice(input), Some(event.text));
            // Bytes between tokens are whitespace or punctuation only.
            let gap = &input[cursor..event.span.start];
            prop_assert!(gap.iter().all(|b| b" \t\r\n,:".contains(b)));
            cursor = event.span.end;
        }
        prop_assert!(input[cursor..].iter().all(u8::is_ascii_whitespace));
    }

    #[test]
    fn relaxed_reads_everything_strict_writes(value in arb_value()) {
        let text = to_string(&value, SerializeOptions::compact());
        let back = parse_document(text.as_bytes(), Grammar::Relaxed).unwrap();
        prop_assert_eq!(&back, &value);
    }
}
