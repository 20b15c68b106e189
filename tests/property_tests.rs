//! Property-based tests for the engine invariants.

use proptest::prelude::*;
use quarry::{Engine, JsonValue};

/// Arbitrary JSON values. String content stays printable so every
/// serialization is valid JSON for the round-trip properties.
fn arb_json() -> impl Strategy<Value = JsonValue> {
    let leaf = prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::boolean),
        (-1_000_000i64..1_000_000).prop_map(|n| JsonValue::number(n as f64)),
        (-1.0e6..1.0e6f64).prop_map(JsonValue::number),
        "[a-zA-Z0-9 _.-]{0,12}".prop_map(|s| JsonValue::string(s.as_str())),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(JsonValue::array_from),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|map| JsonValue::object_from(map)),
        ]
    })
}

/// Arbitrary scalar (non-container) values.
fn arb_scalar() -> impl Strategy<Value = JsonValue> {
    prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::boolean),
        (-1.0e6..1.0e6f64).prop_map(JsonValue::number),
        "[a-z]{0,8}".prop_map(|s| JsonValue::string(s.as_str())),
    ]
}

/// Arbitrary field names: lowercase identifiers that are not keywords.
fn arb_field_name() -> impl Strategy<Value = String> {
    "[a-z]{1,5}".prop_filter("keywords are not field names", |s| {
        !matches!(
            s.as_str(),
            "true" | "false" | "null" | "and" | "or" | "not"
        )
    })
}

/// Arbitrary access-path filters of the form `. ('.' ident | '[' num ']')*`.
fn arb_path_filter() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            arb_field_name().prop_map(|f| format!(".{}", f)),
            (0usize..4).prop_map(|i| format!("[{}]", i)),
        ],
        0..4,
    )
    .prop_map(|segments| {
        let body = segments.concat();
        if body.is_empty() {
            ".".to_string()
        } else if body.starts_with('[') {
            format!(".{}", body)
        } else {
            body
        }
    })
}

proptest! {
    /// Totality: any access-path filter on any input succeeds, and every
    /// output is itself valid JSON.
    #[test]
    fn prop_access_paths_are_total(filter in arb_path_filter(), value in arb_json()) {
        let engine = Engine::new();
        let outputs = engine.run_streaming(&filter, &value.to_json());
        prop_assert!(outputs.is_ok(), "filter {:?} failed: {:?}", filter, outputs);
        for out in outputs.unwrap() {
            prop_assert!(
                JsonValue::from_json_text(&out).is_ok(),
                "output {:?} is not valid JSON", out
            );
        }
    }

    /// Determinism: the same (filter, input) always produces the same
    /// output sequence.
    #[test]
    fn prop_execution_is_deterministic(filter in arb_path_filter(), value in arb_json()) {
        let engine = Engine::new();
        let input = value.to_json();
        let first = engine.run_streaming(&filter, &input).unwrap();
        for _ in 0..2 {
            prop_assert_eq!(&engine.run_streaming(&filter, &input).unwrap(), &first);
        }
    }

    /// Null propagation: a field access on any non-object yields exactly
    /// one null; an index access on any non-array does too.
    #[test]
    fn prop_field_on_non_object_is_null(value in arb_scalar(), key in arb_field_name()) {
        let engine = Engine::new();
        let filter = format!(".{}", key);
        let outputs = engine.run_streaming(&filter, &value.to_json()).unwrap();
        prop_assert_eq!(outputs, vec!["null".to_string()]);
    }

    #[test]
    fn prop_index_on_non_array_is_null(value in arb_scalar(), idx in 0usize..8) {
        let engine = Engine::new();
        let filter = format!(".[{}]", idx);
        let outputs = engine.run_streaming(&filter, &value.to_json()).unwrap();
        prop_assert_eq!(outputs, vec!["null".to_string()]);
    }

    /// Sorted-key serialization is a fixed point after the first
    /// parse/serialize round trip.
    #[test]
    fn prop_serialization_fixed_point(value in arb_json()) {
        let once = JsonValue::from_json_text(&value.to_json()).unwrap().to_json();
        let twice = JsonValue::from_json_text(&once).unwrap().to_json();
        prop_assert_eq!(once, twice);
    }

    /// `keys` equals the sorted key list, and its length equals `length`.
    #[test]
    fn prop_keys_identity(map in prop::collection::btree_map("[a-z]{1,6}", arb_scalar(), 0..8)) {
        let engine = Engine::new();
        let sorted_keys: Vec<String> = map.keys().cloned().collect();
        let input = JsonValue::object_from(map).to_json();

        let keys_out = engine.run("keys", &input).unwrap();
        let expected = JsonValue::array_from(
            sorted_keys.iter().map(|k| JsonValue::string(k.as_str())).collect()
        );
        prop_assert_eq!(keys_out, expected.to_json());

        let length_out = engine.run("length", &input).unwrap();
        prop_assert_eq!(length_out, sorted_keys.len().to_string());
    }

    /// The `empty` law: zero outputs for any input.
    #[test]
    fn prop_empty_yields_nothing(value in arb_json()) {
        let engine = Engine::new();
        let outputs = engine.run_streaming("empty", &value.to_json()).unwrap();
        prop_assert!(outputs.is_empty());
    }

    /// Every compiled program passes pool validation.
    #[test]
    fn prop_compiled_programs_validate(filter in arb_path_filter()) {
        let engine = Engine::new();
        let program = engine.compile(&filter).unwrap();
        prop_assert!(program.validate().is_ok());
    }
}
