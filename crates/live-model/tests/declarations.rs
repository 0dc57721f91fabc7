//! Declaration compilation behavior: idempotence, permissive numeric
//! parsing, and property coverage for scalar defaults.

use live_model::{Engine, FieldDecl, FieldKind, ModelError, SchemaOptions};
use proptest::prelude::*;
use serde_json::json;

fn number_schema() -> live_model::Schema {
    Engine::new()
        .define(
            vec![("count", FieldDecl::item("number"))],
            SchemaOptions::new(),
        )
        .unwrap()
}

// ── Compilation ───────────────────────────────────────────────────────────────

#[test]
fn compiling_the_same_declaration_twice_behaves_identically() {
    let fields = || {
        vec![
            ("type", FieldDecl::full("string", true, "typeFoo")),
            ("count", FieldDecl::full("number", true, 1)),
            ("list", FieldDecl::list("string")),
        ]
    };
    let first = Engine::new().define(fields(), SchemaOptions::new()).unwrap();
    let second = Engine::new().define(fields(), SchemaOptions::new()).unwrap();

    let input = json!({"count": "2.5", "list": [1, true]});
    let a = first.instantiate(input.clone()).unwrap();
    let b = second.instantiate(input).unwrap();
    assert_eq!(a.view(), b.view());
}

#[test]
fn descriptors_surface_their_compiled_shape() {
    let schema = Engine::new()
        .define(
            vec![
                ("count", FieldDecl::full("number", false, 1)),
                ("list", FieldDecl::list("string")),
            ],
            SchemaOptions::new(),
        )
        .unwrap();

    let Some(FieldKind::Stored(count)) = schema.field("count") else {
        panic!("count should be a stored field");
    };
    assert!(!count.is_array);
    assert!(!count.required);
    assert_eq!(count.default, json!(1));

    let Some(FieldKind::Stored(list)) = schema.field("list") else {
        panic!("list should be a stored field");
    };
    assert!(list.is_array);
    assert!(list.required);

    assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["count", "list"]);
}

// ── Permissive number parsing ─────────────────────────────────────────────────

#[test]
fn numeric_prefix_is_parsed_and_garbage_dropped() {
    let schema = number_schema();
    let model = schema.instantiate(json!({"count": "3.5abc"})).unwrap();
    assert_eq!(model.get("count"), Some(json!(3.5)));

    let model = schema.instantiate(json!({"count": "1e3rest"})).unwrap();
    assert_eq!(model.get("count"), Some(json!(1000.0)));

    let model = schema.instantiate(json!({"count": "  42  "})).unwrap();
    assert_eq!(model.get("count"), Some(json!(42.0)));
}

#[test]
fn strings_without_a_numeric_prefix_are_rejected() {
    let schema = number_schema();
    for input in ["abc", "", ".", "--1", "e10"] {
        let err = schema.instantiate(json!({"count": input})).unwrap_err();
        assert!(matches!(err, ModelError::NotNumber(_)), "input {input:?}");
    }
}

// ── Property coverage ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn absent_scalar_fields_take_their_default(default in any::<i32>()) {
        let schema = Engine::new()
            .define(
                vec![("count", FieldDecl::full("number", true, default))],
                SchemaOptions::new(),
            )
            .unwrap();
        let model = schema.instantiate(json!({})).unwrap();
        prop_assert_eq!(model.get("count"), Some(json!(default)));
    }

    #[test]
    fn string_defaults_pass_through_unchanged(default in ".*") {
        let schema = Engine::new()
            .define(
                vec![("tag", FieldDecl::full("string", true, default.clone()))],
                SchemaOptions::new(),
            )
            .unwrap();
        let model = schema.instantiate(json!({})).unwrap();
        prop_assert_eq!(model.get("tag"), Some(json!(default)));
    }

    #[test]
    fn displayed_floats_parse_back_exactly(value in proptest::num::f64::NORMAL) {
        let schema = number_schema();
        let model = schema
            .instantiate(json!({ "count": value.to_string() }))
            .unwrap();
        prop_assert_eq!(model.get("count"), Some(json!(value)));
    }
}
