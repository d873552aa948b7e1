mod common;

use serde_json::{Value, json};
use uuid::Uuid;
use wayfinder::schema::synth::builtin_question_type;
use wayfinder::schema::{SchemaDocument, SchemaError, SynthesisOptions, synthesize, synthesize_value};
use wayfinder::types::{MultiSelectPolicy, QuestionKind};

fn answer(value: Value) -> Value {
    json!({ "question_id": Uuid::new_v4().to_string(), "value": value })
}

fn schema(kind: QuestionKind, spec: Value) -> SchemaDocument {
    synthesize(kind, &spec, &SynthesisOptions::default()).expect("synthesize")
}

fn accepts(doc: &SchemaDocument, value: Value) -> bool {
    doc.is_valid(&answer(value)).expect("schema compiles")
}

#[test]
fn envelope_requires_uuid_question_id() {
    common::init_tracing();
    let doc = schema(QuestionKind::FreeForm, json!({}));

    assert_eq!(doc.declared_type(), Some("object"));
    assert!(!doc.is_valid(&json!({ "value": "x" })).unwrap());
    assert!(!doc.is_valid(&json!({ "question_id": "not-a-uuid", "value": "x" })).unwrap());
    assert!(doc.is_valid(&answer(json!("x"))).unwrap());
}

#[test]
fn single_choice_any_declared_option() {
    let doc = schema(
        QuestionKind::SingleChoice,
        json!({ "inputOptions": ["cat", "dog"] }),
    );
    assert!(accepts(&doc, json!("cat")));
    assert!(accepts(&doc, json!("dog")));
    assert!(!accepts(&doc, json!("fish")));
    assert!(!accepts(&doc, Value::Null));
}

#[test]
fn single_choice_correct_value_only() {
    let doc = schema(
        QuestionKind::SingleChoice,
        json!({
            "meta": { "inputRequired": true, "correctInputRequired": true },
            "inputOptions": ["cat", "dog"],
            "correctInput": "dog"
        }),
    );
    assert!(accepts(&doc, json!("dog")));
    assert!(!accepts(&doc, json!("cat")));
}

#[test]
fn optional_questions_also_accept_null() {
    let cases = vec![
        (QuestionKind::SingleChoice, json!({ "inputOptions": [1, 2] }), json!(1)),
        (QuestionKind::MultipleChoice, json!({ "inputOptions": ["a", "b"] }), json!(["b", "a"])),
        (
            QuestionKind::NumericRange,
            json!({ "inputOptions": { "min": 0, "max": 10, "step": 5 } }),
            json!(5),
        ),
        (
            QuestionKind::DateRange,
            json!({ "inputOptions": { "min": "2024-02-27", "max": "2024-03-01" } }),
            json!("2024-02-29"),
        ),
        (QuestionKind::Boolean, json!({}), json!(false)),
        (QuestionKind::FreeForm, json!({}), json!("anything")),
    ];

    for (kind, mut spec, good) in cases {
        spec["meta"] = json!({ "inputRequired": false, "correctInputRequired": false });
        let doc = schema(kind, spec.clone());
        assert!(accepts(&doc, good.clone()), "{kind} should accept {good}");
        assert!(accepts(&doc, Value::Null), "{kind} should accept null");

        spec["meta"]["inputRequired"] = json!(true);
        let doc = schema(kind, spec);
        assert!(accepts(&doc, good), "{kind} required");
        assert!(!accepts(&doc, Value::Null), "{kind} required should reject null");
    }
}

#[test]
fn optional_correct_answer_accepts_correct_or_null() {
    let doc = schema(
        QuestionKind::Boolean,
        json!({
            "meta": { "inputRequired": false, "correctInputRequired": true },
            "correctInput": true
        }),
    );
    assert!(accepts(&doc, json!(true)));
    assert!(accepts(&doc, Value::Null));
    assert!(!accepts(&doc, json!(false)));
}

#[test]
fn numeric_range_expands_step_spaced_values() {
    let value = synthesize_value(
        QuestionKind::NumericRange,
        &json!({ "inputOptions": { "min": 1, "max": 2, "step": 0.5 } }),
        &SynthesisOptions::default(),
    )
    .unwrap();
    assert_eq!(value, json!({ "enum": [1.0, 1.5, 2.0] }));

    let doc = schema(
        QuestionKind::NumericRange,
        json!({ "inputOptions": { "min": 0, "max": 100, "step": 10 } }),
    );
    assert!(accepts(&doc, json!(30)));
    assert!(accepts(&doc, json!(30.0)));
    assert!(!accepts(&doc, json!(35)));
    assert!(!accepts(&doc, json!(110)));
}

#[test]
fn date_range_steps_in_days() {
    let doc = schema(
        QuestionKind::DateRange,
        json!({ "inputOptions": { "min": "2024-01-01", "max": "2024-01-10", "step": 3 } }),
    );
    for good in ["2024-01-01", "2024-01-04", "2024-01-07", "2024-01-10"] {
        assert!(accepts(&doc, json!(good)), "{good}");
    }
    assert!(!accepts(&doc, json!("2024-01-02")));
    assert!(!accepts(&doc, json!("2024-01-13")));
}

#[test]
fn date_range_step_beyond_the_calendar_keeps_only_min() {
    let value = synthesize_value(
        QuestionKind::DateRange,
        &json!({ "inputOptions": { "min": "2024-01-01", "max": "2024-01-02", "step": 100_000_000 } }),
        &SynthesisOptions::default(),
    )
    .expect("huge step still synthesizes");
    assert_eq!(value, json!({ "enum": ["2024-01-01"] }));

    let value = synthesize_value(
        QuestionKind::DateRange,
        &json!({ "inputOptions": { "min": "2024-01-01", "max": "2024-01-02", "step": i64::MAX } }),
        &SynthesisOptions::default(),
    )
    .expect("maximal step still synthesizes");
    assert_eq!(value, json!({ "enum": ["2024-01-01"] }));
}

#[test]
fn multiple_choice_any_non_empty_ordered_combination() {
    let doc = schema(
        QuestionKind::MultipleChoice,
        json!({ "inputOptions": ["a", "b", "c"] }),
    );
    assert!(accepts(&doc, json!(["a"])));
    assert!(accepts(&doc, json!(["c", "a"])));
    assert!(accepts(&doc, json!(["b", "c", "a"])));
    assert!(!accepts(&doc, json!([])));
    assert!(!accepts(&doc, json!(["a", "a"])));
    assert!(!accepts(&doc, json!(["d"])));
}

#[test]
fn multiple_choice_correct_set_permutations_policy() {
    let doc = schema(
        QuestionKind::MultipleChoice,
        json!({
            "meta": { "correctInputRequired": true },
            "inputOptions": ["a", "b", "c"],
            "correctInput": ["a", "b"]
        }),
    );
    assert!(accepts(&doc, json!(["a", "b"])));
    assert!(accepts(&doc, json!(["b", "a"])));
    assert!(!accepts(&doc, json!(["a"])));
    assert!(!accepts(&doc, json!(["a", "b", "c"])));
}

#[test]
fn multiple_choice_correct_set_equality_policy() {
    let options = SynthesisOptions {
        multi_select: MultiSelectPolicy::SetEquality,
        ..SynthesisOptions::default()
    };
    let doc = synthesize(
        QuestionKind::MultipleChoice,
        &json!({
            "meta": { "correctInputRequired": true },
            "inputOptions": ["a", "b", "c"],
            "correctInput": ["a", "b"]
        }),
        &options,
    )
    .unwrap();

    assert!(accepts(&doc, json!(["b", "a"])));
    assert!(!accepts(&doc, json!(["a", "a"])));
    assert!(!accepts(&doc, json!(["a", "c"])));
    assert!(!accepts(&doc, json!(["a"])));
}

#[test]
fn free_form_correct_value() {
    let doc = schema(
        QuestionKind::FreeForm,
        json!({
            "meta": { "correctInputRequired": true },
            "correctInput": "42"
        }),
    );
    assert!(accepts(&doc, json!("42")));
    assert!(!accepts(&doc, json!("41")));
}

#[test]
fn boolean_defaults_to_both_values() {
    let doc = schema(QuestionKind::Boolean, json!({}));
    assert!(accepts(&doc, json!(true)));
    assert!(accepts(&doc, json!(false)));
    assert!(!accepts(&doc, json!("true")));
}

#[test]
fn enumeration_cap_is_a_specification_error() {
    let options = SynthesisOptions {
        max_enumeration: 10,
        ..SynthesisOptions::default()
    };
    let err = synthesize(
        QuestionKind::NumericRange,
        &json!({ "inputOptions": { "min": 0, "max": 100 } }),
        &options,
    )
    .unwrap_err();
    assert_eq!(
        err,
        SchemaError::TooManyValues {
            kind: QuestionKind::NumericRange,
            limit: 10
        }
    );
}

#[test]
fn malformed_specifications_are_rejected() {
    let opts = SynthesisOptions::default();
    let bad = vec![
        (QuestionKind::SingleChoice, json!({ "inputOptions": [] })),
        (QuestionKind::SingleChoice, json!({ "inputOptions": ["a", "a"] })),
        (
            QuestionKind::SingleChoice,
            json!({ "meta": { "correctInputRequired": true }, "inputOptions": ["a"], "correctInput": "b" }),
        ),
        (QuestionKind::NumericRange, json!({ "inputOptions": { "min": 5, "max": 1 } })),
        (QuestionKind::NumericRange, json!({ "inputOptions": { "min": 0, "max": 1, "step": 0 } })),
        (QuestionKind::DateRange, json!({ "inputOptions": { "min": "yesterday", "max": "2024-01-01" } })),
        (QuestionKind::Boolean, json!({ "meta": { "inputRequired": "yes" } })),
        (QuestionKind::FreeForm, json!("not an object")),
    ];
    for (kind, spec) in bad {
        assert!(synthesize(kind, &spec, &opts).is_err(), "{kind} {spec}");
    }
}

#[test]
fn builtin_examples_satisfy_their_type_and_synthesize() {
    for kind in QuestionKind::ALL {
        let (type_schema, example) = builtin_question_type(kind);
        assert!(type_schema.is_valid(&example).unwrap(), "{kind} example");
        synthesize(kind, &example, &SynthesisOptions::default())
            .unwrap_or_else(|e| panic!("{kind} example should synthesize: {e}"));
    }
}
