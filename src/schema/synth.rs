// src/schema/synth.rs

//! Answer-schema synthesis.
//!
//! [`synthesize`] is the single entry point: it reads the question's
//! `specification.meta.{inputRequired, correctInputRequired}` flags, asks the
//! kind-specific domain builder for the set of acceptable values, and wraps
//! the result in the answer envelope:
//!
//! ```json
//! { "type": "object",
//!   "properties": { "question_id": { "type": "string", "format": "uuid" },
//!                   "value": <accepted values> },
//!   "required": ["question_id", "value"] }
//! ```
//!
//! | inputRequired | correctInputRequired | accepted values              |
//! |---------------|----------------------|------------------------------|
//! | true          | true                 | the correct value            |
//! | true          | false                | any declared option          |
//! | false         | true                 | the correct value, or `null` |
//! | false         | false                | any declared option, or `null` |

use chrono::NaiveDate;
use serde_json::{Map, Value, json};

use crate::schema::validator::{first_duplicate, is_member};
use crate::schema::{SchemaDocument, SchemaError, expand};
use crate::types::{MultiSelectPolicy, QuestionKind};

/// Default cap on enumerated values per schema.
pub const DEFAULT_MAX_ENUMERATION: usize = 5000;

/// Knobs that change what the synthesizer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisOptions {
    pub multi_select: MultiSelectPolicy,
    pub max_enumeration: usize,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            multi_select: MultiSelectPolicy::default(),
            max_enumeration: DEFAULT_MAX_ENUMERATION,
        }
    }
}

/// The `meta` flags of a specification.
///
/// A missing `meta` (or missing flag) means: input required, correctness not
/// required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Meta {
    input_required: bool,
    correct_input_required: bool,
}

impl Meta {
    fn read(kind: QuestionKind, spec: &Value) -> Result<Self, SchemaError> {
        let meta = match spec.get("meta") {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(m)) => m,
            Some(_) => return Err(SchemaError::spec(kind, "`meta` must be an object")),
        };
        Ok(Self {
            input_required: flag(kind, meta, "inputRequired", true)?,
            correct_input_required: flag(kind, meta, "correctInputRequired", false)?,
        })
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            input_required: true,
            correct_input_required: false,
        }
    }
}

fn flag(kind: QuestionKind, meta: &Map<String, Value>, key: &str, default: bool) -> Result<bool, SchemaError> {
    match meta.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(SchemaError::spec(
            kind,
            format!("`meta.{key}` must be a boolean, got {other}"),
        )),
    }
}

/// Values a question accepts, before the optional `null`.
enum AnswerDomain {
    /// A finite list of accepted values.
    Enumerated(Vec<Value>),
    /// A schema describing accepted values.
    Structural(Value),
}

impl AnswerDomain {
    fn into_schema(self, nullable: bool) -> Value {
        match self {
            AnswerDomain::Enumerated(mut values) => {
                if nullable {
                    values.push(Value::Null);
                }
                json!({ "enum": values })
            }
            AnswerDomain::Structural(schema) if nullable => {
                json!({ "anyOf": [schema, { "type": "null" }] })
            }
            AnswerDomain::Structural(schema) => schema,
        }
    }
}

/// Synthesize the full answer schema for a question.
pub fn synthesize(
    kind: QuestionKind,
    specification: &Value,
    options: &SynthesisOptions,
) -> Result<SchemaDocument, SchemaError> {
    let value = synthesize_value(kind, specification, options)?;
    Ok(SchemaDocument::new(json!({
        "type": "object",
        "properties": {
            "question_id": { "type": "string", "format": "uuid" },
            "value": value,
        },
        "required": ["question_id", "value"],
    })))
}

/// Synthesize only the `value` part of the answer schema.
pub fn synthesize_value(
    kind: QuestionKind,
    specification: &Value,
    options: &SynthesisOptions,
) -> Result<Value, SchemaError> {
    if !specification.is_object() {
        return Err(SchemaError::spec(kind, "specification must be an object"));
    }
    let meta = Meta::read(kind, specification)?;
    let correct = meta.correct_input_required;

    let domain = match kind {
        QuestionKind::SingleChoice => single_choice(specification, correct)?,
        QuestionKind::MultipleChoice => multiple_choice(specification, correct, options)?,
        QuestionKind::NumericRange => numeric_range(specification, correct, options)?,
        QuestionKind::DateRange => date_range(specification, correct, options)?,
        QuestionKind::Boolean => boolean(specification, correct)?,
        QuestionKind::FreeForm => free_form(specification, correct)?,
    };

    Ok(domain.into_schema(!meta.input_required))
}

fn correct_input(kind: QuestionKind, spec: &Value) -> Result<&Value, SchemaError> {
    match spec.get("correctInput") {
        None | Some(Value::Null) => Err(SchemaError::spec(
            kind,
            "`correctInput` is required when `meta.correctInputRequired` is true",
        )),
        Some(v) => Ok(v),
    }
}

fn option_list(kind: QuestionKind, spec: &Value) -> Result<Vec<Value>, SchemaError> {
    let options = spec
        .get("inputOptions")
        .and_then(Value::as_array)
        .ok_or_else(|| SchemaError::spec(kind, "`inputOptions` must be an array"))?;
    if options.is_empty() {
        return Err(SchemaError::spec(kind, "`inputOptions` must not be empty"));
    }
    if let Some(dup) = first_duplicate(options) {
        return Err(SchemaError::spec(kind, format!("duplicate option {dup}")));
    }
    Ok(options.clone())
}

fn ensure_member(kind: QuestionKind, value: &Value, allowed: &[Value]) -> Result<(), SchemaError> {
    if is_member(value, allowed) {
        Ok(())
    } else {
        Err(SchemaError::spec(
            kind,
            format!("`correctInput` {value} is not one of the declared options"),
        ))
    }
}

fn single_choice(spec: &Value, correct: bool) -> Result<AnswerDomain, SchemaError> {
    let kind = QuestionKind::SingleChoice;
    let options = option_list(kind, spec)?;
    if correct {
        let answer = correct_input(kind, spec)?;
        ensure_member(kind, answer, &options)?;
        return Ok(AnswerDomain::Enumerated(vec![answer.clone()]));
    }
    Ok(AnswerDomain::Enumerated(options))
}

fn multiple_choice(
    spec: &Value,
    correct: bool,
    opts: &SynthesisOptions,
) -> Result<AnswerDomain, SchemaError> {
    let kind = QuestionKind::MultipleChoice;
    let options = option_list(kind, spec)?;

    let pool = if correct {
        let answers = correct_input(kind, spec)?
            .as_array()
            .ok_or_else(|| SchemaError::spec(kind, "`correctInput` must be an array"))?;
        if answers.is_empty() {
            return Err(SchemaError::spec(kind, "`correctInput` must not be empty"));
        }
        for a in answers {
            ensure_member(kind, a, &options)?;
        }
        if let Some(dup) = first_duplicate(answers) {
            return Err(SchemaError::spec(kind, format!("duplicate correct option {dup}")));
        }
        answers.clone()
    } else {
        options
    };

    let domain = match (opts.multi_select, correct) {
        (MultiSelectPolicy::Permutations, true) => {
            AnswerDomain::Enumerated(expand::orderings(&pool, opts.max_enumeration)?)
        }
        (MultiSelectPolicy::Permutations, false) => {
            AnswerDomain::Enumerated(expand::ordered_selections(&pool, opts.max_enumeration)?)
        }
        (MultiSelectPolicy::SetEquality, true) => AnswerDomain::Structural(json!({
            "type": "array",
            "items": { "enum": pool },
            "uniqueItems": true,
            "minItems": pool.len(),
            "maxItems": pool.len(),
        })),
        (MultiSelectPolicy::SetEquality, false) => AnswerDomain::Structural(json!({
            "type": "array",
            "items": { "enum": pool },
            "uniqueItems": true,
            "minItems": 1,
        })),
    };
    Ok(domain)
}

fn range_bounds(kind: QuestionKind, spec: &Value) -> Result<&Map<String, Value>, SchemaError> {
    spec.get("inputOptions")
        .and_then(Value::as_object)
        .ok_or_else(|| SchemaError::spec(kind, "`inputOptions` must be an object with `min` and `max`"))
}

fn numeric_range(
    spec: &Value,
    correct: bool,
    opts: &SynthesisOptions,
) -> Result<AnswerDomain, SchemaError> {
    let kind = QuestionKind::NumericRange;
    let bounds = range_bounds(kind, spec)?;
    let number = |key: &str, default: Option<f64>| -> Result<f64, SchemaError> {
        match bounds.get(key) {
            Some(v) => v
                .as_f64()
                .ok_or_else(|| SchemaError::spec(kind, format!("`inputOptions.{key}` must be a number"))),
            None => default
                .ok_or_else(|| SchemaError::spec(kind, format!("`inputOptions.{key}` is required"))),
        }
    };
    let values = expand::numeric_range(
        number("min", None)?,
        number("max", None)?,
        number("step", Some(1.0))?,
        opts.max_enumeration,
    )?;

    if correct {
        let answer = correct_input(kind, spec)?;
        if !answer.is_number() {
            return Err(SchemaError::spec(kind, "`correctInput` must be a number"));
        }
        ensure_member(kind, answer, &values)?;
        return Ok(AnswerDomain::Enumerated(vec![answer.clone()]));
    }
    Ok(AnswerDomain::Enumerated(values))
}

fn parse_date(kind: QuestionKind, value: &Value, what: &str) -> Result<NaiveDate, SchemaError> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .ok_or_else(|| SchemaError::spec(kind, format!("{what} must be an ISO date (YYYY-MM-DD)")))
}

fn date_range(
    spec: &Value,
    correct: bool,
    opts: &SynthesisOptions,
) -> Result<AnswerDomain, SchemaError> {
    let kind = QuestionKind::DateRange;
    let bounds = range_bounds(kind, spec)?;
    let min = parse_date(kind, bounds.get("min").unwrap_or(&Value::Null), "`inputOptions.min`")?;
    let max = parse_date(kind, bounds.get("max").unwrap_or(&Value::Null), "`inputOptions.max`")?;
    let step = match bounds.get("step") {
        None => 1,
        Some(v) => v
            .as_i64()
            .ok_or_else(|| SchemaError::spec(kind, "`inputOptions.step` must be an integer"))?,
    };
    let values = expand::date_range(min, max, step, opts.max_enumeration)?;

    if correct {
        let answer = correct_input(kind, spec)?;
        let date = parse_date(kind, answer, "`correctInput`")?;
        let normalized = Value::String(date.format("%Y-%m-%d").to_string());
        ensure_member(kind, &normalized, &values)?;
        return Ok(AnswerDomain::Enumerated(vec![normalized]));
    }
    Ok(AnswerDomain::Enumerated(values))
}

fn boolean(spec: &Value, correct: bool) -> Result<AnswerDomain, SchemaError> {
    let kind = QuestionKind::Boolean;
    let options = match spec.get("inputOptions") {
        None | Some(Value::Null) => vec![Value::Bool(true), Value::Bool(false)],
        Some(_) => {
            let options = option_list(kind, spec)?;
            if !options.iter().all(Value::is_boolean) {
                return Err(SchemaError::spec(kind, "`inputOptions` must contain only booleans"));
            }
            options
        }
    };

    if correct {
        let answer = correct_input(kind, spec)?;
        if !answer.is_boolean() {
            return Err(SchemaError::spec(kind, "`correctInput` must be a boolean"));
        }
        ensure_member(kind, answer, &options)?;
        return Ok(AnswerDomain::Enumerated(vec![answer.clone()]));
    }
    Ok(AnswerDomain::Enumerated(options))
}

fn free_form(spec: &Value, correct: bool) -> Result<AnswerDomain, SchemaError> {
    let kind = QuestionKind::FreeForm;
    if correct {
        let answer = correct_input(kind, spec)?;
        if !answer.is_string() {
            return Err(SchemaError::spec(kind, "`correctInput` must be a string"));
        }
        return Ok(AnswerDomain::Enumerated(vec![answer.clone()]));
    }
    Ok(AnswerDomain::Structural(json!({ "type": "string" })))
}

/// Built-in question type for a kind: a schema that every specification of
/// that kind must satisfy, and an example specification that satisfies it.
pub fn builtin_question_type(kind: QuestionKind) -> (SchemaDocument, Value) {
    let meta = json!({
        "type": "object",
        "properties": {
            "inputRequired": { "type": "boolean" },
            "correctInputRequired": { "type": "boolean" }
        }
    });

    let (schema, example) = match kind {
        QuestionKind::SingleChoice => (
            json!({
                "type": "object",
                "properties": {
                    "meta": meta,
                    "inputOptions": { "type": "array", "minItems": 1, "uniqueItems": true }
                },
                "required": ["inputOptions"]
            }),
            json!({
                "meta": { "inputRequired": true, "correctInputRequired": false },
                "inputOptions": ["cat", "dog"]
            }),
        ),
        QuestionKind::MultipleChoice => (
            json!({
                "type": "object",
                "properties": {
                    "meta": meta,
                    "inputOptions": { "type": "array", "minItems": 1, "uniqueItems": true },
                    "correctInput": { "type": ["array", "null"], "uniqueItems": true }
                },
                "required": ["inputOptions"]
            }),
            json!({
                "meta": { "inputRequired": true, "correctInputRequired": true },
                "inputOptions": ["red", "green", "blue"],
                "correctInput": ["red", "blue"]
            }),
        ),
        QuestionKind::NumericRange => (
            json!({
                "type": "object",
                "properties": {
                    "meta": meta,
                    "inputOptions": {
                        "type": "object",
                        "properties": {
                            "min": { "type": "number" },
                            "max": { "type": "number" },
                            "step": { "type": "number", "exclusiveMinimum": 0 }
                        },
                        "required": ["min", "max"]
                    },
                    "correctInput": { "type": ["number", "null"] }
                },
                "required": ["inputOptions"]
            }),
            json!({
                "meta": { "inputRequired": true, "correctInputRequired": false },
                "inputOptions": { "min": 1, "max": 10, "step": 1 }
            }),
        ),
        QuestionKind::DateRange => (
            json!({
                "type": "object",
                "properties": {
                    "meta": meta,
                    "inputOptions": {
                        "type": "object",
                        "properties": {
                            "min": { "type": "string", "format": "date" },
                            "max": { "type": "string", "format": "date" },
                            "step": { "type": "integer", "minimum": 1 }
                        },
                        "required": ["min", "max"]
                    },
                    "correctInput": {
                        "anyOf": [{ "type": "string", "format": "date" }, { "type": "null" }]
                    }
                },
                "required": ["inputOptions"]
            }),
            json!({
                "meta": { "inputRequired": true, "correctInputRequired": false },
                "inputOptions": { "min": "2024-01-01", "max": "2024-01-31", "step": 1 }
            }),
        ),
        QuestionKind::Boolean => (
            json!({
                "type": "object",
                "properties": {
                    "meta": meta,
                    "inputOptions": { "type": "array", "items": { "type": "boolean" } },
                    "correctInput": { "type": ["boolean", "null"] }
                }
            }),
            json!({
                "meta": { "inputRequired": true, "correctInputRequired": true },
                "correctInput": true
            }),
        ),
        QuestionKind::FreeForm => (
            json!({
                "type": "object",
                "properties": {
                    "meta": meta,
                    "correctInput": { "type": ["string", "null"] }
                }
            }),
            json!({
                "meta": { "inputRequired": false, "correctInputRequired": false }
            }),
        ),
    };

    (SchemaDocument::new(schema), example)
}
