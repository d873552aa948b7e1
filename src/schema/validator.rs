// src/schema/validator.rs

//! JSON Schema compilation on top of the `jsonschema` crate.
//!
//! Documents are checked against their draft's meta-schema before they are
//! built, so a keyword with the wrong shape is reported at authoring time with
//! a pointer into the document. `format` is asserted, not just annotated.

use std::fmt;
use std::sync::Arc;

use jsonschema::Validator;
use serde_json::{Value, json};

use crate::schema::SchemaError;

/// One reason an instance failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// JSON pointer into the instance (`""` for the root).
    pub instance_path: String,
    pub message: String,
}

/// A schema document checked for well-formedness and ready to validate.
///
/// Cheap to clone; the built validator is shared.
#[derive(Clone)]
pub struct CompiledSchema {
    validator: Arc<Validator>,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema").finish_non_exhaustive()
    }
}

impl CompiledSchema {
    pub fn compile(schema: &Value) -> Result<Self, SchemaError> {
        jsonschema::meta::validate(schema)
            .map_err(|e| SchemaError::malformed(e.instance_path.as_str(), e.to_string()))?;

        let validator = jsonschema::options()
            .should_validate_formats(true)
            .build(schema)
            .map_err(|e| SchemaError::malformed(e.schema_path.as_str(), e.to_string()))?;

        Ok(Self {
            validator: Arc::new(validator),
        })
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Validate and report every failure found.
    pub fn validate(&self, instance: &Value) -> Vec<ValidationFailure> {
        self.validator
            .iter_errors(instance)
            .map(|e| ValidationFailure {
                instance_path: e.instance_path.as_str().to_string(),
                message: e.to_string(),
            })
            .collect()
    }
}

/// Whether `value` equals one of `allowed` under `enum` semantics, where
/// numbers compare by value (`1 == 1.0`).
pub(crate) fn is_member(value: &Value, allowed: &[Value]) -> bool {
    if allowed.is_empty() {
        return false;
    }
    jsonschema::validator_for(&json!({ "enum": allowed })).is_ok_and(|v| v.is_valid(value))
}

/// The first item that repeats an earlier one, under `uniqueItems` semantics.
pub(crate) fn first_duplicate(items: &[Value]) -> Option<&Value> {
    items
        .iter()
        .enumerate()
        .skip(1)
        .find(|(i, item)| is_member(item, &items[..*i]))
        .map(|(_, item)| item)
}
