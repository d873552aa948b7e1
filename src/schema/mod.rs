// src/schema/mod.rs

//! Answer schemas as data.
//!
//! - [`validator`] is the one validation primitive: JSON Schema compiled with
//!   the `jsonschema` crate, used for synthesized answer schemas, authored
//!   dependency `required_response` documents and question-type specification
//!   schemas.
//! - [`synth`] turns a question's declared specification into a
//!   [`SchemaDocument`] describing acceptable answer values.
//! - [`expand`] enumerates ranges and option combinations for the synthesizer.

pub mod expand;
pub mod synth;
pub mod validator;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::QuestionKind;

pub use synth::{SynthesisOptions, synthesize, synthesize_value};
pub use validator::{CompiledSchema, ValidationFailure};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("malformed schema at `{path}`: {message}")]
    Malformed { path: String, message: String },

    #[error("invalid {kind} specification: {message}")]
    Specification { kind: QuestionKind, message: String },

    #[error("{kind} specification expands to more than {limit} accepted values")]
    TooManyValues { kind: QuestionKind, limit: usize },
}

impl SchemaError {
    pub(crate) fn malformed(path: &str, message: impl Into<String>) -> Self {
        SchemaError::Malformed {
            path: if path.is_empty() { "#".to_string() } else { path.to_string() },
            message: message.into(),
        }
    }

    pub(crate) fn spec(kind: QuestionKind, message: impl Into<String>) -> Self {
        SchemaError::Specification {
            kind,
            message: message.into(),
        }
    }
}

/// An immutable JSON-Schema-like document.
///
/// Stored and compared as plain JSON; compile it with [`SchemaDocument::compile`]
/// to check well-formedness and validate instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDocument(Value);

impl SchemaDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn compile(&self) -> Result<CompiledSchema, SchemaError> {
        CompiledSchema::compile(&self.0)
    }

    /// Compile-and-check; used by authoring-time validation.
    pub fn ensure_well_formed(&self) -> Result<(), SchemaError> {
        self.compile().map(|_| ())
    }

    /// Compile the document and validate a single instance against it.
    pub fn is_valid(&self, instance: &Value) -> Result<bool, SchemaError> {
        Ok(self.compile()?.is_valid(instance))
    }

    /// The top-level `type` keyword, when it is a single type name.
    pub fn declared_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }
}

impl From<Value> for SchemaDocument {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
