// src/errors.rs

//! Crate-wide error type and helpers.

use thiserror::Error;

use crate::schema::SchemaError;

#[derive(Error, Debug)]
pub enum WayfinderError {
    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Invalid field `{field}`: {message}")]
    FieldError { field: String, message: String },

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification used by callers that map errors onto a transport
/// (e.g. HTTP status codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Authoring data is structurally wrong; rejected at load time.
    Authoring,
    /// The submitted step is not reachable from the current state.
    Navigation,
    /// A uniqueness constraint rejected the write.
    Conflict,
    /// The request itself is malformed (missing required answers, ...).
    InvalidInput,
    /// Unknown entity, or an entity the caller does not own.
    NotFound,
    Internal,
}

impl WayfinderError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        WayfinderError::FieldError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WayfinderError::CatalogError(_)
            | WayfinderError::FieldError { .. }
            | WayfinderError::Schema(_) => ErrorKind::Authoring,
            WayfinderError::Navigation(_) => ErrorKind::Navigation,
            WayfinderError::Conflict(_) => ErrorKind::Conflict,
            WayfinderError::InvalidSubmission(_) | WayfinderError::JsonError(_) => {
                ErrorKind::InvalidInput
            }
            WayfinderError::NotFound(_) => ErrorKind::NotFound,
            WayfinderError::IoError(_)
            | WayfinderError::TomlError(_)
            | WayfinderError::Other(_) => ErrorKind::Internal,
        }
    }

    /// True for errors caused by the caller rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Navigation | ErrorKind::Conflict | ErrorKind::InvalidInput | ErrorKind::NotFound
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WayfinderError>;
