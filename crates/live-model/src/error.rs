//! Error types, split by lifecycle stage.

use serde_json::Value;
use thiserror::Error;

/// Programming errors in a schema definition. Raised by [`crate::Engine::define`],
/// never at instantiation time.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown type tag {tag:?} for field {field:?}")]
    UnknownTypeTag { field: String, tag: String },
    #[error("computed field {field:?} depends on undeclared field {dependency:?}")]
    UnknownDependency { field: String, dependency: String },
    #[error("duplicate field {0:?}")]
    DuplicateField(String),
}

/// Data errors raised while instantiating or mutating a model.
///
/// A failed conversion aborts the whole instantiation; there is no partial
/// construction and no fallback beyond the declared default.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("value {0} is not a string")]
    NotString(Value),
    #[error("value {0} is not a number")]
    NotNumber(Value),
    #[error("field {0:?} is not an array")]
    NotArray(String),
    #[error("model data must be an object, got {0}")]
    NotObject(Value),
    #[error("unknown field {0:?}")]
    UnknownField(String),
    #[error("{0}")]
    Custom(String),
}
