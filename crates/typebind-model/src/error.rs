//! # Error Types
//!
//! `ModelError` covers instance-level failures: construction, collection
//! access, seed parsing and registry lookups. `SchemaError` covers mistakes
//! in a schema declaration and is raised once, by `SchemaBuilder::build`.
//!
//! ## Design
//!
//! - Only construction escalates a field validation failure into an error.
//!   Failures after construction are recorded on the instance instead and
//!   never appear here.
//! - Nested construction failures keep the outer type name and extend the
//!   field path with dots (`child.age`), so the message points at the leaf.

use thiserror::Error;

/// Errors raised while constructing or accessing models and collections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A seed value failed coercion or validation while constructing an
    /// instance. Construction stops at the first failing field.
    #[error("cannot construct {type_name}: {field}: {message}")]
    Construction {
        /// Name of the type being constructed.
        type_name: String,
        /// Dotted path of the failing field.
        field: String,
        /// Validation message of the failing field.
        message: String,
    },

    /// Positional access past the end of a collection.
    #[error("index {index} out of range for collection of length {len}")]
    OutOfRange {
        /// Requested position.
        index: usize,
        /// Length at the time of access.
        len: usize,
    },

    /// Seed text that is not JSON.
    #[error("invalid JSON: {reason}")]
    InvalidJson {
        /// Parser diagnostic.
        reason: String,
    },

    /// A type name that is not registered.
    #[error("unknown model type {name:?}")]
    UnknownType {
        /// The name that was looked up.
        name: String,
    },

    /// A `self` element-type reference used before its schema was built.
    #[error("field {field:?} references its own type before the schema was built")]
    UnboundSelfReference {
        /// Field carrying the unbound reference.
        field: String,
    },
}

impl ModelError {
    pub(crate) fn invalid_json(err: &serde_json::Error) -> Self {
        Self::InvalidJson {
            reason: err.to_string(),
        }
    }

    /// Re-home an error raised while coercing `field` of `type_name`.
    ///
    /// Construction errors from a nested type keep their leaf message and
    /// gain `field` as a path prefix. Any other error becomes a construction
    /// error on `field` itself.
    pub(crate) fn within(self, type_name: &str, field: &str) -> Self {
        match self {
            Self::Construction {
                field: nested,
                message,
                ..
            } => Self::Construction {
                type_name: type_name.to_string(),
                field: format!("{field}.{nested}"),
                message,
            },
            other => Self::Construction {
                type_name: type_name.to_string(),
                field: field.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Errors in a schema declaration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// More than one field carries the identity flag.
    #[error("type {type_name} declares more than one key field: {first} and {second}")]
    MultipleKeys {
        /// Type being built.
        type_name: String,
        /// First key field in declaration order.
        first: String,
        /// Second key field in declaration order.
        second: String,
    },

    /// The identity flag was placed on a field that cannot be a key.
    #[error("key field {field} of {type_name} is a {kind} field; only number fields can be keys")]
    InvalidKeyKind {
        /// Type being built.
        type_name: String,
        /// Offending field.
        field: String,
        /// Kind of the offending field.
        kind: &'static str,
    },

    /// A field's default fails that field's own validation, e.g. a
    /// required string without a non-empty default.
    #[error("default of field {field} of {type_name} is invalid: {message}")]
    InvalidDefault {
        /// Type being built.
        type_name: String,
        /// Offending field.
        field: String,
        /// Validation message for the default.
        message: String,
    },

    /// A number field whose minimum exceeds its maximum.
    #[error("number field {field} of {type_name} has min {min} greater than max {max}")]
    InvalidBounds {
        /// Type being built.
        type_name: String,
        /// Offending field.
        field: String,
        /// Declared minimum.
        min: f64,
        /// Declared maximum.
        max: f64,
    },

    /// A type with this name is already registered.
    #[error("model type {name:?} is already registered")]
    DuplicateType {
        /// The conflicting name.
        name: String,
    },
}
