//! # Error Types
//!
//! Errors raised by the core capabilities. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Configuration could not be loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration variable carried a value outside its accepted set.
    #[error("invalid value {value:?} for {var}: expected one of {expected}")]
    InvalidValue {
        /// Name of the variable or key.
        var: String,
        /// The rejected value.
        value: String,
        /// Human-readable list of accepted values.
        expected: String,
    },
}

/// A timestamp could not be produced from its input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// The text is neither RFC 3339 nor a calendar date.
    #[error("unparseable timestamp {0:?}")]
    Unparseable(String),

    /// The epoch offset lies outside the representable range.
    #[error("epoch milliseconds out of range: {0}")]
    OutOfRange(i64),
}
