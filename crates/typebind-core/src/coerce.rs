//! # Loose-Input Coercion Primitives
//!
//! Helpers shared by every field kind when turning loosely typed input into
//! a canonical value. They know nothing about schemas; field descriptors
//! decide which helper applies and what to do when one declines.
//!
//! ## Numbers
//!
//! `number_from_text` accepts decimal and exponent notation after trimming
//! whitespace. Empty text reads as zero. Words such as `inf` or `NaN` are
//! rejected even though `f64::from_str` would accept them, because they have
//! no JSON representation.
//!
//! `number_value` renders a finite `f64` as a JSON number, preferring the
//! integer form when the value is integral. This keeps `"42"` → `42` rather
//! than `42.0` when serialized.

use serde_json::{Number, Value};

/// Parse numeric text. Returns `None` when the text is not a finite number.
pub fn number_from_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    if trimmed
        .chars()
        .any(|c| c.is_alphabetic() && c != 'e' && c != 'E')
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Render `n` as a JSON number. Non-finite input yields `Value::Null`.
pub fn number_value(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Parse JSON text. Returns `None` on malformed input.
pub fn parse_json_text(text: &str) -> Option<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "json text did not parse");
            None
        }
    }
}

/// Textual form of a value for string fields: strings are taken verbatim,
/// null becomes empty, and everything else uses compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
