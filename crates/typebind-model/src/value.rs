//! # Field Values
//!
//! `FieldValue` is everything a model field or collection slot can hold:
//! plain JSON data, a millisecond timestamp, or a nested model or
//! collection handle. It is also the input type of every mutation, with
//! `From` conversions for the common Rust and JSON types.
//!
//! Nested handles are shared, not copied: cloning a `FieldValue::Model`
//! clones the handle, and both clones observe the same instance.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use typebind_core::Timestamp;

use crate::collection::Collection;
use crate::model::Model;

/// A value stored in a model field or collection slot.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Null, boolean, number, string, or an opaque JSON object/array.
    Plain(Value),
    /// A UTC instant with millisecond precision.
    DateTime(Timestamp),
    /// A nested typed object.
    Model(Model),
    /// A nested typed aggregate.
    Collection(Collection),
}

impl FieldValue {
    /// The JSON null value.
    pub const NULL: FieldValue = FieldValue::Plain(Value::Null);

    /// Returns the JSON null value.
    pub fn null() -> Self {
        Self::NULL
    }

    /// Whether this is plain JSON null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Plain(Value::Null))
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Plain(Value::Null) => "null",
            Self::Plain(Value::Bool(_)) => "boolean",
            Self::Plain(Value::Number(_)) => "number",
            Self::Plain(Value::String(_)) => "string",
            Self::Plain(Value::Array(_)) => "array",
            Self::Plain(Value::Object(_)) => "object",
            Self::DateTime(_) => "datetime",
            Self::Model(_) => "model",
            Self::Collection(_) => "collection",
        }
    }

    pub fn as_plain(&self) -> Option<&Value> {
        match self {
            Self::Plain(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_plain().and_then(Value::as_str)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_plain().and_then(Value::as_f64)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_plain().and_then(Value::as_i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_plain().and_then(Value::as_bool)
    }

    pub fn as_datetime(&self) -> Option<&Timestamp> {
        match self {
            Self::DateTime(ts) => Some(ts),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Self::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_model(self) -> Option<Model> {
        match self {
            Self::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_collection(self) -> Option<Collection> {
        match self {
            Self::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Plain-data form: timestamps become RFC 3339 text and nested
    /// handles serialize recursively.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Plain(v) => v.clone(),
            Self::DateTime(ts) => Value::String(ts.to_iso8601()),
            Self::Model(m) => m.serialize(),
            Self::Collection(c) => c.serialize(),
        }
    }

    /// Whether both values are the same nested instance, or equal plain
    /// values.
    pub(crate) fn same_item(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (Self::Model(a), Self::Model(b)) => a.ptr_eq(b),
            (Self::Collection(a), Self::Collection(b)) => a.ptr_eq(b),
            _ => self == other,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::NULL
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Plain(a), Self::Plain(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Model(a), Self::Model(b)) => a == b,
            (Self::Collection(a), Self::Collection(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ─── Conversions ────────────────────────────────────────────────────

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Plain(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Plain(Value::String(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Plain(Value::String(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Plain(Value::Bool(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Plain(typebind_core::coerce::number_value(value))
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(value: $t) -> Self {
                    Self::Plain(Value::from(value))
                }
            }
        )*
    };
}

from_integer!(i32, i64, u32, u64);

impl From<Timestamp> for FieldValue {
    fn from(value: Timestamp) -> Self {
        Self::DateTime(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(Timestamp::from_utc(value))
    }
}

impl From<Model> for FieldValue {
    fn from(value: Model) -> Self {
        Self::Model(value)
    }
}

impl From<&Model> for FieldValue {
    fn from(value: &Model) -> Self {
        Self::Model(value.clone())
    }
}

impl From<Collection> for FieldValue {
    fn from(value: Collection) -> Self {
        Self::Collection(value)
    }
}

impl From<&Collection> for FieldValue {
    fn from(value: &Collection) -> Self {
        Self::Collection(value.clone())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NULL, Into::into)
    }
}
