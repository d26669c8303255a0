//! # Seeds — Construction and Merge Sources
//!
//! A `Seed` is what `ModelType::create`, `Model::update`,
//! `Collection::seeded` and `Collection::update` read from. Most callers
//! pass a JSON value or JSON text and rely on the `From` conversions. The
//! `Fields` and `Items` forms carry `FieldValue`s, so existing models and
//! collections can be handed over by reference:
//!
//! ```text
//! ty.create(vec![("id", FieldValue::from(1)), ("child", FieldValue::from(&child))])
//! Collection::new(&ty).seeded(vec![first, second])
//! ```

use serde_json::Value;

use crate::collection::Collection;
use crate::model::Model;
use crate::value::FieldValue;

/// Source of field values or collection items.
#[derive(Debug, Clone)]
pub enum Seed {
    /// A single value: JSON object or array, JSON text, a model, a
    /// collection, or null.
    Value(FieldValue),
    /// Named field values, in any order. Later entries win.
    Fields(Vec<(String, FieldValue)>),
    /// Collection items, in order.
    Items(Vec<FieldValue>),
}

impl Default for Seed {
    fn default() -> Self {
        Self::Value(FieldValue::NULL)
    }
}

macro_rules! seed_from_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Seed {
                fn from(value: $t) -> Self {
                    Self::Value(FieldValue::from(value))
                }
            }
        )*
    };
}

seed_from_value!(Value, &str, String, bool, i32, i64, f64, Model, &Model, Collection, &Collection);

impl From<FieldValue> for Seed {
    fn from(value: FieldValue) -> Self {
        Self::Value(value)
    }
}

impl From<Vec<(String, FieldValue)>> for Seed {
    fn from(fields: Vec<(String, FieldValue)>) -> Self {
        Self::Fields(fields)
    }
}

impl From<Vec<(&str, FieldValue)>> for Seed {
    fn from(fields: Vec<(&str, FieldValue)>) -> Self {
        Self::Fields(fields.into_iter().map(|(n, v)| (n.to_string(), v)).collect())
    }
}

impl From<Vec<FieldValue>> for Seed {
    fn from(items: Vec<FieldValue>) -> Self {
        Self::Items(items)
    }
}

impl From<Vec<Model>> for Seed {
    fn from(items: Vec<Model>) -> Self {
        Self::Items(items.into_iter().map(FieldValue::Model).collect())
    }
}

impl FromIterator<(String, FieldValue)> for Seed {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self::Fields(iter.into_iter().collect())
    }
}

impl FromIterator<FieldValue> for Seed {
    fn from_iter<I: IntoIterator<Item = FieldValue>>(iter: I) -> Self {
        Self::Items(iter.into_iter().collect())
    }
}
