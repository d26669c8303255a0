//! # Typed Objects
//!
//! A `Model` is a shared handle to one instance of a `ModelType`: its type
//! tag, its current field values, its current validation errors, and an
//! event emitter announcing changes.
//!
//! ## Construction vs. Mutation
//!
//! ```text
//! ModelType::create(seed)   defaults → seed fields → first failure raises
//! Model::set / update       coerce → store → Change → validate → record
//! ```
//!
//! Construction is all-or-nothing: the first seed field that fails
//! coercion or validation aborts it with `ModelError::Construction`.
//! After construction nothing is raised for field values; failures are
//! recorded in the error map and announced as `ModelEvent::ValidationError`.
//! Defaults are checked once, when the schema is built, so a fresh
//! instance always starts valid and `create(instance().serialize())`
//! succeeds.
//!
//! ## Nested Instances
//!
//! Assigning a model (or collection) of the field's exact type adopts the
//! handle. Anything else assigned to a field that already holds a nested
//! instance (plain data, JSON text, a model of another type, an untyped
//! collection) merges into it via `update`, keeping its identity and its
//! subscribers.
//!
//! ## Re-entrancy
//!
//! No interior borrow is held while events are dispatched or callbacks run,
//! so handlers may read and mutate the model that announced the event.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::{Map, Value};
use typebind_core::{EventEmitter, Notifier, PropertyMap, PropertyStore};

use crate::collection::Collection;
use crate::error::ModelError;
use crate::field::{FieldDescriptor, FieldKind, TypeRef, Validation};
use crate::schema::ModelType;
use crate::seed::Seed;
use crate::value::FieldValue;

/// Seed key that overrides the instance type tag.
pub const TYPE_TAG_KEY: &str = "$type";

/// Notifications announced by a [`Model`].
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// A field was assigned. Carries the stored value.
    Change { field: String, value: FieldValue },
    /// A field failed validation after construction.
    ValidationError { field: String, message: String },
}

struct ModelInner {
    model_type: ModelType,
    type_tag: RefCell<String>,
    values: PropertyMap<FieldValue>,
    errors: RefCell<BTreeMap<String, String>>,
    events: EventEmitter<ModelEvent>,
}

/// Shared handle to a typed object.
#[derive(Clone)]
pub struct Model(Rc<ModelInner>);

pub(crate) struct WeakModel(Weak<ModelInner>);

impl WeakModel {
    pub(crate) fn upgrade(&self) -> Option<Model> {
        self.0.upgrade().map(Model)
    }
}

// ─── Sources ────────────────────────────────────────────────────────

/// A [`Seed`] resolved to something field values can be read from.
enum Source {
    Empty,
    Fields(Vec<(String, FieldValue)>),
    Model(Model),
}

impl Source {
    fn resolve(seed: Seed) -> Result<Self, ModelError> {
        let value = match seed {
            Seed::Value(value) => value,
            Seed::Fields(fields) => return Ok(Self::Fields(fields)),
            Seed::Items(_) => {
                tracing::debug!("item seed contributes no fields");
                return Ok(Self::Empty);
            }
        };
        match value {
            FieldValue::Plain(Value::Null) => Ok(Self::Empty),
            FieldValue::Plain(Value::Object(map)) => Ok(Self::from_map(map)),
            FieldValue::Plain(Value::String(text)) => {
                match serde_json::from_str::<Value>(&text) {
                    Ok(Value::Object(map)) => Ok(Self::from_map(map)),
                    Ok(_) => {
                        tracing::debug!("seed text is not a JSON object; ignored");
                        Ok(Self::Empty)
                    }
                    Err(e) => Err(ModelError::invalid_json(&e)),
                }
            }
            FieldValue::Model(m) => Ok(Self::Model(m)),
            other => {
                tracing::debug!(seed = other.kind_name(), "seed contributes no fields");
                Ok(Self::Empty)
            }
        }
    }

    fn from_map(map: Map<String, Value>) -> Self {
        Self::Fields(map.into_iter().map(|(n, v)| (n, FieldValue::Plain(v))).collect())
    }

    fn type_tag(&self) -> Option<String> {
        match self {
            Self::Fields(_) => self.field(TYPE_TAG_KEY)?.as_str().map(str::to_string),
            _ => None,
        }
    }

    /// Last `name` entry of a field list.
    fn field(&self, name: &str) -> Option<&FieldValue> {
        match self {
            Self::Fields(fields) => fields.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    fn value(&self, name: &str) -> Option<FieldValue> {
        match self {
            Self::Empty => None,
            Self::Fields(_) => self.field(name).cloned(),
            Self::Model(m) => {
                m.model_type().field(name)?;
                m.get(name)
            }
        }
    }
}

// ─── Construction ───────────────────────────────────────────────────

impl Model {
    pub(crate) fn with_defaults(model_type: ModelType) -> Self {
        let model = Self(Rc::new(ModelInner {
            type_tag: RefCell::new(model_type.name().to_string()),
            values: PropertyMap::new(),
            errors: RefCell::new(BTreeMap::new()),
            events: EventEmitter::new(),
            model_type,
        }));
        for (name, field) in model.0.model_type.fields() {
            model.0.values.put(name, field.default_value());
        }
        model
    }

    pub(crate) fn construct(model_type: ModelType, seed: Seed) -> Result<Self, ModelError> {
        let seed = Source::resolve(seed)?;
        let model = Self::with_defaults(model_type.clone());
        if let Some(tag) = seed.type_tag() {
            *model.0.type_tag.borrow_mut() = tag;
        }

        let policy = model_type.config().coercion;
        for (name, field) in model_type.fields() {
            let Some(raw) = seed.value(name) else {
                continue;
            };
            let value = field
                .coerce(name, raw, policy)
                .map_err(|e| e.within(model_type.name(), name))?;
            if let Validation::Invalid(message) = field.validate(name, &value, policy) {
                tracing::debug!(
                    type_name = model_type.name(),
                    field = %name,
                    message = %message,
                    "construction rejected"
                );
                return Err(ModelError::Construction {
                    type_name: model_type.name().to_string(),
                    field: name.clone(),
                    message,
                });
            }
            model.0.values.put(name, value);
        }

        tracing::debug!(type_name = model_type.name(), tag = %model.type_tag(), "model constructed");
        Ok(model)
    }

    pub(crate) fn downgrade(&self) -> WeakModel {
        WeakModel(Rc::downgrade(&self.0))
    }

    /// Whether both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Model) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn model_type(&self) -> &ModelType {
        &self.0.model_type
    }

    /// Instance type tag. Defaults to the type name; a seed may override
    /// it with a `"$type"` entry.
    pub fn type_tag(&self) -> String {
        self.0.type_tag.borrow().clone()
    }

    // ─── Access ─────────────────────────────────────────────────────

    /// Current value of `name`, schema field or not.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.0.values.get(name)
    }

    /// The nested model held by `name`, if any.
    pub fn get_model(&self, name: &str) -> Option<Model> {
        self.get(name).and_then(FieldValue::into_model)
    }

    /// The nested collection held by `name`, if any.
    pub fn get_collection(&self, name: &str) -> Option<Collection> {
        self.get(name).and_then(FieldValue::into_collection)
    }

    /// Current value of the identity field, or `None` when the type
    /// declares none.
    pub fn key(&self) -> Option<FieldValue> {
        self.0.model_type.key_field().and_then(|k| self.get(k))
    }

    /// Schema field names in declaration order.
    pub fn field_names(&self) -> Vec<String> {
        self.0
            .model_type
            .fields()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Visit every schema field with its descriptor, in declaration order.
    pub fn for_each_field(&self, mut visit: impl FnMut(&str, &FieldDescriptor)) {
        let model_type = self.0.model_type.clone();
        for (name, field) in model_type.fields() {
            visit(name.as_str(), field);
        }
    }

    /// Snapshot of the current error map (field → message).
    pub fn errors(&self) -> BTreeMap<String, String> {
        self.0.errors.borrow().clone()
    }

    pub fn error(&self, name: &str) -> Option<String> {
        self.0.errors.borrow().get(name).cloned()
    }

    // ─── Mutation ───────────────────────────────────────────────────

    /// Assign `value` to `name`.
    ///
    /// Schema fields are coerced, stored, announced, then validated; a
    /// failure is recorded and announced, a pass clears any prior entry.
    /// Other names are stored as given.
    pub fn set(&self, name: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        let model_type = self.0.model_type.clone();
        let Some(field) = model_type.field(name) else {
            tracing::trace!(field = name, "storing non-schema property");
            self.0.values.put(name, value.clone());
            self.emit(&ModelEvent::Change {
                field: name.to_string(),
                value,
            });
            return;
        };

        let policy = model_type.config().coercion;
        let stored = match self.assign(name, field, value, policy) {
            Ok(stored) => stored,
            Err(e) => {
                self.record(name, Validation::Invalid(e.to_string()));
                return;
            }
        };
        tracing::trace!(type_name = model_type.name(), field = name, "field assigned");
        self.0.values.put(name, stored.clone());
        self.emit(&ModelEvent::Change {
            field: name.to_string(),
            value: stored.clone(),
        });
        self.record(name, field.validate(name, &stored, policy));
    }

    fn assign(
        &self,
        name: &str,
        field: &FieldDescriptor,
        value: FieldValue,
        policy: typebind_core::CoercionPolicy,
    ) -> Result<FieldValue, ModelError> {
        match (field.kind(), self.get(name)) {
            (FieldKind::Model(r), Some(FieldValue::Model(existing))) if !adoptable(r, &value) => {
                tracing::debug!(field = name, "merging into nested model");
                existing.update(value)?;
                Ok(FieldValue::Model(existing))
            }
            (FieldKind::Collection(r), Some(FieldValue::Collection(existing)))
                if !adoptable(r, &value) =>
            {
                tracing::debug!(field = name, "merging into nested collection");
                existing.update(value)?;
                Ok(FieldValue::Collection(existing))
            }
            _ => field.coerce(name, value, policy),
        }
    }

    /// Merge `other` (a JSON object, JSON text, named field values, or a
    /// model) into this instance: every schema field present on `other` is applied through
    /// [`Model::set`].
    ///
    /// # Errors
    ///
    /// Only `ModelError::InvalidJson`, for text that does not parse. Field
    /// failures are recorded, not raised.
    pub fn update(&self, other: impl Into<Seed>) -> Result<(), ModelError> {
        let seed = Source::resolve(other.into())?;
        let model_type = self.0.model_type.clone();
        for (name, _) in model_type.fields() {
            if let Some(value) = seed.value(name) {
                self.set(name, value);
            }
        }
        Ok(())
    }

    // ─── Validation ─────────────────────────────────────────────────

    /// Validate every schema field, refreshing the whole error map.
    pub fn validate(&self) -> bool {
        self.validate_with(|_, _| {})
    }

    /// Like [`Model::validate`], invoking `on_error(name, message)` once
    /// per failing field.
    pub fn validate_with(&self, mut on_error: impl FnMut(&str, &str)) -> bool {
        let model_type = self.0.model_type.clone();
        let policy = model_type.config().coercion;
        let mut valid = true;
        for (name, field) in model_type.fields() {
            let value = self.get(name).unwrap_or_default();
            let outcome = field.validate(name, &value, policy);
            let message = outcome.message().map(str::to_string);
            self.record(name, outcome);
            if let Some(message) = message {
                valid = false;
                on_error(name.as_str(), message.as_str());
            }
        }
        valid
    }

    /// Re-check every schema field without touching the error map or
    /// announcing anything.
    pub fn is_valid(&self) -> bool {
        let policy = self.0.model_type.config().coercion;
        self.0.model_type.fields().iter().all(|(name, field)| {
            let value = self.get(name).unwrap_or_default();
            field.validate(name, &value, policy).is_valid()
        })
    }

    fn record(&self, name: &str, outcome: Validation) {
        match outcome {
            Validation::Valid => {
                self.0.errors.borrow_mut().remove(name);
            }
            Validation::Invalid(message) => {
                tracing::debug!(
                    type_name = self.0.model_type.name(),
                    field = name,
                    message = %message,
                    "field failed validation"
                );
                self.0
                    .errors
                    .borrow_mut()
                    .insert(name.to_string(), message.clone());
                self.emit(&ModelEvent::ValidationError {
                    field: name.to_string(),
                    message,
                });
            }
        }
    }

    // ─── Serialization ──────────────────────────────────────────────

    /// Plain-data form over the schema fields, nested instances included.
    /// `ModelType::create` on the result yields an equal instance.
    pub fn serialize(&self) -> Value {
        let mut map = Map::new();
        for (name, _) in self.0.model_type.fields() {
            let value = self.get(name).map_or(Value::Null, |v| v.to_json());
            map.insert(name.clone(), value);
        }
        Value::Object(map)
    }
}

/// Whether `value` is a nested instance of exactly the referenced type, so
/// assignment adopts it instead of merging.
fn adoptable(type_ref: &TypeRef, value: &FieldValue) -> bool {
    let Some(target) = type_ref.resolve() else {
        return false;
    };
    match value {
        FieldValue::Model(m) => m.model_type().ptr_eq(&target),
        FieldValue::Collection(c) => c.element_type().is_some_and(|t| t.ptr_eq(&target)),
        _ => false,
    }
}

impl Notifier for Model {
    type Event = ModelEvent;

    fn emitter(&self) -> &EventEmitter<ModelEvent> {
        &self.0.events
    }
}

impl PropertyStore for Model {
    type Value = FieldValue;

    fn get(&self, name: &str) -> Option<FieldValue> {
        Model::get(self, name)
    }

    /// Assigns through [`Model::set`], so schema fields keep their
    /// coercion and validation.
    fn put(&self, name: &str, value: FieldValue) -> Option<FieldValue> {
        let previous = Model::get(self, name);
        self.set(name, value);
        previous
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.0.model_type.name() == other.0.model_type.name()
                && self.serialize() == other.serialize())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("type_tag", &self.type_tag())
            .field("values", &self.serialize())
            .field("errors", &self.errors())
            .finish()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::schema::SchemaBuilder;
    use proptest::prelude::*;
    use serde_json::json;

    fn person() -> ModelType {
        SchemaBuilder::new("Person")
            .field("name", FieldDescriptor::string())
            .field("age", FieldDescriptor::number().min(1.0).max(120.0))
            .field("active", FieldDescriptor::boolean())
            .build()
            .unwrap()
    }

    proptest! {
        #[test]
        fn serialize_then_create_is_identity(
            name in "[a-zA-Z ]{0,16}",
            age in 1i64..=120,
            active in any::<bool>(),
        ) {
            let ty = person();
            let m = ty.create(json!({"name": name, "age": age, "active": active})).unwrap();
            let again = ty.create(m.serialize()).unwrap();
            prop_assert_eq!(again.serialize(), m.serialize());
        }

        #[test]
        fn out_of_range_age_never_constructs(age in prop_oneof![-1000i64..1, 121i64..1000]) {
            let err = person().create(json!({"age": age})).unwrap_err();
            let is_age_error = matches!(err, ModelError::Construction { ref field, .. } if field == "age");
            prop_assert!(is_age_error);
        }

        #[test]
        fn set_keeps_error_map_in_sync(age in -50i64..200) {
            let m = person().instance();
            m.set("age", age);
            let in_range = (1..=120).contains(&age);
            prop_assert_eq!(m.error("age").is_none(), in_range);
            prop_assert_eq!(m.is_valid(), in_range);
        }
    }
}
