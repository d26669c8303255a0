//! # Field Descriptors — Per-Field Coercion, Defaults, Validation
//!
//! A `FieldDescriptor` describes one schema field: its kind, the
//! `required`/`nullable`/`key` flags and kind-specific options (string
//! default, number bounds, referenced model type). Descriptors are declared
//! once per type and shared read-only by every instance of it.
//!
//! Each descriptor answers three questions:
//!
//! - **default**: what a fresh instance holds before seed data is applied;
//! - **coerce**: how loosely typed input becomes the field's canonical form;
//! - **validate**: whether a coerced value is acceptable, and if not, why.
//!
//! ## Coercion Policy
//!
//! Input that has no lossless reading (`"abc"` for a number, `"maybe"` for
//! a boolean, `"soon"` for a date-time) is handled per `CoercionPolicy`.
//! Lenient coercion replaces it with the kind's fallback and logs at
//! `debug`; strict coercion keeps it so validation reports the mismatch.
//! JSON text for object/array fields that fails to parse is kept under
//! both policies and always fails validation.
//!
//! ## Self References
//!
//! A collection field may reference the type that declares it. Such a
//! descriptor starts with an unbound [`TypeRef`] and is bound exactly once,
//! when `SchemaBuilder::build` finalizes the owning type.

use std::fmt;
use std::rc::Weak;

use serde_json::Value;
use typebind_core::coerce::{number_from_text, number_value, parse_json_text, stringify};
use typebind_core::{CoercionPolicy, Timestamp};

use crate::collection::Collection;
use crate::error::ModelError;
use crate::schema::{ModelType, ModelTypeInner};
use crate::value::FieldValue;

// ─── Type References ────────────────────────────────────────────────

#[derive(Clone)]
enum Binding {
    Direct(ModelType),
    SelfPending,
    SelfBound(Weak<ModelTypeInner>),
}

/// The model type referenced by a model or collection field.
#[derive(Clone)]
pub struct TypeRef(Binding);

impl TypeRef {
    /// Reference to a concrete, already built type.
    pub fn direct(model_type: &ModelType) -> Self {
        Self(Binding::Direct(model_type.clone()))
    }

    /// Placeholder for the declaring type, bound at schema build.
    pub fn self_type() -> Self {
        Self(Binding::SelfPending)
    }

    /// Whether this reference points at the declaring type.
    pub fn is_self(&self) -> bool {
        !matches!(self.0, Binding::Direct(_))
    }

    /// The referenced type, or `None` while a self reference is unbound.
    pub fn resolve(&self) -> Option<ModelType> {
        match &self.0 {
            Binding::Direct(t) => Some(t.clone()),
            Binding::SelfPending => None,
            Binding::SelfBound(weak) => weak.upgrade().map(ModelType::from_inner),
        }
    }

    fn bind(self, owner: &Weak<ModelTypeInner>) -> Self {
        match self.0 {
            Binding::SelfPending => Self(Binding::SelfBound(owner.clone())),
            other => Self(other),
        }
    }

    fn unbind(self) -> Self {
        match self.0 {
            Binding::SelfBound(_) => Self(Binding::SelfPending),
            other => Self(other),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Binding::Direct(t) => write!(f, "TypeRef({})", t.name()),
            Binding::SelfPending => f.write_str("TypeRef(self, unbound)"),
            Binding::SelfBound(weak) => match weak.upgrade() {
                Some(inner) => write!(f, "TypeRef(self = {})", ModelType::from_inner(inner).name()),
                None => f.write_str("TypeRef(self, dropped)"),
            },
        }
    }
}

// ─── Field Kinds ────────────────────────────────────────────────────

/// Closed set of field kinds with their kind-specific options.
#[derive(Debug, Clone)]
pub enum FieldKind {
    String {
        default: Option<String>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
        default: Option<f64>,
    },
    Boolean,
    DateTime,
    /// Opaque JSON object.
    Object,
    /// Opaque JSON array.
    Array,
    /// Nested typed object.
    Model(TypeRef),
    /// Nested typed aggregate.
    Collection(TypeRef),
}

impl FieldKind {
    /// Lowercase kind name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Number { .. } => "number",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Object => "object",
            Self::Array => "array",
            Self::Model(_) => "model",
            Self::Collection(_) => "collection",
        }
    }
}

/// Outcome of validating a single field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The failure message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid(message) => Some(message.as_str()),
        }
    }
}

// ─── Descriptor ─────────────────────────────────────────────────────

/// Immutable description of one schema field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    kind: FieldKind,
    required: bool,
    nullable: bool,
    key: bool,
}

impl FieldDescriptor {
    fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            nullable: false,
            key: false,
        }
    }

    pub fn string() -> Self {
        Self::of(FieldKind::String { default: None })
    }

    pub fn number() -> Self {
        Self::of(FieldKind::Number {
            min: None,
            max: None,
            default: None,
        })
    }

    pub fn boolean() -> Self {
        Self::of(FieldKind::Boolean)
    }

    pub fn datetime() -> Self {
        Self::of(FieldKind::DateTime)
    }

    pub fn object() -> Self {
        Self::of(FieldKind::Object)
    }

    pub fn array() -> Self {
        Self::of(FieldKind::Array)
    }

    /// A nested instance of `model_type`.
    pub fn model(model_type: &ModelType) -> Self {
        Self::of(FieldKind::Model(TypeRef::direct(model_type)))
    }

    /// A nested collection whose elements are `element_type` instances.
    pub fn collection(element_type: &ModelType) -> Self {
        Self::of(FieldKind::Collection(TypeRef::direct(element_type)))
    }

    /// A nested collection of the declaring type itself.
    pub fn collection_of_self() -> Self {
        Self::of(FieldKind::Collection(TypeRef::self_type()))
    }

    /// Mark the field required: null (and, for strings, empty) values fail.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Allow null. Nullable booleans and date-times default to null.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark the field as the type's identity key.
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Lower bound for a number field.
    pub fn min(mut self, bound: f64) -> Self {
        match &mut self.kind {
            FieldKind::Number { min, .. } => *min = Some(bound),
            other => ignored_option("min", other),
        }
        self
    }

    /// Upper bound for a number field.
    pub fn max(mut self, bound: f64) -> Self {
        match &mut self.kind {
            FieldKind::Number { max, .. } => *max = Some(bound),
            other => ignored_option("max", other),
        }
        self
    }

    /// Default text for a string field.
    pub fn default_text(mut self, text: impl Into<String>) -> Self {
        match &mut self.kind {
            FieldKind::String { default } => *default = Some(text.into()),
            other => ignored_option("default_text", other),
        }
        self
    }

    /// Default value for a number field.
    pub fn default_number(mut self, n: f64) -> Self {
        match &mut self.kind {
            FieldKind::Number { default, .. } => *default = Some(n),
            other => ignored_option("default_number", other),
        }
        self
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_key(&self) -> bool {
        self.key
    }

    pub(crate) fn bind_self(mut self, owner: &Weak<ModelTypeInner>) -> Self {
        self.kind = match self.kind {
            FieldKind::Model(r) => FieldKind::Model(r.bind(owner)),
            FieldKind::Collection(r) => FieldKind::Collection(r.bind(owner)),
            other => other,
        };
        self
    }

    pub(crate) fn unbind_self(mut self) -> Self {
        self.kind = match self.kind {
            FieldKind::Model(r) => FieldKind::Model(r.unbind()),
            FieldKind::Collection(r) => FieldKind::Collection(r.unbind()),
            other => other,
        };
        self
    }

    // ─── Defaults ───────────────────────────────────────────────────

    /// The value a fresh instance holds before seed data is applied.
    ///
    /// Date-time fields evaluate the current time on every call.
    pub fn default_value(&self) -> FieldValue {
        match &self.kind {
            FieldKind::String { default } => {
                FieldValue::from(default.clone().unwrap_or_default())
            }
            FieldKind::Number { min, default, .. } => {
                FieldValue::from(default.or(*min).unwrap_or(0.0))
            }
            FieldKind::Boolean if self.nullable => FieldValue::NULL,
            FieldKind::Boolean => FieldValue::from(false),
            FieldKind::DateTime if self.nullable => FieldValue::NULL,
            FieldKind::DateTime => FieldValue::DateTime(Timestamp::now()),
            FieldKind::Object => FieldValue::Plain(Value::Object(serde_json::Map::new())),
            FieldKind::Array => FieldValue::Plain(Value::Array(Vec::new())),
            FieldKind::Model(r) => match r.resolve() {
                Some(t) => FieldValue::Model(t.instance()),
                None => unbound_default(self),
            },
            FieldKind::Collection(r) => match r.resolve() {
                Some(t) => FieldValue::Collection(Collection::new(&t)),
                None => unbound_default(self),
            },
        }
    }

    // ─── Coercion ───────────────────────────────────────────────────

    /// Convert `input` into this field's canonical form.
    ///
    /// # Errors
    ///
    /// Only model and collection fields fail: when the nested instance
    /// cannot be constructed from `input`, or when a self reference is
    /// still unbound.
    pub fn coerce(
        &self,
        name: &str,
        input: FieldValue,
        policy: CoercionPolicy,
    ) -> Result<FieldValue, ModelError> {
        let coerced = match &self.kind {
            FieldKind::String { .. } => coerce_string(input),
            FieldKind::Number { .. } => self.coerce_number(name, input, policy),
            FieldKind::Boolean => self.coerce_boolean(name, input, policy),
            FieldKind::DateTime => self.coerce_datetime(name, input, policy),
            FieldKind::Object | FieldKind::Array => coerce_container(input),
            FieldKind::Model(r) => {
                let model_type = resolve(r, name)?;
                match input {
                    FieldValue::Model(m) if m.model_type().ptr_eq(&model_type) => {
                        FieldValue::Model(m)
                    }
                    FieldValue::Plain(Value::Null) => FieldValue::Model(model_type.instance()),
                    other => FieldValue::Model(model_type.create(other)?),
                }
            }
            FieldKind::Collection(r) => {
                let element_type = resolve(r, name)?;
                match input {
                    FieldValue::Collection(c)
                        if c.element_type().is_some_and(|t| t.ptr_eq(&element_type)) =>
                    {
                        FieldValue::Collection(c)
                    }
                    other => FieldValue::Collection(Collection::new(&element_type).seeded(other)?),
                }
            }
        };
        tracing::trace!(field = name, kind = self.kind.name(), "coerced field value");
        Ok(coerced)
    }

    fn coerce_number(&self, name: &str, input: FieldValue, policy: CoercionPolicy) -> FieldValue {
        let converted = match &input {
            FieldValue::Plain(Value::Null) => return FieldValue::NULL,
            FieldValue::Plain(Value::Number(_)) => return input,
            FieldValue::Plain(Value::String(s)) => number_from_text(s),
            FieldValue::Plain(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::DateTime(ts) => Some(ts.epoch_millis() as f64),
            _ => None,
        };
        match converted {
            Some(n) => FieldValue::Plain(number_value(n)),
            None => self.lossy(name, input, FieldValue::NULL, policy),
        }
    }

    fn coerce_boolean(&self, name: &str, input: FieldValue, policy: CoercionPolicy) -> FieldValue {
        let fallback = if self.nullable {
            FieldValue::NULL
        } else {
            FieldValue::from(false)
        };
        match &input {
            FieldValue::Plain(Value::Bool(true)) => FieldValue::from(true),
            FieldValue::Plain(Value::String(s)) if s == "true" => FieldValue::from(true),
            FieldValue::Plain(Value::Bool(false)) if policy.is_strict() => input,
            FieldValue::Plain(Value::String(s)) if s == "false" && policy.is_strict() => {
                FieldValue::from(false)
            }
            FieldValue::Plain(Value::Null | Value::Bool(false)) => fallback,
            FieldValue::Plain(Value::String(s)) if s == "false" => fallback,
            _ => self.lossy(name, input, fallback, policy),
        }
    }

    fn coerce_datetime(&self, name: &str, input: FieldValue, policy: CoercionPolicy) -> FieldValue {
        let converted = match &input {
            FieldValue::Plain(Value::Null) | FieldValue::DateTime(_) => return input,
            FieldValue::Plain(Value::String(s)) => Timestamp::parse_lenient(s).ok(),
            FieldValue::Plain(Value::Number(n)) => n
                .as_f64()
                .filter(|m| m.is_finite())
                .and_then(|m| Timestamp::from_epoch_millis(m as i64).ok()),
            _ => None,
        };
        match converted {
            Some(ts) => FieldValue::DateTime(ts),
            None => self.lossy(name, input, FieldValue::NULL, policy),
        }
    }

    fn lossy(
        &self,
        name: &str,
        input: FieldValue,
        fallback: FieldValue,
        policy: CoercionPolicy,
    ) -> FieldValue {
        tracing::debug!(
            field = name,
            kind = self.kind.name(),
            input = input.kind_name(),
            policy = %policy,
            "input has no lossless reading"
        );
        if policy.is_strict() {
            input
        } else {
            fallback
        }
    }

    // ─── Validation ─────────────────────────────────────────────────

    /// Check a coerced value against this field's rules.
    pub fn validate(&self, name: &str, value: &FieldValue, policy: CoercionPolicy) -> Validation {
        if value.is_null() {
            return if self.required {
                Validation::Invalid(format!("{name} is required"))
            } else {
                Validation::Valid
            };
        }
        let strict = policy.is_strict();
        match (&self.kind, value) {
            (FieldKind::String { .. }, FieldValue::Plain(Value::String(s))) => {
                if self.required && s.is_empty() {
                    Validation::Invalid(format!("{name} is required"))
                } else {
                    Validation::Valid
                }
            }
            (FieldKind::Number { min, max, .. }, FieldValue::Plain(Value::Number(n))) => {
                let n = n.as_f64().unwrap_or(0.0);
                if let Some(min) = min.filter(|m| n < *m) {
                    return Validation::Invalid(format!("value cannot be less than {min}"));
                }
                if let Some(max) = max.filter(|m| n > *m) {
                    return Validation::Invalid(format!("value cannot be greater than {max}"));
                }
                Validation::Valid
            }
            (FieldKind::Number { .. }, _) => invalid("value is not a number"),
            (FieldKind::Boolean, FieldValue::Plain(Value::Bool(_))) => Validation::Valid,
            (FieldKind::Boolean, _) => invalid("value is not a boolean"),
            (FieldKind::DateTime, FieldValue::DateTime(_)) => Validation::Valid,
            (FieldKind::DateTime, _) => invalid("value is not a valid date-time"),
            (FieldKind::Object | FieldKind::Array, FieldValue::Plain(Value::String(_))) => {
                invalid("value is not valid JSON")
            }
            (FieldKind::Object, v) if strict && !matches!(v, FieldValue::Plain(Value::Object(_))) => {
                invalid("value is not an object")
            }
            (FieldKind::Array, v) if strict && !matches!(v, FieldValue::Plain(Value::Array(_))) => {
                invalid("value is not an array")
            }
            _ => Validation::Valid,
        }
    }
}

fn invalid(message: &str) -> Validation {
    Validation::Invalid(message.to_string())
}

fn coerce_string(input: FieldValue) -> FieldValue {
    match input {
        FieldValue::Plain(Value::Null) => FieldValue::NULL,
        FieldValue::Plain(Value::String(_)) => input,
        FieldValue::Plain(other) => FieldValue::from(stringify(&other)),
        FieldValue::DateTime(ts) => FieldValue::from(ts.to_iso8601()),
        nested => FieldValue::from(nested.to_json().to_string()),
    }
}

fn coerce_container(input: FieldValue) -> FieldValue {
    match input {
        FieldValue::Plain(Value::String(text)) => match parse_json_text(&text) {
            Some(parsed) => FieldValue::Plain(parsed),
            None => FieldValue::Plain(Value::String(text)),
        },
        FieldValue::Plain(_) => input,
        nested => FieldValue::Plain(nested.to_json()),
    }
}

fn resolve(type_ref: &TypeRef, field: &str) -> Result<ModelType, ModelError> {
    type_ref
        .resolve()
        .ok_or_else(|| ModelError::UnboundSelfReference {
            field: field.to_string(),
        })
}

fn unbound_default(field: &FieldDescriptor) -> FieldValue {
    tracing::warn!(kind = field.kind.name(), "self reference used before schema build");
    FieldValue::NULL
}

fn ignored_option(option: &'static str, kind: &FieldKind) {
    tracing::warn!(option, kind = kind.name(), "option does not apply to this field kind; ignored");
}
