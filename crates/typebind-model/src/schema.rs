//! # Schemas — Model Types and the Two-Phase Builder
//!
//! A `ModelType` is the frozen schema of one typed object: its name, its
//! ordered fields, its identity field and its `ModelConfig`. Cloning a
//! `ModelType` clones a handle; identity is pointer identity.
//!
//! ## Build Phases
//!
//! ```text
//! SchemaBuilder::new("Node")
//!     .field("children", FieldDescriptor::collection_of_self())   ← sentinel
//!     .build()                                                   ← bound to Node
//! ```
//!
//! `build()` first checks the declaration (at most one number key, sane
//! bounds, every default passing its own field's validation), then
//! allocates the type
//! with `Rc::new_cyclic` so every `self` sentinel is bound to the new type
//! before any instance of it can exist.
//!
//! ## Composition
//!
//! `SchemaBuilder::extend(&base, name)` starts from a copy of `base`'s
//! fields and config. Re-declaring a field replaces the inherited
//! descriptor in place. Inherited `self` references are re-bound to the
//! derived type.

use std::fmt;
use std::rc::Rc;

use typebind_core::ModelConfig;

use crate::error::{ModelError, SchemaError};
use crate::field::{FieldDescriptor, FieldKind, Validation};
use crate::model::Model;
use crate::registry::TypeRegistry;
use crate::seed::Seed;

pub(crate) struct ModelTypeInner {
    name: String,
    fields: Vec<(String, FieldDescriptor)>,
    key_field: Option<String>,
    config: ModelConfig,
}

/// Shared handle to a finalized schema.
#[derive(Clone)]
pub struct ModelType(Rc<ModelTypeInner>);

impl ModelType {
    pub(crate) fn from_inner(inner: Rc<ModelTypeInner>) -> Self {
        Self(inner)
    }

    /// Type name, also the default type tag of its instances.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[(String, FieldDescriptor)] {
        &self.0.fields
    }

    /// Descriptor of `name`, if it is a schema field.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.0
            .fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, descriptor)| descriptor)
    }

    /// Name of the identity field, if one is declared.
    pub fn key_field(&self) -> Option<&str> {
        self.0.key_field.as_deref()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.0.config
    }

    /// Whether both handles refer to the same type.
    pub fn ptr_eq(&self, other: &ModelType) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Construct an instance from `seed`: a JSON object, JSON text of an
    /// object, named field values, another model, or null. Models and
    /// collections among named field values are adopted by reference when
    /// their type matches the field.
    ///
    /// # Errors
    ///
    /// `ModelError::InvalidJson` for seed text that does not parse, and
    /// `ModelError::Construction` for the first seed field that fails
    /// coercion or validation.
    pub fn create(&self, seed: impl Into<Seed>) -> Result<Model, ModelError> {
        Model::construct(self.clone(), seed.into())
    }

    /// Construct an instance holding only defaults.
    pub fn instance(&self) -> Model {
        Model::with_defaults(self.clone())
    }
}

impl PartialEq for ModelType {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("name", &self.0.name)
            .field(
                "fields",
                &self.0.fields.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
            )
            .field("key_field", &self.0.key_field)
            .finish()
    }
}

// ─── Builder ────────────────────────────────────────────────────────

/// Declares a schema and freezes it into a [`ModelType`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<(String, FieldDescriptor)>,
    config: ModelConfig,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            config: ModelConfig::default(),
        }
    }

    /// Start a new type from `base`'s fields and configuration.
    pub fn extend(base: &ModelType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: base
                .fields()
                .iter()
                .map(|(n, d)| (n.clone(), d.clone().unbind_self()))
                .collect(),
            config: *base.config(),
        }
    }

    /// Declare a field. Re-declaring a name replaces its descriptor and
    /// keeps its position.
    pub fn field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => {
                tracing::debug!(type_name = %self.name, field = %name, "field re-declared");
                slot.1 = descriptor;
            }
            None => self.fields.push((name, descriptor)),
        }
        self
    }

    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    /// Check the declaration and freeze it.
    pub fn build(self) -> Result<ModelType, SchemaError> {
        let key_field = self.check()?;
        let Self {
            name,
            fields,
            config,
        } = self;
        let field_count = fields.len();
        let inner = Rc::new_cyclic(|owner| ModelTypeInner {
            name,
            fields: fields
                .into_iter()
                .map(|(n, d)| (n, d.bind_self(owner)))
                .collect(),
            key_field,
            config,
        });
        let model_type = ModelType(inner);
        tracing::debug!(
            type_name = model_type.name(),
            fields = field_count,
            coercion = %model_type.config().coercion,
            "schema built"
        );
        Ok(model_type)
    }

    /// Build and add the type to `registry`.
    pub fn register(self, registry: &mut TypeRegistry) -> Result<ModelType, SchemaError> {
        let model_type = self.build()?;
        registry.register(&model_type)?;
        Ok(model_type)
    }

    fn check(&self) -> Result<Option<String>, SchemaError> {
        let mut key_field: Option<String> = None;
        for (field, descriptor) in &self.fields {
            match descriptor.kind() {
                FieldKind::Number {
                    min: Some(min),
                    max: Some(max),
                    ..
                } if min > max => {
                    return Err(SchemaError::InvalidBounds {
                        type_name: self.name.clone(),
                        field: field.clone(),
                        min: *min,
                        max: *max,
                    });
                }
                _ => {}
            }
            self.check_default(field, descriptor)?;
            if !descriptor.is_key() {
                continue;
            }
            if !matches!(descriptor.kind(), FieldKind::Number { .. }) {
                return Err(SchemaError::InvalidKeyKind {
                    type_name: self.name.clone(),
                    field: field.clone(),
                    kind: descriptor.kind().name(),
                });
            }
            if let Some(first) = &key_field {
                return Err(SchemaError::MultipleKeys {
                    type_name: self.name.clone(),
                    first: first.clone(),
                    second: field.clone(),
                });
            }
            key_field = Some(field.clone());
        }
        Ok(key_field)
    }

    /// A default must pass its own field's validation, so that every fresh
    /// instance is valid and survives `create(instance().serialize())`.
    /// Nested defaults are instances of already checked types.
    fn check_default(&self, field: &str, descriptor: &FieldDescriptor) -> Result<(), SchemaError> {
        if matches!(descriptor.kind(), FieldKind::Model(_) | FieldKind::Collection(_)) {
            return Ok(());
        }
        let default = descriptor.default_value();
        match descriptor.validate(field, &default, self.config.coercion) {
            Validation::Valid => Ok(()),
            Validation::Invalid(message) => Err(SchemaError::InvalidDefault {
                type_name: self.name.clone(),
                field: field.to_string(),
                message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> ModelType {
        SchemaBuilder::new("Person")
            .field("id", FieldDescriptor::number().key())
            .field("name", FieldDescriptor::string())
            .field("age", FieldDescriptor::number().min(1.0).max(120.0))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_preserves_declaration_order() {
        let ty = person();
        let names: Vec<&str> = ty.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "age"]);
        assert_eq!(ty.key_field(), Some("id"));
        assert_eq!(ty.name(), "Person");
    }

    #[test]
    fn test_redeclared_field_replaces_in_place() {
        let ty = SchemaBuilder::new("T")
            .field("a", FieldDescriptor::string())
            .field("b", FieldDescriptor::string())
            .field("a", FieldDescriptor::number())
            .build()
            .unwrap();
        assert_eq!(ty.fields().len(), 2);
        assert_eq!(ty.fields()[0].0, "a");
        assert!(matches!(ty.field("a").unwrap().kind(), FieldKind::Number { .. }));
    }

    #[test]
    fn test_multiple_keys_rejected() {
        let err = SchemaBuilder::new("T")
            .field("a", FieldDescriptor::number().key())
            .field("b", FieldDescriptor::number().key())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::MultipleKeys {
                type_name: "T".to_string(),
                first: "a".to_string(),
                second: "b".to_string(),
            }
        );
    }

    #[test]
    fn test_key_on_string_rejected() {
        let err = SchemaBuilder::new("T")
            .field("code", FieldDescriptor::string().key())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidKeyKind { kind: "string", .. }));
    }

    #[test]
    fn test_required_string_needs_non_empty_default() {
        for descriptor in [
            FieldDescriptor::string().required(),
            FieldDescriptor::string().required().default_text(""),
        ] {
            let err = SchemaBuilder::new("T").field("name", descriptor).build().unwrap_err();
            assert_eq!(
                err,
                SchemaError::InvalidDefault {
                    type_name: "T".to_string(),
                    field: "name".to_string(),
                    message: "name is required".to_string(),
                }
            );
        }
        assert!(SchemaBuilder::new("T")
            .field("name", FieldDescriptor::string().required().default_text("anon"))
            .build()
            .is_ok());
    }

    #[test]
    fn test_defaults_outside_constraints_rejected() {
        let err = SchemaBuilder::new("T")
            .field("n", FieldDescriptor::number().max(-1.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { ref message, .. } if message == "value cannot be greater than -1"));

        let err = SchemaBuilder::new("T")
            .field("flag", FieldDescriptor::boolean().nullable().required())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { ref field, .. } if field == "flag"));
    }

    #[test]
    fn test_environment_is_not_read_implicitly() {
        let ty = SchemaBuilder::new("T").build().unwrap();
        assert_eq!(*ty.config(), ModelConfig::default());
        let strict = SchemaBuilder::new("T").config(ModelConfig::strict()).build().unwrap();
        assert!(strict.config().coercion.is_strict());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = SchemaBuilder::new("T")
            .field("n", FieldDescriptor::number().min(10.0).max(1.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidBounds { .. }));
    }

    #[test]
    fn test_self_reference_bound_at_build() {
        let node = SchemaBuilder::new("Node")
            .field("children", FieldDescriptor::collection_of_self())
            .build()
            .unwrap();
        match node.field("children").unwrap().kind() {
            FieldKind::Collection(r) => {
                assert!(r.is_self());
                assert!(r.resolve().unwrap().ptr_eq(&node));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_extend_rebinds_self_reference_to_derived_type() {
        let node = SchemaBuilder::new("Node")
            .field("name", FieldDescriptor::string())
            .field("children", FieldDescriptor::collection_of_self())
            .build()
            .unwrap();
        let tagged = SchemaBuilder::extend(&node, "TaggedNode")
            .field("tag", FieldDescriptor::string())
            .build()
            .unwrap();

        assert_eq!(tagged.fields().len(), 3);
        let FieldKind::Collection(r) = tagged.field("children").unwrap().kind() else {
            panic!("children should be a collection");
        };
        assert!(r.resolve().unwrap().ptr_eq(&tagged));
    }

    #[test]
    fn test_extend_keeps_direct_references() {
        let person = person();
        let team = SchemaBuilder::new("Team")
            .field("lead", FieldDescriptor::model(&person))
            .build()
            .unwrap();
        let squad = SchemaBuilder::extend(&team, "Squad").build().unwrap();
        let FieldKind::Model(r) = squad.field("lead").unwrap().kind() else {
            panic!("lead should be a model");
        };
        assert!(!r.is_self());
        assert!(r.resolve().unwrap().ptr_eq(&person));
    }

    #[test]
    fn test_model_types_compare_by_identity() {
        let a = person();
        let b = person();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
