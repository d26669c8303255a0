//! # Type Registry
//!
//! Maps type names to finalized `ModelType`s so collections can be created
//! from a name alone. The registry is an explicit value owned by the
//! application; there is no process-wide instance.

use std::collections::HashMap;

use crate::error::{ModelError, SchemaError};
use crate::schema::ModelType;

/// Name → `ModelType` lookup table.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, ModelType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `model_type` under its own name.
    ///
    /// # Errors
    ///
    /// `SchemaError::DuplicateType` if a type with that name is registered.
    pub fn register(&mut self, model_type: &ModelType) -> Result<(), SchemaError> {
        let name = model_type.name();
        if self.types.contains_key(name) {
            return Err(SchemaError::DuplicateType {
                name: name.to_string(),
            });
        }
        tracing::debug!(type_name = name, "model type registered");
        self.types.insert(name.to_string(), model_type.clone());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ModelType> {
        self.types.get(name)
    }

    /// Like [`TypeRegistry::get`], but a miss is an error.
    pub fn resolve(&self, name: &str) -> Result<ModelType, ModelError> {
        self.get(name).cloned().ok_or_else(|| ModelError::UnknownType {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDescriptor;
    use crate::schema::SchemaBuilder;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = TypeRegistry::new();
        let person = SchemaBuilder::new("Person")
            .field("name", FieldDescriptor::string())
            .register(&mut registry)
            .unwrap();

        assert!(registry.contains("Person"));
        assert!(registry.resolve("Person").unwrap().ptr_eq(&person));
        assert_eq!(registry.names(), vec!["Person"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = TypeRegistry::new();
        SchemaBuilder::new("Person").register(&mut registry).unwrap();
        let err = SchemaBuilder::new("Person").register(&mut registry).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateType {
                name: "Person".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_name() {
        let registry = TypeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.resolve("Ghost").unwrap_err(),
            ModelError::UnknownType {
                name: "Ghost".to_string()
            }
        );
    }
}
