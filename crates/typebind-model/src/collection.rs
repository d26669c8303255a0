//! # Typed Collections
//!
//! A `Collection` is an ordered, shared list of values, usually models of
//! one element type. Every model it holds is watched: a `Change` on the
//! element is re-announced as `CollectionEvent::Update` carrying that same
//! element, so observers of the collection see mutations of its items.
//!
//! ## Ownership
//!
//! The bubbling handler lives in the element's emitter and holds only weak
//! references to the collection and the element, so neither keeps the
//! other alive. Removing an element (or clearing the collection) drops its
//! handler.
//!
//! ## Traversal
//!
//! `for_each`, `map`, `find` and `find_first` iterate over a snapshot of
//! the items, so callbacks may add or remove items without invalidating
//! the traversal.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use typebind_core::{EventEmitter, Notifier, SubscriptionId};

use crate::error::ModelError;
use crate::model::{Model, ModelEvent};
use crate::registry::TypeRegistry;
use crate::schema::ModelType;
use crate::seed::Seed;
use crate::value::FieldValue;

const DEFAULT_TYPE_TAG: &str = "Collection";

/// Notifications announced by a [`Collection`].
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionEvent {
    /// An item was appended.
    Add(FieldValue),
    /// A model held by the collection announced a change.
    Update(Model),
    /// An item was removed.
    Remove(FieldValue),
}

struct Entry {
    value: FieldValue,
    subscription: Option<SubscriptionId>,
}

struct CollectionInner {
    type_tag: RefCell<String>,
    element_type: Option<ModelType>,
    items: RefCell<Vec<Entry>>,
    events: EventEmitter<CollectionEvent>,
}

/// Shared handle to an ordered collection.
#[derive(Clone)]
pub struct Collection(Rc<CollectionInner>);

impl Collection {
    fn with_element_type(element_type: Option<ModelType>) -> Self {
        Self(Rc::new(CollectionInner {
            type_tag: RefCell::new(DEFAULT_TYPE_TAG.to_string()),
            element_type,
            items: RefCell::new(Vec::new()),
            events: EventEmitter::new(),
        }))
    }

    /// An empty collection whose non-model items are constructed as
    /// `element_type` instances.
    pub fn new(element_type: &ModelType) -> Self {
        Self::with_element_type(Some(element_type.clone()))
    }

    /// An empty collection that stores items as given.
    pub fn untyped() -> Self {
        Self::with_element_type(None)
    }

    /// An empty collection of the type registered as `name`.
    pub fn from_registry(registry: &TypeRegistry, name: &str) -> Result<Self, ModelError> {
        registry.resolve(name).map(|t| Self::new(&t))
    }

    pub fn with_type_tag(self, tag: impl Into<String>) -> Self {
        *self.0.type_tag.borrow_mut() = tag.into();
        self
    }

    /// Add every item of `seed`: an array, JSON text of an array, a list of
    /// items, or another collection.
    pub fn seeded(self, seed: impl Into<Seed>) -> Result<Self, ModelError> {
        for item in seed_items(seed.into())? {
            self.add(item)?;
        }
        Ok(self)
    }

    pub fn type_tag(&self) -> String {
        self.0.type_tag.borrow().clone()
    }

    pub fn element_type(&self) -> Option<&ModelType> {
        self.0.element_type.as_ref()
    }

    /// Whether both handles refer to the same collection.
    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.items.borrow().is_empty()
    }

    // ─── Mutation ───────────────────────────────────────────────────

    /// Append `item`. With an element type set, a model of that type is
    /// adopted and anything else is used to construct a new element.
    ///
    /// # Errors
    ///
    /// Construction errors of the element type; the collection is left
    /// unchanged.
    pub fn add(&self, item: impl Into<FieldValue>) -> Result<(), ModelError> {
        let item = self.prepare(item.into())?;
        self.append(item);
        Ok(())
    }

    fn prepare(&self, item: FieldValue) -> Result<FieldValue, ModelError> {
        match (&self.0.element_type, item) {
            (None, item) => Ok(item),
            (Some(element_type), FieldValue::Model(m)) if m.model_type().ptr_eq(element_type) => {
                Ok(FieldValue::Model(m))
            }
            (Some(element_type), other) => element_type.create(other).map(FieldValue::Model),
        }
    }

    fn append(&self, item: FieldValue) {
        let subscription = item.as_model().map(|m| self.bubble(m));
        let len = {
            let mut items = self.0.items.borrow_mut();
            items.push(Entry {
                value: item.clone(),
                subscription,
            });
            items.len()
        };
        tracing::trace!(tag = %self.type_tag(), len, "item added");
        self.emit(&CollectionEvent::Add(item));
    }

    fn bubble(&self, model: &Model) -> SubscriptionId {
        let collection = Rc::downgrade(&self.0);
        let source = model.downgrade();
        model.on(move |event| {
            if !matches!(event, ModelEvent::Change { .. }) {
                return;
            }
            if let (Some(inner), Some(model)) = (collection.upgrade(), source.upgrade()) {
                Collection(inner).emit(&CollectionEvent::Update(model));
            }
        })
    }

    /// Remove and return the first item matching `predicate`.
    pub fn remove(&self, mut predicate: impl FnMut(&FieldValue) -> bool) -> Option<FieldValue> {
        let target = self.items().into_iter().find(|item| predicate(item))?;
        let entry = {
            let mut items = self.0.items.borrow_mut();
            let index = items.iter().position(|e| e.value.same_item(&target))?;
            items.remove(index)
        };
        self.release(&entry);
        tracing::trace!(tag = %self.type_tag(), len = self.len(), "item removed");
        self.emit(&CollectionEvent::Remove(entry.value.clone()));
        Some(entry.value)
    }

    /// Remove every item.
    pub fn clear(&self) {
        let entries = std::mem::take(&mut *self.0.items.borrow_mut());
        for entry in entries {
            self.release(&entry);
            self.emit(&CollectionEvent::Remove(entry.value));
        }
    }

    /// Replace the contents with the items of `source` (an array, JSON text
    /// of an array, a list of items, or another collection), keeping this
    /// collection's identity and subscribers.
    ///
    /// # Errors
    ///
    /// Parse and element construction errors; the contents are replaced
    /// only when every item converts.
    pub fn update(&self, source: impl Into<Seed>) -> Result<(), ModelError> {
        let prepared = seed_items(source.into())?
            .into_iter()
            .map(|item| self.prepare(item))
            .collect::<Result<Vec<_>, _>>()?;
        self.clear();
        for item in prepared {
            self.append(item);
        }
        Ok(())
    }

    fn release(&self, entry: &Entry) {
        if let (Some(id), Some(model)) = (entry.subscription, entry.value.as_model()) {
            model.off(id);
        }
    }

    // ─── Access ─────────────────────────────────────────────────────

    /// Item at `index`.
    pub fn at(&self, index: usize) -> Result<FieldValue, ModelError> {
        let items = self.0.items.borrow();
        items
            .get(index)
            .map(|e| e.value.clone())
            .ok_or(ModelError::OutOfRange {
                index,
                len: items.len(),
            })
    }

    /// Snapshot of the items in order.
    pub fn items(&self) -> Vec<FieldValue> {
        self.0.items.borrow().iter().map(|e| e.value.clone()).collect()
    }

    pub fn for_each(&self, mut visit: impl FnMut(&FieldValue)) {
        for item in self.items() {
            visit(&item);
        }
    }

    pub fn map<T>(&self, f: impl FnMut(&FieldValue) -> T) -> Vec<T> {
        self.items().iter().map(f).collect()
    }

    /// Every item matching `predicate`, in order.
    pub fn find(&self, mut predicate: impl FnMut(&FieldValue) -> bool) -> Vec<FieldValue> {
        self.items().into_iter().filter(|item| predicate(item)).collect()
    }

    /// The first item matching `predicate`.
    pub fn find_first(&self, mut predicate: impl FnMut(&FieldValue) -> bool) -> Option<FieldValue> {
        self.items().into_iter().find(|item| predicate(item))
    }

    /// Plain-data form: an array of the serialized items.
    pub fn serialize(&self) -> Value {
        Value::Array(self.items().iter().map(FieldValue::to_json).collect())
    }
}

fn seed_items(seed: Seed) -> Result<Vec<FieldValue>, ModelError> {
    let seed = match seed {
        Seed::Value(value) => value,
        Seed::Items(items) => return Ok(items),
        Seed::Fields(_) => {
            tracing::debug!("field seed contributes no items");
            return Ok(Vec::new());
        }
    };
    match seed {
        FieldValue::Plain(Value::Null) => Ok(Vec::new()),
        FieldValue::Plain(Value::Array(items)) => {
            Ok(items.into_iter().map(FieldValue::Plain).collect())
        }
        FieldValue::Plain(Value::String(text)) => {
            match serde_json::from_str::<Value>(&text).map_err(|e| ModelError::invalid_json(&e))? {
                Value::Array(items) => Ok(items.into_iter().map(FieldValue::Plain).collect()),
                _ => {
                    tracing::debug!("collection seed text is not an array; ignored");
                    Ok(Vec::new())
                }
            }
        }
        FieldValue::Collection(c) => Ok(c.items()),
        other => {
            tracing::debug!(seed = other.kind_name(), "collection seed contributes no items");
            Ok(Vec::new())
        }
    }
}

impl Notifier for Collection {
    type Event = CollectionEvent;

    fn emitter(&self) -> &EventEmitter<CollectionEvent> {
        &self.0.events
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.serialize() == other.serialize()
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("type_tag", &self.type_tag())
            .field("element_type", &self.element_type().map(ModelType::name))
            .field("items", &self.serialize())
            .finish()
    }
}
