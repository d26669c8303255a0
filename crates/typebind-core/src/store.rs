//! # Property Store
//!
//! `PropertyStore` is the keyed get/put capability that typed models layer
//! coercion and validation on top of. `PropertyMap<V>` is the plain
//! implementation: interior-mutable, unvalidated, and cheap to share behind
//! an `Rc`.

use std::cell::RefCell;
use std::collections::HashMap;

/// Keyed property access.
///
/// Both methods take `&self`: stores are shared handles whose contents
/// change through interior mutability.
pub trait PropertyStore {
    /// The stored value type.
    type Value;

    /// Current value of `name`, if any.
    fn get(&self, name: &str) -> Option<Self::Value>;

    /// Store `value` under `name` and return the previous value.
    fn put(&self, name: &str, value: Self::Value) -> Option<Self::Value>;

    /// Whether `name` currently holds a value.
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// An unvalidated property map.
#[derive(Debug)]
pub struct PropertyMap<V> {
    values: RefCell<HashMap<String, V>>,
}

impl<V> PropertyMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            values: RefCell::new(HashMap::new()),
        }
    }

    /// Number of stored properties.
    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

impl<V> Default for PropertyMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> PropertyStore for PropertyMap<V> {
    type Value = V;

    fn get(&self, name: &str) -> Option<V> {
        self.values.borrow().get(name).cloned()
    }

    fn put(&self, name: &str, value: V) -> Option<V> {
        self.values.borrow_mut().insert(name.to_string(), value)
    }

    fn contains(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
    }
}
