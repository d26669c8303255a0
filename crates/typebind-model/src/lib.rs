//! # typebind-model — Typed Models and Collections
//!
//! Binds loosely typed input (JSON values, JSON text, or other instances)
//! into validated, typed in-memory object graphs, and serializes them back
//! to plain data.
//!
//! ```text
//! input ─▶ ModelType::create ─▶ FieldDescriptor::coerce ─▶ FieldDescriptor::validate
//!                                      │                            │
//!                                      ▼                            ▼
//!                           nested Model / Collection         stored FieldValue
//!                                                                   │
//!                                         Model::set / update ◀─────┤
//!                                                                   ▼
//!                                                           Model::serialize
//! ```
//!
//! ## Key Design Principles
//!
//! 1. **Closed field kinds.** `FieldKind` is an enum dispatched by `match`;
//!    adding a kind forces every coercion and validation path to handle it.
//!
//! 2. **Two-phase schemas.** `SchemaBuilder::build` freezes a declaration
//!    into a shared `ModelType` and binds `self` references to it before
//!    any instance exists.
//!
//! 3. **Construction raises, mutation records.** Seed data that fails a
//!    field aborts construction. Later failures land in the instance's
//!    error map and are announced as events.
//!
//! 4. **Shared handles.** `Model` and `Collection` are `Rc` handles.
//!    Passing an instance where a nested value is expected adopts it; plain
//!    data merges into the existing nested instance.
//!
//! ## Crate Policy
//!
//! - Single-threaded: all handles are `!Send`.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Libraries log through `tracing` and never install a subscriber.

pub mod collection;
pub mod error;
pub mod field;
pub mod model;
pub mod registry;
pub mod schema;
pub mod seed;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use collection::{Collection, CollectionEvent};
pub use error::{ModelError, SchemaError};
pub use field::{FieldDescriptor, FieldKind, TypeRef, Validation};
pub use model::{Model, ModelEvent, TYPE_TAG_KEY};
pub use registry::TypeRegistry;
pub use schema::{ModelType, SchemaBuilder};
pub use seed::Seed;
pub use value::FieldValue;

pub use typebind_core::{
    CoercionPolicy, ModelConfig, Notifier, PropertyStore, SubscriptionId, Timestamp,
};
