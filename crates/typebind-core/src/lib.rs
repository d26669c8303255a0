//! # typebind-core — Foundational Capabilities
//!
//! The leaf crate of the typebind workspace. It holds the small, reusable
//! capabilities that typed models and collections are composed from, and
//! depends on nothing internal.
//!
//! - **Events** (`event.rs`): `EventEmitter<E>` and the `Notifier`
//!   capability: synchronous, in-line publish/subscribe that tolerates
//!   re-entrant handlers.
//! - **Store** (`store.rs`): the `PropertyStore` capability and
//!   `PropertyMap<V>`, its plain keyed implementation.
//! - **Coercion** (`coerce.rs`): loose-input primitives shared by every
//!   field kind (numeric text, JSON text, stringification).
//! - **Temporal** (`temporal.rs`): `Timestamp`, a UTC instant truncated to
//!   millisecond precision.
//! - **Config** (`config.rs`): `ModelConfig` and `CoercionPolicy`.
//!
//! ## Crate Policy
//!
//! - Single-threaded by construction: emitters and stores use `Rc`/`RefCell`
//!   and are deliberately `!Send`.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod coerce;
pub mod config;
pub mod error;
pub mod event;
pub mod store;
pub mod temporal;

pub use config::{CoercionPolicy, ModelConfig, COERCION_ENV_VAR};
pub use error::{ConfigError, TimestampError};
pub use event::{EventEmitter, Notifier, SubscriptionId};
pub use store::{PropertyMap, PropertyStore};
pub use temporal::Timestamp;
