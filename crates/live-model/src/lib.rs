//! `live-model` — a runtime schema compiler.
//!
//! Given a declarative field map and a configuration, [`Engine::define`]
//! compiles a [`Schema`]; the schema turns raw JSON objects into live
//! [`ModelInstance`]s with typed/coerced fields, computed (derived) fields,
//! and synchronous change notification:
//! - shorthand field declarations are normalized into one canonical
//!   descriptor at definition time,
//! - every instance exposes uniform `get`/`set` accessors over its own
//!   working store,
//! - writes dispatch `(field, new, old)` change events, and computed fields
//!   re-fire after any of their dependencies change, in the same synchronous
//!   cascade.

pub mod config;
pub mod error;
pub mod events;
pub mod field;
pub mod instance;
pub mod schema;

// Re-export the most commonly used types at crate root
pub use config::{ArrayCtor, Config, ConfigOverrides};
pub use error::{ModelError, SchemaError};
pub use events::ChangeEvent;
pub use field::{ComputedField, Converter, FieldDecl, FieldDescriptor, FieldKind, TypeRef};
pub use instance::ModelInstance;
pub use live_model_signal::{Listener, ListenerId, Signal};
pub use schema::{Engine, Schema, SchemaOptions};
