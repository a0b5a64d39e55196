//! # tenet-bindings
//!
//! The scoped key/value store underneath the Tenet rule engine.
//!
//! A [`Bindings`] store is a live stack of [`Scope`]s, each holding named,
//! typed, mutable cells ([`Binding`]). Inner scopes shadow outer ones; a
//! name is unique within a single scope. Callable parameters are resolved
//! against this store at invocation time by `tenet-engine`.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use tenet_bindings::{Binding, Bindings};
//!
//! let bindings = Bindings::new();
//! bindings.bind_value("count", 42_i64)?;
//!
//! let scope = bindings.add_scope();
//! bindings.bind_value("count", 7_i64)?;          // shadows the outer binding
//! assert_eq!(*bindings.get("count")?.get::<i64>()?, 7);
//!
//! bindings.remove_scope(&scope)?;
//! assert_eq!(*bindings.get("count")?.get::<i64>()?, 42);
//! ```

pub mod binding;
pub mod error;
pub mod listener;
pub mod loader;
pub mod scope;
pub mod store;
pub mod value;

pub use binding::{Binding, BindingBuilder, Mutability};
pub use error::BindingError;
pub use listener::BindingsListener;
pub use loader::{Loader, MapLoader};
pub use scope::Scope;
pub use store::{Bindings, ROOT_SCOPE, ScopedBinding};
pub use value::{AnyValue, TypeInfo, any_value, downcast};
