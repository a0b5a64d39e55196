//! Binding-store error types.

use thiserror::Error;

use crate::binding::Mutability;

/// Errors raised by the binding store and individual binding cells.
#[derive(Debug, Error)]
pub enum BindingError {
    /// The name already exists in the current innermost scope.
    #[error("binding already exists in the current scope: {0}")]
    AlreadyBound(String),

    /// No visible binding with the requested name.
    #[error("binding not found: {0}")]
    NotFound(String),

    /// A value of the wrong type was read from or written to a binding.
    #[error("type mismatch on binding '{name}': declared {declared}, got {actual}")]
    TypeMismatch {
        /// Name of the binding involved.
        name: String,
        /// The binding's declared type.
        declared: &'static str,
        /// The type that was actually supplied or requested.
        actual: &'static str,
    },

    /// Write attempted on a binding whose mutability mode forbids it.
    #[error("binding '{0}' is not writable ({1} bindings are fixed at creation)")]
    Immutable(String, Mutability),

    /// A constant binding's name may not be shadowed by inner scopes.
    #[error("cannot shadow constant binding: {0}")]
    CannotShadowConstant(String),

    /// No scope with the requested name is on the stack.
    #[error("scope not found: {0}")]
    ScopeNotFound(String),

    /// Only the innermost scope can be removed; nested scopes go first.
    #[error("scope '{name}' still has nested scope '{blocking}'; remove nested scopes first")]
    ScopeNotInnermost {
        /// The scope whose removal was requested.
        name: String,
        /// The innermost scope currently blocking the removal.
        blocking: String,
    },

    /// The root scope is the store itself and cannot be removed.
    #[error("cannot remove the root scope")]
    CannotRemoveRoot,

    /// A binding was declared without an initial value.
    #[error("binding '{0}' declared without an initial value")]
    MissingValue(String),
}
