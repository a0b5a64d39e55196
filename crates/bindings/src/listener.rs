//! Observer port for store mutations.

use crate::binding::Binding;
use crate::scope::Scope;

/// Callbacks fired synchronously, in registration order, on every store
/// mutation. The store iterates a snapshot of the registration list, so a
/// listener may register further listeners without poisoning the walk.
///
/// Listener panics are not caught; a misbehaving listener aborts the run.
pub trait BindingsListener: Send + Sync {
    /// A binding was added to the current scope.
    fn on_bind(&self, _binding: &Binding) {}

    /// A scope was pushed onto the stack.
    fn on_scope_added(&self, _scope_name: &str) {}

    /// A scope was popped; the scope and its bindings are passed by
    /// reference before being dropped.
    fn on_scope_removed(&self, _scope: &Scope) {}
}
