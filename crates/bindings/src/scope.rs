//! A single frame of the binding stack.

use indexmap::IndexMap;

use crate::binding::Binding;

/// A named, declaration-ordered collection of bindings.
///
/// Scopes are owned by the [`Bindings`](crate::store::Bindings) store and
/// stacked root-outward; a name is unique within one scope but may recur
/// across scopes (inner shadows outer).
#[derive(Debug)]
pub struct Scope {
    name: String,
    bindings: IndexMap<String, Binding>,
}

impl Scope {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: IndexMap::new(),
        }
    }

    /// The scope's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a binding declared in this scope.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Returns `true` if this scope declares `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Iterates bindings in declaration order.
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    /// Number of bindings declared in this scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if no bindings are declared here.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub(crate) fn insert(&mut self, binding: Binding) {
        self.bindings.insert(binding.name().to_owned(), binding);
    }
}
