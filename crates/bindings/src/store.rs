//! The binding store: a live stack of scopes.

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::binding::{Binding, BindingBuilder};
use crate::error::BindingError;
use crate::listener::BindingsListener;
use crate::scope::Scope;

/// Name of the outermost scope every store starts with.
pub const ROOT_SCOPE: &str = "root";

/// A binding paired with the depth of the scope that declares it.
///
/// Depth 0 is the root scope; higher is deeper. Produced by
/// [`Bindings::find_by_type_id`] so callers can apply innermost-scope
/// tie-breaks.
#[derive(Debug, Clone)]
pub struct ScopedBinding {
    /// Scope depth, root = 0.
    pub depth: usize,
    /// The visible binding.
    pub binding: Binding,
}

struct StoreInner {
    scopes: RwLock<Vec<Scope>>,
    listeners: RwLock<Vec<Arc<dyn BindingsListener>>>,
    scope_counter: AtomicUsize,
}

/// The full live scope stack for one execution.
///
/// `Bindings` is a cheap-clone handle; clones share the same stack, which
/// is how the engine threads one store through a whole call tree. The
/// store is internally locked for memory safety but makes no reentrancy
/// promises: concurrent runs must use independently constructed stores.
#[derive(Clone)]
pub struct Bindings {
    inner: Arc<StoreInner>,
}

impl Bindings {
    /// A fresh store holding only the root scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                scopes: RwLock::new(vec![Scope::new(ROOT_SCOPE)]),
                listeners: RwLock::new(Vec::new()),
                scope_counter: AtomicUsize::new(0),
            }),
        }
    }

    /// Declares a binding in the current innermost scope.
    ///
    /// Fails with [`BindingError::AlreadyBound`] if the name already
    /// exists in that scope. Shadowing an outer-scope name is permitted
    /// unless the outer binding is `Constant`.
    pub fn bind(&self, builder: BindingBuilder) -> Result<Binding, BindingError> {
        let binding = builder.build()?;
        {
            let mut scopes = self.inner.scopes.write();
            let len = scopes.len();
            let (outer, current) = scopes.split_at_mut(len - 1);
            let current = &mut current[0];
            if current.contains(binding.name()) {
                return Err(BindingError::AlreadyBound(binding.name().to_owned()));
            }
            for scope in outer {
                if let Some(shadowed) = scope.get(binding.name())
                    && !shadowed.mutability().allows_shadowing()
                {
                    return Err(BindingError::CannotShadowConstant(
                        binding.name().to_owned(),
                    ));
                }
            }
            trace!(name = binding.name(), scope = current.name(), "bind");
            current.insert(binding.clone());
        }
        for listener in self.listener_snapshot() {
            listener.on_bind(&binding);
        }
        Ok(binding)
    }

    /// Shorthand for binding a plain mutable value.
    pub fn bind_value<T: Send + Sync + 'static>(
        &self,
        name: impl Into<String>,
        value: T,
    ) -> Result<Binding, BindingError> {
        self.bind(Binding::builder(name).value(value))
    }

    /// Looks a binding up by name, innermost scope first.
    pub fn get(&self, name: &str) -> Result<Binding, BindingError> {
        let scopes = self.inner.scopes.read();
        scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
            .ok_or_else(|| BindingError::NotFound(name.to_owned()))
    }

    /// Returns `true` if any visible scope declares `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let scopes = self.inner.scopes.read();
        scopes.iter().any(|scope| scope.contains(name))
    }

    /// Every visible binding whose declared or runtime type is exactly
    /// `ty`, de-duplicated by name (inner shadows outer), ordered
    /// innermost scope first, declaration order within a scope.
    #[must_use]
    pub fn find_by_type_id(&self, ty: TypeId) -> Vec<ScopedBinding> {
        let scopes = self.inner.scopes.read();
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        for (depth, scope) in scopes.iter().enumerate().rev() {
            for binding in scope.bindings() {
                if seen.contains(binding.name()) {
                    continue;
                }
                seen.insert(binding.name().to_owned());
                let assignable = binding.type_info().id() == ty
                    || std::any::Any::type_id(&*binding.value()) == ty;
                if assignable {
                    out.push(ScopedBinding {
                        depth,
                        binding: binding.clone(),
                    });
                }
            }
        }
        out
    }

    /// Every visible binding holding a `T`, innermost first.
    #[must_use]
    pub fn find_by_type<T: Send + Sync + 'static>(&self) -> Vec<Binding> {
        self.find_by_type_id(TypeId::of::<T>())
            .into_iter()
            .map(|scoped| scoped.binding)
            .collect()
    }

    /// Pushes a scope with a generated name and returns the name.
    #[must_use = "the returned name is needed to remove the scope"]
    pub fn add_scope(&self) -> String {
        let n = self.inner.scope_counter.fetch_add(1, Ordering::Relaxed);
        self.add_scope_named(format!("scope-{n}"))
    }

    /// Pushes a named scope and returns the name.
    pub fn add_scope_named(&self, name: impl Into<String>) -> String {
        let name = name.into();
        trace!(scope = name.as_str(), "add scope");
        self.inner.scopes.write().push(Scope::new(name.clone()));
        for listener in self.listener_snapshot() {
            listener.on_scope_added(&name);
        }
        name
    }

    /// Pops the named scope off the stack, returning it with its bindings.
    ///
    /// Only the innermost scope can be removed; asking for a deeper scope
    /// while it still has children is [`BindingError::ScopeNotInnermost`],
    /// and the root scope cannot be removed at all.
    pub fn remove_scope(&self, name: &str) -> Result<Scope, BindingError> {
        let removed = {
            let mut scopes = self.inner.scopes.write();
            let position = scopes
                .iter()
                .rposition(|scope| scope.name() == name)
                .ok_or_else(|| BindingError::ScopeNotFound(name.to_owned()))?;
            if position == 0 {
                return Err(BindingError::CannotRemoveRoot);
            }
            if position != scopes.len() - 1 {
                return Err(BindingError::ScopeNotInnermost {
                    name: name.to_owned(),
                    blocking: scopes[scopes.len() - 1].name().to_owned(),
                });
            }
            scopes.pop().expect("position was validated above")
        };
        trace!(scope = name, "remove scope");
        for listener in self.listener_snapshot() {
            listener.on_scope_removed(&removed);
        }
        Ok(removed)
    }

    /// Number of scopes on the stack, root included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.inner.scopes.read().len()
    }

    /// Name of the current innermost scope.
    #[must_use]
    pub fn current_scope(&self) -> String {
        let scopes = self.inner.scopes.read();
        scopes
            .last()
            .expect("the root scope is never removed")
            .name()
            .to_owned()
    }

    /// Registers a mutation listener; callbacks fire in registration order.
    pub fn add_listener(&self, listener: Arc<dyn BindingsListener>) {
        self.inner.listeners.write().push(listener);
    }

    fn listener_snapshot(&self) -> Vec<Arc<dyn BindingsListener>> {
        self.inner.listeners.read().clone()
    }
}

impl Default for Bindings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scopes = self.inner.scopes.read();
        let mut list = f.debug_list();
        for scope in scopes.iter() {
            list.entry(&format_args!("{} ({})", scope.name(), scope.len()));
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    #[test]
    fn bind_then_get() {
        let bindings = Bindings::new();
        bindings.bind_value("a", 1_i64).unwrap();
        assert_eq!(*bindings.get("a").unwrap().get::<i64>().unwrap(), 1);
    }

    #[test]
    fn rebinding_in_same_scope_fails() {
        let bindings = Bindings::new();
        bindings.bind_value("a", 1_i64).unwrap();
        let err = bindings.bind_value("a", 2_i64).unwrap_err();
        assert!(matches!(err, BindingError::AlreadyBound(name) if name == "a"));
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let bindings = Bindings::new();
        bindings.bind_value("a", 1_i64).unwrap();

        let scope = bindings.add_scope();
        bindings.bind_value("a", 2_i64).unwrap();
        assert_eq!(*bindings.get("a").unwrap().get::<i64>().unwrap(), 2);

        bindings.remove_scope(&scope).unwrap();
        assert_eq!(*bindings.get("a").unwrap().get::<i64>().unwrap(), 1);
    }

    #[test]
    fn constant_cannot_be_shadowed() {
        let bindings = Bindings::new();
        bindings
            .bind(Binding::builder("limit").value(10_i64).constant())
            .unwrap();

        let _scope = bindings.add_scope();
        let err = bindings.bind_value("limit", 20_i64).unwrap_err();
        assert!(matches!(err, BindingError::CannotShadowConstant(name) if name == "limit"));
    }

    #[test]
    fn find_by_type_dedups_shadowed_names() {
        let bindings = Bindings::new();
        bindings.bind_value("a", 1_i64).unwrap();
        bindings.bind_value("b", 2_i64).unwrap();

        let _scope = bindings.add_scope();
        bindings.bind_value("a", 10_i64).unwrap();

        let found = bindings.find_by_type::<i64>();
        let names: Vec<_> = found.iter().map(Binding::name).collect();
        // Inner `a` first, then root-scope `b`; outer `a` is shadowed out.
        assert_eq!(names, ["a", "b"]);
        assert_eq!(*found[0].get::<i64>().unwrap(), 10);
    }

    #[test]
    fn find_by_type_reports_scope_depth() {
        let bindings = Bindings::new();
        bindings.bind_value("outer", 1_i64).unwrap();
        let _scope = bindings.add_scope();
        bindings.bind_value("inner", 2_i64).unwrap();

        let found = bindings.find_by_type_id(TypeId::of::<i64>());
        assert_eq!(found[0].binding.name(), "inner");
        assert_eq!(found[0].depth, 1);
        assert_eq!(found[1].binding.name(), "outer");
        assert_eq!(found[1].depth, 0);
    }

    #[test]
    fn remove_scope_requires_innermost() {
        let bindings = Bindings::new();
        let first = bindings.add_scope_named("first");
        let _second = bindings.add_scope_named("second");

        let err = bindings.remove_scope(&first).unwrap_err();
        assert!(matches!(
            err,
            BindingError::ScopeNotInnermost { name, blocking }
                if name == "first" && blocking == "second"
        ));
    }

    #[test]
    fn root_scope_cannot_be_removed() {
        let bindings = Bindings::new();
        assert!(matches!(
            bindings.remove_scope(ROOT_SCOPE).unwrap_err(),
            BindingError::CannotRemoveRoot
        ));
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl BindingsListener for Recorder {
        fn on_bind(&self, binding: &Binding) {
            self.events.lock().push(format!("bind:{}", binding.name()));
        }
        fn on_scope_added(&self, scope_name: &str) {
            self.events.lock().push(format!("push:{scope_name}"));
        }
        fn on_scope_removed(&self, scope: &Scope) {
            self.events.lock().push(format!("pop:{}", scope.name()));
        }
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let bindings = Bindings::new();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        bindings.add_listener(first.clone());
        bindings.add_listener(second.clone());

        bindings.bind_value("a", 1_i64).unwrap();
        let scope = bindings.add_scope_named("nested");
        bindings.remove_scope(&scope).unwrap();

        let expected = ["bind:a", "push:nested", "pop:nested"];
        assert_eq!(*first.events.lock(), expected);
        assert_eq!(*second.events.lock(), expected);
    }
}
