//! Dynamic value representation.
//!
//! Bindings hold values of arbitrary `Send + Sync` types behind
//! [`AnyValue`]. Assignability between types is `TypeId` equality; there
//! is no runtime subtyping, and textual coercion is the converter
//! registry's job, not the store's.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A shared, dynamically typed value.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Wraps a concrete value into an [`AnyValue`].
pub fn any_value<T: Send + Sync + 'static>(value: T) -> AnyValue {
    Arc::new(value)
}

/// Downcasts an [`AnyValue`] to a concrete type, sharing the allocation.
///
/// Returns `None` when the runtime type does not match.
pub fn downcast<T: Send + Sync + 'static>(value: &AnyValue) -> Option<Arc<T>> {
    Arc::clone(value).downcast::<T>().ok()
}

/// A runtime type descriptor: the `TypeId` plus the human-readable name.
///
/// The name is carried for diagnostics only; identity is the `TypeId`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// The descriptor for `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The type identity.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if `value`'s runtime type is exactly this type.
    #[must_use]
    pub fn matches_value(&self, value: &AnyValue) -> bool {
        Any::type_id(&**value) == self.id
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_info_identity() {
        assert_eq!(TypeInfo::of::<i64>(), TypeInfo::of::<i64>());
        assert_ne!(TypeInfo::of::<i64>(), TypeInfo::of::<u64>());
        assert!(TypeInfo::of::<String>().name().contains("String"));
    }

    #[test]
    fn matches_runtime_value() {
        let v = any_value(42_i64);
        assert!(TypeInfo::of::<i64>().matches_value(&v));
        assert!(!TypeInfo::of::<String>().matches_value(&v));
    }

    #[test]
    fn downcast_shares_allocation() {
        let v = any_value(String::from("hello"));
        let s = downcast::<String>(&v).unwrap();
        assert_eq!(&*s, "hello");
        assert!(downcast::<i64>(&v).is_none());
    }
}
