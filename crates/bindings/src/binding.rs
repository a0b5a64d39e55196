//! The binding cell: a named, typed, mutable value slot.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::BindingError;
use crate::value::{AnyValue, TypeInfo, any_value, downcast};

/// How a binding's value and name may change after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    /// Value may be reassigned freely.
    #[default]
    Normal,
    /// Value is fixed at creation; writes fail.
    Final,
    /// Value is fixed and the name may not be shadowed by inner scopes.
    Constant,
}

impl Mutability {
    /// Returns `true` if the binding's value may be reassigned.
    #[must_use]
    pub fn allows_set(self) -> bool {
        matches!(self, Self::Normal)
    }

    /// Returns `true` if inner scopes may declare the same name.
    #[must_use]
    pub fn allows_shadowing(self) -> bool {
        !matches!(self, Self::Constant)
    }
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Final => write!(f, "final"),
            Self::Constant => write!(f, "constant"),
        }
    }
}

struct Inner {
    name: String,
    ty: TypeInfo,
    mutability: Mutability,
    description: Option<String>,
    value: RwLock<AnyValue>,
}

/// A named, typed, mutable cell held by a scope.
///
/// Clones share the same cell: handing a `Binding` to a callable as a
/// "cell" parameter lets writes flow back into the store. Reads and
/// writes go through an internal lock; the store itself adds no further
/// synchronization.
#[derive(Clone)]
pub struct Binding {
    inner: Arc<Inner>,
}

impl Binding {
    /// Starts building a binding with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> BindingBuilder {
        BindingBuilder {
            name: name.into(),
            ty: None,
            value: None,
            mutability: Mutability::Normal,
            description: None,
        }
    }

    /// A normal, mutable binding declared as `T` with an initial value.
    #[must_use]
    pub fn new<T: Send + Sync + 'static>(name: impl Into<String>, value: T) -> Self {
        Self::from_parts(
            name.into(),
            TypeInfo::of::<T>(),
            any_value(value),
            Mutability::Normal,
            None,
        )
    }

    fn from_parts(
        name: String,
        ty: TypeInfo,
        value: AnyValue,
        mutability: Mutability,
        description: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                ty,
                mutability,
                description,
                value: RwLock::new(value),
            }),
        }
    }

    /// The binding's name, unique within its owning scope.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The declared type of the cell.
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.inner.ty
    }

    /// The mutability mode fixed at creation.
    #[must_use]
    pub fn mutability(&self) -> Mutability {
        self.inner.mutability
    }

    /// Optional human-readable description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    /// A snapshot of the current value.
    #[must_use]
    pub fn value(&self) -> AnyValue {
        Arc::clone(&self.inner.value.read())
    }

    /// Reads the current value as `T`.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, BindingError> {
        let snapshot = self.value();
        downcast::<T>(&snapshot).ok_or_else(|| BindingError::TypeMismatch {
            name: self.inner.name.clone(),
            declared: self.inner.ty.name(),
            actual: std::any::type_name::<T>(),
        })
    }

    /// Returns `true` if the declared type is exactly `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.ty.id() == std::any::TypeId::of::<T>()
    }

    /// Replaces the value, subject to the mutability mode and declared type.
    pub fn set<T: Send + Sync + 'static>(&self, value: T) -> Result<(), BindingError> {
        self.set_value(any_value(value))
    }

    /// Replaces the value with an already-wrapped [`AnyValue`].
    pub fn set_value(&self, value: AnyValue) -> Result<(), BindingError> {
        if !self.inner.mutability.allows_set() {
            return Err(BindingError::Immutable(
                self.inner.name.clone(),
                self.inner.mutability,
            ));
        }
        if !self.inner.ty.matches_value(&value) {
            return Err(BindingError::TypeMismatch {
                name: self.inner.name.clone(),
                declared: self.inner.ty.name(),
                actual: "a value of a different runtime type",
            });
        }
        *self.inner.value.write() = value;
        Ok(())
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.inner.name)
            .field("type", &self.inner.ty)
            .field("mutability", &self.inner.mutability)
            .finish_non_exhaustive()
    }
}

/// Accumulates the pieces of a binding declaration, then builds it.
#[derive(Debug)]
pub struct BindingBuilder {
    name: String,
    ty: Option<TypeInfo>,
    value: Option<AnyValue>,
    mutability: Mutability,
    description: Option<String>,
}

impl BindingBuilder {
    /// Sets the initial value; the declared type defaults to the value's
    /// type unless [`of_type`](Self::of_type) was called.
    #[must_use]
    pub fn value<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        if self.ty.is_none() {
            self.ty = Some(TypeInfo::of::<T>());
        }
        self.value = Some(any_value(value));
        self
    }

    /// Declares the cell's type explicitly.
    #[must_use]
    pub fn of_type<T: Send + Sync + 'static>(mut self) -> Self {
        self.ty = Some(TypeInfo::of::<T>());
        self
    }

    /// Sets the mutability mode.
    #[must_use]
    pub fn mutability(mut self, mutability: Mutability) -> Self {
        self.mutability = mutability;
        self
    }

    /// Marks the binding as `final`: value fixed at creation.
    #[must_use]
    pub fn finalized(self) -> Self {
        self.mutability(Mutability::Final)
    }

    /// Marks the binding as `constant`: value fixed, name un-shadowable.
    #[must_use]
    pub fn constant(self) -> Self {
        self.mutability(Mutability::Constant)
    }

    /// Attaches a description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builds the binding. Fails if no initial value was supplied or the
    /// value's runtime type does not match an explicitly declared type.
    pub fn build(self) -> Result<Binding, BindingError> {
        let value = self
            .value
            .ok_or_else(|| BindingError::MissingValue(self.name.clone()))?;
        let ty = self.ty.expect("type is always set alongside the value");
        if !ty.matches_value(&value) {
            return Err(BindingError::TypeMismatch {
                name: self.name,
                declared: ty.name(),
                actual: "a value of a different runtime type",
            });
        }
        Ok(Binding::from_parts(
            self.name,
            ty,
            value,
            self.mutability,
            self.description,
        ))
    }
}
