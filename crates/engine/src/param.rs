//! Declared parameter metadata.
//!
//! Tenet never infers parameter names from closures; every callable
//! carries an explicit, ordered list of [`ParameterDefinition`]s that the
//! matching engine resolves against the binding store.

use serde::{Deserialize, Serialize};
use tenet_bindings::TypeInfo;

/// Which matching strategy resolves a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBy {
    /// Look the parameter name up in the store.
    Name,
    /// Collect every binding assignable to the declared type.
    Type,
    /// Name first; fall back to type when the name yields no confident
    /// match (default).
    #[default]
    NameAndType,
}

/// The shape a resolved parameter takes at the call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamShape {
    /// The callable receives a snapshot of the bound value (default).
    #[default]
    Value,
    /// Absence is not an error; the callable receives an explicit empty
    /// marker instead.
    Optional,
    /// The callable receives the binding cell itself, so writes flow
    /// back into the store. Projected read-only inside conditions.
    Cell,
}

/// Immutable descriptor for one declared parameter.
#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    index: usize,
    name: String,
    ty: TypeInfo,
    shape: ParamShape,
    default_text: Option<String>,
    match_by: Option<MatchBy>,
    no_binding: bool,
}

/// Shorthand used throughout builder call sites.
pub type Param = ParameterDefinition;

impl ParameterDefinition {
    /// A required value parameter of type `T`.
    #[must_use]
    pub fn of<T: Send + Sync + 'static>(name: impl Into<String>) -> Self {
        Self::with_shape::<T>(name, ParamShape::Value)
    }

    /// An optional value parameter of type `T`; absence resolves to an
    /// empty marker rather than an error.
    #[must_use]
    pub fn optional<T: Send + Sync + 'static>(name: impl Into<String>) -> Self {
        Self::with_shape::<T>(name, ParamShape::Optional)
    }

    /// A cell parameter: the callable receives the `Binding` holding a
    /// `T` rather than the value itself.
    #[must_use]
    pub fn cell<T: Send + Sync + 'static>(name: impl Into<String>) -> Self {
        Self::with_shape::<T>(name, ParamShape::Cell)
    }

    fn with_shape<T: Send + Sync + 'static>(name: impl Into<String>, shape: ParamShape) -> Self {
        Self {
            index: 0,
            name: name.into(),
            ty: TypeInfo::of::<T>(),
            shape,
            default_text: None,
            match_by: None,
            no_binding: false,
        }
    }

    /// Supplies a textual default used when no binding matches; it is
    /// converted to the declared type at bind time.
    #[must_use]
    pub fn with_default(mut self, text: impl Into<String>) -> Self {
        self.default_text = Some(text.into());
        self
    }

    /// Overrides the matching strategy for this parameter only.
    #[must_use]
    pub fn match_by(mut self, strategy: MatchBy) -> Self {
        self.match_by = Some(strategy);
        self
    }

    /// Marks the parameter as positional-only: never resolved against
    /// the store, its value must always be supplied by the caller.
    #[must_use]
    pub fn no_binding(mut self) -> Self {
        self.no_binding = true;
        self
    }

    pub(crate) fn at_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Position within the owning method signature.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The declared parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type (the inner type for optional and cell shapes).
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.ty
    }

    /// The call-boundary shape.
    #[must_use]
    pub fn shape(&self) -> ParamShape {
        self.shape
    }

    /// The textual default, if any.
    #[must_use]
    pub fn default_text(&self) -> Option<&str> {
        self.default_text.as_deref()
    }

    /// The per-parameter strategy override, if any.
    #[must_use]
    pub fn strategy_override(&self) -> Option<MatchBy> {
        self.match_by
    }

    /// Returns `true` if the parameter is positional-only.
    #[must_use]
    pub fn is_no_binding(&self) -> bool {
        self.no_binding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let param = Param::of::<i64>("count");
        assert_eq!(param.name(), "count");
        assert_eq!(param.shape(), ParamShape::Value);
        assert_eq!(param.strategy_override(), None);
        assert!(!param.is_no_binding());
        assert!(param.default_text().is_none());
    }

    #[test]
    fn builder_overrides() {
        let param = Param::optional::<String>("label")
            .with_default("unnamed")
            .match_by(MatchBy::Type);
        assert_eq!(param.shape(), ParamShape::Optional);
        assert_eq!(param.default_text(), Some("unnamed"));
        assert_eq!(param.strategy_override(), Some(MatchBy::Type));
    }
}
