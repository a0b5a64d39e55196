//! The appendable violations sink.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::violation::Violation;

/// Well-known binding name under which the engine exposes the sink to
/// validation rules.
pub const VIOLATIONS_BINDING: &str = "violations";

/// An ordered, appendable collection of [`Violation`]s.
///
/// `Violations` is a cheap-clone handle; clones share the same list, so
/// the sink can be bound into a scope and appended to by any validator
/// that resolves it by name or type.
#[derive(Clone, Default)]
pub struct Violations {
    inner: Arc<RwLock<Vec<Violation>>>,
}

impl Violations {
    /// An empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a violation, preserving insertion order.
    pub fn add(&self, violation: Violation) {
        self.inner.write().push(violation);
    }

    /// Number of recorded violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Returns `true` if any severe violation was recorded.
    #[must_use]
    pub fn has_severe(&self) -> bool {
        self.inner.read().iter().any(|v| v.severity().is_severe())
    }

    /// Number of severe violations.
    #[must_use]
    pub fn severe_count(&self) -> usize {
        self.inner
            .read()
            .iter()
            .filter(|v| v.severity().is_severe())
            .count()
    }

    /// A snapshot of the recorded violations, in insertion order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Violation> {
        self.inner.read().clone()
    }
}

impl fmt::Debug for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let violations = self.inner.read();
        f.debug_list()
            .entries(violations.iter().map(Violation::code))
            .finish()
    }
}
