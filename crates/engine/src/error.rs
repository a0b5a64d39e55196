//! Engine error taxonomy.

use thiserror::Error;

use tenet_bindings::BindingError;
use tenet_validator::Violation;

/// Errors raised while matching parameters, invoking callables, or
/// driving rule / rule-set execution.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Two or more equally valid by-type candidates after tie-breaks.
    #[error("ambiguous match for parameter '{parameter}': candidates [{}]", .candidates.join(", "))]
    AmbiguousMatch {
        /// The parameter being resolved.
        parameter: String,
        /// Names of the competing bindings.
        candidates: Vec<String>,
    },

    /// Type-incompatible or missing argument observed at invocation time.
    #[error("parameter mismatch in '{}': {}", .method, .diagnostics.join("; "))]
    ParameterMismatch {
        /// The callable whose arguments were mismatched.
        method: String,
        /// One diagnostic line per offending parameter.
        diagnostics: Vec<String>,
    },

    /// A textual value could not be converted to the declared type.
    #[error("cannot convert {value:?} to {target}")]
    ConversionFailed {
        /// The offending source value, rendered for diagnostics.
        value: String,
        /// The requested target type.
        target: &'static str,
    },

    /// Severe violations recorded during rule-set input validation.
    #[error("input validation failed with {} violation(s)", .violations.len())]
    ValidationFailure {
        /// The violations recorded by the sink, in insertion order.
        violations: Vec<Violation>,
    },

    /// A rule or rule set was declared incompletely.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    /// A store operation failed.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// A user callable or collaborator failed; the cause is preserved.
    #[error("execution failed in {phase}: {source}")]
    Execution {
        /// The lifecycle phase that was running.
        phase: &'static str,
        /// The original failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl EngineError {
    /// Wraps an arbitrary failure raised inside a lifecycle phase.
    pub fn execution(
        phase: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Execution {
            phase,
            source: source.into(),
        }
    }

    /// A single-parameter mismatch diagnostic.
    pub(crate) fn mismatch(method: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self::ParameterMismatch {
            method: method.into(),
            diagnostics: vec![diagnostic.into()],
        }
    }
}
