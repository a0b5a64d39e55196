//! Resolved arguments as seen by a callable.

use std::fmt;
use std::sync::Arc;

use tenet_bindings::{AnyValue, Binding, Bindings, downcast};

use crate::clock::Clock;
use crate::context::Locale;
use crate::error::EngineError;
use crate::method::MethodDefinition;
use crate::param::ParamShape;

/// One resolved argument, decided once at match construction.
#[derive(Clone)]
pub enum ResolvedArg {
    /// A plain value snapshot.
    Value(AnyValue),
    /// Explicit empty marker for unmatched optional parameters.
    Empty,
    /// The live binding cell; writes flow back into the store.
    Cell(Binding),
}

impl fmt::Debug for ResolvedArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Value(..)"),
            Self::Empty => f.write_str("Empty"),
            Self::Cell(binding) => write!(f, "Cell({})", binding.name()),
        }
    }
}

/// The ordered argument list handed to a callable body, with typed
/// accessors by declared name or position, plus the slice of the run
/// environment a callable may use: the store, the clock, the locale,
/// and the optional executor handle.
pub struct Args {
    method: Arc<MethodDefinition>,
    values: Vec<ResolvedArg>,
    bindings: Bindings,
    clock: Arc<dyn Clock>,
    locale: Locale,
    executor: Option<tokio::runtime::Handle>,
}

impl Args {
    pub(crate) fn new(
        method: Arc<MethodDefinition>,
        values: Vec<ResolvedArg>,
        bindings: Bindings,
        clock: Arc<dyn Clock>,
        locale: Locale,
        executor: Option<tokio::runtime::Handle>,
    ) -> Self {
        Self {
            method,
            values,
            bindings,
            clock,
            locale,
            executor,
        }
    }

    /// The store active for this invocation; callables may bind through
    /// it directly.
    #[must_use]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// The run's clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// The run's locale.
    #[must_use]
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Runtime handle for bodies that explicitly offload work.
    #[must_use]
    pub fn executor(&self) -> Option<&tokio::runtime::Handle> {
        self.executor.as_ref()
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the callable declares no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reads a required argument by declared parameter name.
    pub fn value<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, EngineError> {
        self.value_at(self.position(name)?)
    }

    /// Reads a required argument by position.
    pub fn value_at<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, EngineError> {
        match self.arg(index)? {
            ResolvedArg::Value(value) => downcast::<T>(value).ok_or_else(|| {
                self.mismatch(index, format!("expected {}", std::any::type_name::<T>()))
            }),
            ResolvedArg::Cell(binding) => binding.get::<T>().map_err(EngineError::from),
            ResolvedArg::Empty => {
                Err(self.mismatch(index, "no value available (unmatched and no default)"))
            }
        }
    }

    /// Reads an optional argument by declared parameter name; an empty
    /// marker is `None`, a present value of the wrong type is an error.
    pub fn optional<T: Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Option<Arc<T>>, EngineError> {
        let index = self.position(name)?;
        match self.arg(index)? {
            ResolvedArg::Empty => Ok(None),
            ResolvedArg::Value(value) => downcast::<T>(value)
                .map(Some)
                .ok_or_else(|| {
                    self.mismatch(index, format!("expected {}", std::any::type_name::<T>()))
                }),
            ResolvedArg::Cell(binding) => binding.get::<T>().map(Some).map_err(EngineError::from),
        }
    }

    /// Borrows a cell argument by declared parameter name.
    ///
    /// Inside a condition, cell parameters are projected to read-only
    /// snapshots and this accessor reports the projection.
    pub fn cell(&self, name: &str) -> Result<Binding, EngineError> {
        let index = self.position(name)?;
        let declared_cell = self
            .method
            .param(index)
            .is_some_and(|param| param.shape() == ParamShape::Cell);
        match self.arg(index)? {
            ResolvedArg::Cell(binding) => Ok(binding.clone()),
            ResolvedArg::Value(_) if declared_cell => {
                Err(self.mismatch(index, "cell parameter is read-only inside a condition"))
            }
            ResolvedArg::Empty if declared_cell => {
                Err(self.mismatch(index, "no binding matched the cell parameter"))
            }
            ResolvedArg::Value(_) | ResolvedArg::Empty => {
                Err(self.mismatch(index, "parameter was not declared as a cell"))
            }
        }
    }

    fn arg(&self, index: usize) -> Result<&ResolvedArg, EngineError> {
        self.values.get(index).ok_or_else(|| {
            EngineError::mismatch(
                self.method.name(),
                format!("no parameter at index {index}"),
            )
        })
    }

    fn position(&self, name: &str) -> Result<usize, EngineError> {
        self.method
            .param_named(name)
            .map(crate::param::ParameterDefinition::index)
            .ok_or_else(|| {
                EngineError::mismatch(
                    self.method.name(),
                    format!("no parameter named '{name}'"),
                )
            })
    }

    fn mismatch(&self, index: usize, detail: impl fmt::Display) -> EngineError {
        let (name, declared) = self
            .method
            .param(index)
            .map_or(("<unknown>", "<unknown>"), |param| {
                (param.name(), param.type_info().name())
            });
        EngineError::mismatch(
            self.method.name(),
            format!("parameter '{name}' (declared {declared}): {detail}"),
        )
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("method", &self.method.name())
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}
