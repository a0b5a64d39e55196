//! The callable abstraction: conditions, actions, and functions.
//!
//! One shape serves every arity: a callable is a closure over an
//! [`Args`] view plus the explicit [`MethodDefinition`] the matching
//! engine resolves. There is no per-arity trait ladder and no name
//! inference from the closure itself.

use std::fmt;
use std::sync::Arc;

use tenet_bindings::{AnyValue, any_value};

use crate::args::Args;
use crate::context::RuleContext;
use crate::error::EngineError;
use crate::invoke::resolve_args;
use crate::method::MethodDefinition;
use crate::param::ParameterDefinition;

type ConditionFn = dyn Fn(&Args) -> Result<bool, EngineError> + Send + Sync;
type ActionFn = dyn Fn(&Args) -> Result<(), EngineError> + Send + Sync;
type FunctionFn = dyn Fn(&Args) -> Result<AnyValue, EngineError> + Send + Sync;

/// A boolean test over resolved arguments.
///
/// Conditions are read-only: cell parameters are projected to immutable
/// snapshots before the body runs.
#[derive(Clone)]
pub struct Condition {
    method: Arc<MethodDefinition>,
    body: Arc<ConditionFn>,
}

impl Condition {
    /// A condition with the given name and declared parameters.
    pub fn new(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParameterDefinition>,
        body: impl Fn(&Args) -> Result<bool, EngineError> + Send + Sync + 'static,
    ) -> Self {
        Self::from_method(MethodDefinition::new(name, params), body)
    }

    /// A condition over an already-built signature.
    pub fn from_method(
        method: MethodDefinition,
        body: impl Fn(&Args) -> Result<bool, EngineError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            method: Arc::new(method),
            body: Arc::new(body),
        }
    }

    /// A condition that always evaluates to `value`.
    #[must_use]
    pub fn constant(value: bool) -> Self {
        Self::new(if value { "true" } else { "false" }, [], move |_| Ok(value))
    }

    /// The declared signature.
    #[must_use]
    pub fn method(&self) -> &MethodDefinition {
        &self.method
    }

    /// The condition's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.method.name()
    }

    /// Resolves parameters against the context and evaluates the test.
    pub fn check(&self, ctx: &RuleContext) -> Result<bool, EngineError> {
        self.check_with(ctx, &[])
    }

    /// Like [`check`](Self::check), with caller-supplied positional
    /// values taking precedence at their indexes.
    pub fn check_with(
        &self,
        ctx: &RuleContext,
        positional: &[AnyValue],
    ) -> Result<bool, EngineError> {
        let args = resolve_args(ctx, &self.method, positional, true)?;
        (self.body)(&args)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Condition({})", self.method.name())
    }
}

/// A side-effecting step over resolved arguments.
#[derive(Clone)]
pub struct Action {
    method: Arc<MethodDefinition>,
    body: Arc<ActionFn>,
}

impl Action {
    /// An action with the given name and declared parameters.
    pub fn new(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParameterDefinition>,
        body: impl Fn(&Args) -> Result<(), EngineError> + Send + Sync + 'static,
    ) -> Self {
        Self::from_method(MethodDefinition::new(name, params), body)
    }

    /// An action over an already-built signature.
    pub fn from_method(
        method: MethodDefinition,
        body: impl Fn(&Args) -> Result<(), EngineError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            method: Arc::new(method),
            body: Arc::new(body),
        }
    }

    /// The declared signature.
    #[must_use]
    pub fn method(&self) -> &MethodDefinition {
        &self.method
    }

    /// The action's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.method.name()
    }

    /// Resolves parameters against the context and runs the body.
    pub fn run(&self, ctx: &RuleContext) -> Result<(), EngineError> {
        self.run_with(ctx, &[])
    }

    /// Like [`run`](Self::run), with caller-supplied positional values
    /// taking precedence at their indexes.
    pub fn run_with(&self, ctx: &RuleContext, positional: &[AnyValue]) -> Result<(), EngineError> {
        let args = resolve_args(ctx, &self.method, positional, false)?;
        (self.body)(&args)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action({})", self.method.name())
    }
}

/// A value producer over resolved arguments.
#[derive(Clone)]
pub struct Function {
    method: Arc<MethodDefinition>,
    body: Arc<FunctionFn>,
}

impl Function {
    /// A function returning an already-wrapped [`AnyValue`].
    pub fn new(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParameterDefinition>,
        body: impl Fn(&Args) -> Result<AnyValue, EngineError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            method: Arc::new(MethodDefinition::new(name, params)),
            body: Arc::new(body),
        }
    }

    /// A function returning a concrete type, wrapped for the caller.
    pub fn producing<T: Send + Sync + 'static>(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParameterDefinition>,
        body: impl Fn(&Args) -> Result<T, EngineError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, params, move |args| body(args).map(any_value))
    }

    /// The declared signature.
    #[must_use]
    pub fn method(&self) -> &MethodDefinition {
        &self.method
    }

    /// The function's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.method.name()
    }

    /// Resolves parameters against the context and produces the value.
    pub fn call(&self, ctx: &RuleContext) -> Result<AnyValue, EngineError> {
        self.call_with(ctx, &[])
    }

    /// Like [`call`](Self::call), with caller-supplied positional values
    /// taking precedence at their indexes.
    pub fn call_with(
        &self,
        ctx: &RuleContext,
        positional: &[AnyValue],
    ) -> Result<AnyValue, EngineError> {
        let args = resolve_args(ctx, &self.method, positional, false)?;
        (self.body)(&args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.method.name())
    }
}
