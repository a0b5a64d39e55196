//! # tenet-engine
//!
//! The execution core of the Tenet rule framework: parameter matching,
//! invocation, and the rule / rule-set state machines.
//!
//! Callables declare explicit parameter metadata; at invocation time the
//! engine resolves each parameter against the scoped binding store (by
//! name, by type, or name-then-type), assembles the argument list, and
//! invokes the body. Rules and rule sets orchestrate callables on top of
//! this mechanism, notifying registered listeners at every lifecycle
//! transition.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use tenet_bindings::Bindings;
//! use tenet_engine::prelude::*;
//!
//! let bindings = Bindings::new();
//! bindings.bind_value("y", String::new())?;
//! bindings.bind_value("c", -1_i64)?;
//!
//! let rule = Rule::builder("empty_means_zero")
//!     .given(Condition::new("y_empty", [Param::of::<String>("y")], |args| {
//!         Ok(args.value::<String>("y")?.is_empty())
//!     }))
//!     .then(Action::new("reset_c", [Param::cell::<i64>("c")], |args| {
//!         args.cell("c")?.set(0_i64)?;
//!         Ok(())
//!     }))
//!     .build()?;
//!
//! let ctx = RuleContext::new(bindings);
//! let result = rule.run(&ctx)?;
//! assert!(result.outcome().is_pass());
//! ```
//!
//! Execution is synchronous and single-threaded per run; concurrent runs
//! must use independently constructed binding stores.

pub mod args;
pub mod callable;
pub mod clock;
pub mod context;
pub mod convert;
pub mod error;
pub mod matching;
pub mod method;
pub mod param;
pub mod prelude;
pub mod rule;
pub mod ruleset;
pub mod tracer;

mod invoke;

pub use args::{Args, ResolvedArg};
pub use callable::{Action, Condition, Function};
pub use clock::{Clock, FixedClock, SystemClock};
pub use context::{Locale, RuleContext, RuleContextBuilder};
pub use convert::{Converter, ConverterRegistry, TextConverter};
pub use error::EngineError;
pub use matching::{ParameterMatch, match_method};
pub use method::MethodDefinition;
pub use param::{MatchBy, Param, ParamShape, ParameterDefinition};
pub use rule::{Rule, RuleBuilder, RuleOutcome, RuleResult};
pub use ruleset::{
    RuleSet, RuleSetBuilder, RuleSetOutcome, RuleSetResult, RuleSetStatus, StopCondition,
};
pub use tracer::{RuleListener, RuleSetListener, Tracer};
