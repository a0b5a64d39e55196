//! Common imports for building and running rules.
//!
//! ```rust,ignore
//! use tenet_engine::prelude::*;
//! ```

pub use crate::args::Args;
pub use crate::callable::{Action, Condition, Function};
pub use crate::context::{RuleContext, RuleContextBuilder};
pub use crate::error::EngineError;
pub use crate::param::{MatchBy, Param, ParamShape};
pub use crate::rule::{Rule, RuleOutcome, RuleResult};
pub use crate::ruleset::{RuleSet, RuleSetOutcome, RuleSetResult, StopCondition};
pub use crate::tracer::{RuleListener, RuleSetListener, Tracer};

pub use tenet_bindings::{Binding, Bindings, Mutability};
pub use tenet_validator::{Severity, Violation, Violations};
