//! The single-rule state machine.
//!
//! `START → PRECONDITION? → CONDITION → (THEN* | OTHERWISE) → END`, with
//! an error exit reachable from any step. Every transition notifies the
//! tracer synchronously before execution proceeds. A rule is a pure
//! function of (context, bindings) to a [`RuleResult`]; it keeps no
//! state between runs.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::callable::{Action, Condition};
use crate::context::RuleContext;
use crate::error::EngineError;

/// Terminal outcome of one rule run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    /// Condition held; the "then" actions ran.
    Pass,
    /// Condition did not hold; "otherwise" ran if declared.
    Fail,
    /// Precondition did not hold; nothing else was evaluated.
    Skipped,
    /// A phase raised an error.
    Error,
}

impl RuleOutcome {
    /// Returns `true` if the condition held.
    #[must_use]
    pub fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Returns `true` if the rule ended in failure or error.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Fail | Self::Error)
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
            Self::Skipped => write!(f, "skipped"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Value object capturing one rule run; created fresh per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResult {
    rule: String,
    outcome: RuleOutcome,
    message: Option<String>,
}

impl RuleResult {
    pub(crate) fn pass(rule: &str) -> Self {
        Self::of(rule, RuleOutcome::Pass, None)
    }

    pub(crate) fn fail(rule: &str) -> Self {
        Self::of(rule, RuleOutcome::Fail, None)
    }

    pub(crate) fn skipped(rule: &str) -> Self {
        Self::of(rule, RuleOutcome::Skipped, None)
    }

    pub(crate) fn error(rule: &str, message: String) -> Self {
        Self::of(rule, RuleOutcome::Error, Some(message))
    }

    fn of(rule: &str, outcome: RuleOutcome, message: Option<String>) -> Self {
        Self {
            rule: rule.to_owned(),
            outcome,
            message,
        }
    }

    /// Name of the rule this result belongs to.
    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// The terminal outcome.
    #[must_use]
    pub fn outcome(&self) -> RuleOutcome {
        self.outcome
    }

    /// Diagnostic message for error outcomes.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

struct RuleInner {
    name: String,
    description: Option<String>,
    pre_condition: Option<Condition>,
    given: Condition,
    then: Vec<Action>,
    otherwise: Option<Action>,
}

/// A named rule: optional precondition, mandatory condition ("given"),
/// ordered "then" actions, optional "otherwise" action. Immutable after
/// construction.
#[derive(Clone)]
pub struct Rule {
    inner: Arc<RuleInner>,
}

impl Rule {
    /// Starts building a rule.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> RuleBuilder {
        RuleBuilder {
            name: name.into(),
            description: None,
            pre_condition: None,
            given: None,
            then: Vec::new(),
            otherwise: None,
        }
    }

    /// The rule's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    /// The precondition, if declared.
    #[must_use]
    pub fn pre_condition(&self) -> Option<&Condition> {
        self.inner.pre_condition.as_ref()
    }

    /// The mandatory condition.
    #[must_use]
    pub fn given(&self) -> &Condition {
        &self.inner.given
    }

    /// The "then" actions, in declaration order.
    #[must_use]
    pub fn then_actions(&self) -> &[Action] {
        &self.inner.then
    }

    /// The "otherwise" action, if declared.
    #[must_use]
    pub fn otherwise(&self) -> Option<&Action> {
        self.inner.otherwise.as_ref()
    }

    /// Drives the rule through its state machine once.
    pub fn run(&self, ctx: &RuleContext) -> Result<RuleResult, EngineError> {
        debug!(rule = self.name(), "rule start");
        ctx.tracer().notify_rule(|l| l.on_rule_start(self));

        if let Some(pre) = &self.inner.pre_condition {
            let passed = self.guard(ctx, pre.check(ctx))?;
            ctx.tracer()
                .notify_rule(|l| l.on_pre_condition_check(self, pre, passed));
            if !passed {
                debug!(rule = self.name(), "precondition rejected, skipping");
                let result = RuleResult::skipped(self.name());
                ctx.tracer().notify_rule(|l| l.on_rule_end(self, &result));
                return Ok(result);
            }
        }

        let given = &self.inner.given;
        let passed = self.guard(ctx, given.check(ctx))?;
        ctx.tracer()
            .notify_rule(|l| l.on_given(self, given, passed));

        let result = if passed {
            for action in &self.inner.then {
                self.guard(ctx, action.run(ctx))?;
                ctx.tracer().notify_rule(|l| l.on_action(self, action));
            }
            RuleResult::pass(self.name())
        } else {
            if let Some(otherwise) = &self.inner.otherwise {
                self.guard(ctx, otherwise.run(ctx))?;
                ctx.tracer()
                    .notify_rule(|l| l.on_otherwise(self, otherwise));
            }
            RuleResult::fail(self.name())
        };

        debug!(rule = self.name(), outcome = %result.outcome(), "rule end");
        ctx.tracer().notify_rule(|l| l.on_rule_end(self, &result));
        Ok(result)
    }

    /// Notifies the error hook before propagating; observation only.
    fn guard<T>(&self, ctx: &RuleContext, result: Result<T, EngineError>) -> Result<T, EngineError> {
        result.inspect_err(|err| {
            ctx.tracer().notify_rule(|l| l.on_rule_error(self, err));
        })
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.inner.name)
            .field("pre_condition", &self.inner.pre_condition.is_some())
            .field("then", &self.inner.then.len())
            .field("otherwise", &self.inner.otherwise.is_some())
            .finish_non_exhaustive()
    }
}

/// Accumulates the parts of a rule, then builds it.
pub struct RuleBuilder {
    name: String,
    description: Option<String>,
    pre_condition: Option<Condition>,
    given: Option<Condition>,
    then: Vec<Action>,
    otherwise: Option<Action>,
}

impl RuleBuilder {
    /// Attaches a description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares the precondition; when it rejects, the rule is skipped.
    #[must_use]
    pub fn pre_condition(mut self, condition: Condition) -> Self {
        self.pre_condition = Some(condition);
        self
    }

    /// Declares the mandatory condition.
    #[must_use]
    pub fn given(mut self, condition: Condition) -> Self {
        self.given = Some(condition);
        self
    }

    /// Appends a "then" action; actions run in declaration order.
    #[must_use]
    pub fn then(mut self, action: Action) -> Self {
        self.then.push(action);
        self
    }

    /// Declares the "otherwise" action.
    #[must_use]
    pub fn otherwise(mut self, action: Action) -> Self {
        self.otherwise = Some(action);
        self
    }

    /// Builds the rule; a missing condition is an error.
    pub fn build(self) -> Result<Rule, EngineError> {
        let given = self.given.ok_or_else(|| {
            EngineError::InvalidDefinition(format!("rule '{}' has no condition", self.name))
        })?;
        Ok(Rule {
            inner: Arc::new(RuleInner {
                name: self.name,
                description: self.description,
                pre_condition: self.pre_condition,
                given,
                then: self.then,
                otherwise: self.otherwise,
            }),
        })
    }
}
