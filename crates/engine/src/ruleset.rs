//! The rule-set state machine.
//!
//! `START → INPUT_VALIDATION? → PRECONDITION? → INITIALIZER? →
//! RUN_RULE[i] (stop check after each) → FINALIZER? →
//! RESULT_EXTRACTION? → END`.
//!
//! The whole run executes in a scope nested under the caller's scope and
//! discarded on every exit path; side effects leak outward only through
//! bindings the caller supplied. A single rule's error is recorded as an
//! [`RuleOutcome::Error`](crate::rule::RuleOutcome::Error) result and the
//! stop condition decides whether the set continues; validation,
//! initializer, and finalizer errors abort the run.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tenet_bindings::{AnyValue, Binding, downcast};
use tenet_validator::{VIOLATIONS_BINDING, Violations};

use crate::callable::{Action, Condition, Function};
use crate::context::RuleContext;
use crate::error::EngineError;
use crate::rule::{Rule, RuleResult};

/// Terminal outcome of one rule-set run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSetOutcome {
    /// Every rule was attempted.
    Completed,
    /// The stop condition fired before the last rule.
    Stopped,
    /// The precondition rejected the run.
    Skipped,
}

impl fmt::Display for RuleSetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Stopped => write!(f, "stopped"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// The per-rule outcomes accumulated so far; what stop conditions see.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSetStatus {
    results: Vec<RuleResult>,
}

impl RuleSetStatus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, result: RuleResult) {
        self.results.push(result);
    }

    /// Recorded results, in execution order.
    #[must_use]
    pub fn results(&self) -> &[RuleResult] {
        &self.results
    }

    /// The most recent result.
    #[must_use]
    pub fn last(&self) -> Option<&RuleResult> {
        self.results.last()
    }

    /// Number of rules attempted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if no rule has been attempted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of passed rules.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.outcome().is_pass())
            .count()
    }

    /// Number of failed or errored rules.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.outcome().is_failure())
            .count()
    }

    /// Returns `true` if any rule failed or errored.
    #[must_use]
    pub fn any_failed(&self) -> bool {
        self.results
            .iter()
            .any(|result| result.outcome().is_failure())
    }
}

/// Value object for one rule-set run: outcome, accumulated status, and
/// the extracted result value, if a result function was configured.
#[derive(Clone)]
pub struct RuleSetResult {
    rule_set: String,
    outcome: RuleSetOutcome,
    status: RuleSetStatus,
    value: Option<AnyValue>,
}

impl fmt::Debug for RuleSetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSetResult")
            .field("rule_set", &self.rule_set)
            .field("outcome", &self.outcome)
            .field("status", &self.status)
            .field("has_value", &self.value.is_some())
            .finish()
    }
}

impl RuleSetResult {
    /// Name of the rule set this result belongs to.
    #[must_use]
    pub fn rule_set(&self) -> &str {
        &self.rule_set
    }

    /// The terminal outcome.
    #[must_use]
    pub fn outcome(&self) -> RuleSetOutcome {
        self.outcome
    }

    /// Per-rule outcomes, in execution order.
    #[must_use]
    pub fn status(&self) -> &RuleSetStatus {
        &self.status
    }

    /// The extracted value, if a result function was configured.
    #[must_use]
    pub fn value(&self) -> Option<&AnyValue> {
        self.value.as_ref()
    }

    /// The extracted value downcast to `T`.
    #[must_use]
    pub fn value_as<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.as_ref().and_then(downcast::<T>)
    }
}

type StopFn = dyn Fn(&RuleSetStatus) -> bool + Send + Sync;

/// Decides, after each recorded rule result, whether the remaining rules
/// should be skipped.
#[derive(Clone)]
pub struct StopCondition {
    label: &'static str,
    decide: Arc<StopFn>,
}

impl StopCondition {
    /// Never stops; every rule runs (default).
    #[must_use]
    pub fn never() -> Self {
        Self {
            label: "never",
            decide: Arc::new(|_| false),
        }
    }

    /// Stops after the first failed or errored rule.
    #[must_use]
    pub fn when_one_fails() -> Self {
        Self {
            label: "when_one_fails",
            decide: Arc::new(RuleSetStatus::any_failed),
        }
    }

    /// Stops after the first passed rule.
    #[must_use]
    pub fn when_one_passes() -> Self {
        Self {
            label: "when_one_passes",
            decide: Arc::new(|status| {
                status
                    .results()
                    .iter()
                    .any(|result| result.outcome().is_pass())
            }),
        }
    }

    /// A custom predicate over the accumulated status.
    #[must_use]
    pub fn of(decide: impl Fn(&RuleSetStatus) -> bool + Send + Sync + 'static) -> Self {
        Self {
            label: "custom",
            decide: Arc::new(decide),
        }
    }

    pub(crate) fn should_stop(&self, status: &RuleSetStatus) -> bool {
        (self.decide)(status)
    }
}

impl Default for StopCondition {
    fn default() -> Self {
        Self::never()
    }
}

impl fmt::Debug for StopCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopCondition({})", self.label)
    }
}

struct RuleSetInner {
    name: String,
    description: Option<String>,
    validators: Vec<Action>,
    pre_condition: Option<Condition>,
    initializer: Option<Action>,
    rules: Vec<Rule>,
    stop_when: StopCondition,
    finalizer: Option<Action>,
    result: Option<Function>,
}

/// An ordered collection of rules with input validation, lifecycle
/// actions, a stop condition, and result extraction. Immutable after
/// construction.
#[derive(Clone)]
pub struct RuleSet {
    inner: Arc<RuleSetInner>,
}

impl RuleSet {
    /// Starts building a rule set.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> RuleSetBuilder {
        RuleSetBuilder {
            name: name.into(),
            description: None,
            validators: Vec::new(),
            pre_condition: None,
            initializer: None,
            rules: Vec::new(),
            stop_when: StopCondition::never(),
            finalizer: None,
            result: None,
        }
    }

    /// The rule set's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    /// The rules, in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.inner.rules
    }

    /// Drives the rule set through its state machine once.
    ///
    /// The run executes inside a nested scope that is discarded on every
    /// exit path, success or not.
    pub fn run(&self, ctx: &RuleContext) -> Result<RuleSetResult, EngineError> {
        debug!(rule_set = self.name(), "rule set start");
        ctx.tracer().notify_rule_set(|l| l.on_rule_set_start(self));

        let scope = ctx
            .bindings()
            .add_scope_named(format!("rule-set:{}", self.name()));
        let outcome = self.run_scoped(ctx);
        if let Err(err) = ctx.bindings().remove_scope(&scope) {
            warn!(rule_set = self.name(), %err, "failed to discard run scope");
        }

        match outcome {
            Ok(result) => {
                debug!(rule_set = self.name(), outcome = %result.outcome(), "rule set end");
                ctx.tracer()
                    .notify_rule_set(|l| l.on_rule_set_end(self, &result));
                Ok(result)
            }
            Err(err) => {
                ctx.tracer()
                    .notify_rule_set(|l| l.on_rule_set_error(self, &err));
                Err(err)
            }
        }
    }

    fn run_scoped(&self, ctx: &RuleContext) -> Result<RuleSetResult, EngineError> {
        self.check_input(ctx)?;

        if let Some(pre) = &self.inner.pre_condition {
            let passed = pre.check(ctx)?;
            ctx.tracer()
                .notify_rule_set(|l| l.on_rule_set_pre_condition_check(self, passed));
            if !passed {
                debug!(rule_set = self.name(), "precondition rejected, skipping");
                return Ok(self.result_of(RuleSetOutcome::Skipped, RuleSetStatus::new(), None));
            }
        }

        if let Some(initializer) = &self.inner.initializer {
            initializer.run(ctx)?;
            ctx.tracer().notify_rule_set(|l| l.on_initializer(self));
        }

        let mut status = RuleSetStatus::new();
        let mut stopped = false;
        for rule in &self.inner.rules {
            let result = match rule.run(ctx) {
                Ok(result) => result,
                Err(err) => {
                    warn!(rule_set = self.name(), rule = rule.name(), %err, "rule errored");
                    RuleResult::error(rule.name(), err.to_string())
                }
            };
            status.record(result);
            if self.inner.stop_when.should_stop(&status) {
                debug!(rule_set = self.name(), after = status.len(), "stop condition fired");
                ctx.tracer()
                    .notify_rule_set(|l| l.on_rule_set_stop(self, &status));
                stopped = true;
                break;
            }
        }

        if let Some(finalizer) = &self.inner.finalizer {
            finalizer.run(ctx)?;
            ctx.tracer().notify_rule_set(|l| l.on_finalizer(self));
        }

        let value = match &self.inner.result {
            Some(result) => Some(result.call(ctx)?),
            None => None,
        };

        let outcome = if stopped {
            RuleSetOutcome::Stopped
        } else {
            RuleSetOutcome::Completed
        };
        Ok(self.result_of(outcome, status, value))
    }

    /// Runs the input validators inside a fresh nested scope holding the
    /// violations sink; severe violations abort the run before the
    /// precondition is evaluated.
    fn check_input(&self, ctx: &RuleContext) -> Result<(), EngineError> {
        if self.inner.validators.is_empty() {
            return Ok(());
        }
        let scope = ctx.bindings().add_scope_named("input-check");
        let violations = Violations::new();
        let checked = ctx
            .bindings()
            .bind(Binding::builder(VIOLATIONS_BINDING).value(violations.clone()))
            .map_err(EngineError::from)
            .and_then(|_| {
                self.inner
                    .validators
                    .iter()
                    .try_for_each(|validator| validator.run(ctx))
            });
        if let Err(err) = ctx.bindings().remove_scope(&scope) {
            warn!(rule_set = self.name(), %err, "failed to discard input-check scope");
        }
        checked?;

        ctx.tracer()
            .notify_rule_set(|l| l.on_rule_set_input_check(self, &violations));
        if violations.has_severe() {
            return Err(EngineError::ValidationFailure {
                violations: violations.to_vec(),
            });
        }
        Ok(())
    }

    fn result_of(
        &self,
        outcome: RuleSetOutcome,
        status: RuleSetStatus,
        value: Option<AnyValue>,
    ) -> RuleSetResult {
        RuleSetResult {
            rule_set: self.name().to_owned(),
            outcome,
            status,
            value,
        }
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("name", &self.inner.name)
            .field("rules", &self.inner.rules.len())
            .field("validators", &self.inner.validators.len())
            .field("stop_when", &self.inner.stop_when)
            .finish_non_exhaustive()
    }
}

/// Accumulates the parts of a rule set, then builds it.
pub struct RuleSetBuilder {
    name: String,
    description: Option<String>,
    validators: Vec<Action>,
    pre_condition: Option<Condition>,
    initializer: Option<Action>,
    rules: Vec<Rule>,
    stop_when: StopCondition,
    finalizer: Option<Action>,
    result: Option<Function>,
}

impl RuleSetBuilder {
    /// Attaches a description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends an input validator; validators run before anything else,
    /// in declaration order, with the violations sink bound under
    /// [`VIOLATIONS_BINDING`].
    #[must_use]
    pub fn validator(mut self, validator: Action) -> Self {
        self.validators.push(validator);
        self
    }

    /// Declares the rule-set precondition.
    #[must_use]
    pub fn pre_condition(mut self, condition: Condition) -> Self {
        self.pre_condition = Some(condition);
        self
    }

    /// Declares the initializer, run once before the first rule.
    #[must_use]
    pub fn initializer(mut self, action: Action) -> Self {
        self.initializer = Some(action);
        self
    }

    /// Appends a rule; rules run strictly in declaration order.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Sets the stop condition, evaluated after each recorded result.
    #[must_use]
    pub fn stop_when(mut self, stop: StopCondition) -> Self {
        self.stop_when = stop;
        self
    }

    /// Declares the finalizer, run once after the last attempted rule.
    #[must_use]
    pub fn finalizer(mut self, action: Action) -> Self {
        self.finalizer = Some(action);
        self
    }

    /// Declares the result-extraction function, run last.
    #[must_use]
    pub fn result(mut self, function: Function) -> Self {
        self.result = Some(function);
        self
    }

    /// Builds the rule set; an empty rule list is an error.
    pub fn build(self) -> Result<RuleSet, EngineError> {
        if self.rules.is_empty() {
            return Err(EngineError::InvalidDefinition(format!(
                "rule set '{}' has no rules",
                self.name
            )));
        }
        Ok(RuleSet {
            inner: Arc::new(RuleSetInner {
                name: self.name,
                description: self.description,
                validators: self.validators,
                pre_condition: self.pre_condition,
                initializer: self.initializer,
                rules: self.rules,
                stop_when: self.stop_when,
                finalizer: self.finalizer,
                result: self.result,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Param;
    use pretty_assertions::assert_eq;
    use tenet_bindings::Bindings;

    fn context() -> RuleContext {
        RuleContext::new(Bindings::new())
    }

    fn passing_rule(name: &str) -> Rule {
        Rule::builder(name)
            .given(Condition::constant(true))
            .build()
            .unwrap()
    }

    fn failing_rule(name: &str) -> Rule {
        Rule::builder(name)
            .given(Condition::constant(false))
            .build()
            .unwrap()
    }

    #[test]
    fn runs_rules_in_order_and_completes() {
        let ctx = context();
        let set = RuleSet::builder("all")
            .rule(passing_rule("first"))
            .rule(failing_rule("second"))
            .rule(passing_rule("third"))
            .build()
            .unwrap();

        let result = set.run(&ctx).unwrap();
        assert_eq!(result.outcome(), RuleSetOutcome::Completed);
        let names: Vec<_> = result
            .status()
            .results()
            .iter()
            .map(RuleResult::rule)
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
        assert_eq!(result.status().passed(), 2);
        assert_eq!(result.status().failed(), 1);
    }

    #[test]
    fn stop_condition_halts_the_run() {
        let ctx = context();
        let set = RuleSet::builder("stops")
            .rule(passing_rule("first"))
            .rule(failing_rule("second"))
            .rule(passing_rule("never_runs"))
            .stop_when(StopCondition::when_one_fails())
            .build()
            .unwrap();

        let result = set.run(&ctx).unwrap();
        assert_eq!(result.outcome(), RuleSetOutcome::Stopped);
        assert_eq!(result.status().len(), 2);
    }

    #[test]
    fn rejected_precondition_skips_the_run() {
        let ctx = context();
        ctx.bindings().bind_value("ran", false).unwrap();

        let set = RuleSet::builder("skipped")
            .pre_condition(Condition::constant(false))
            .initializer(Action::new("init", [Param::cell::<bool>("ran")], |args| {
                args.cell("ran")?.set(true)?;
                Ok(())
            }))
            .rule(passing_rule("never_runs"))
            .build()
            .unwrap();

        let result = set.run(&ctx).unwrap();
        assert_eq!(result.outcome(), RuleSetOutcome::Skipped);
        assert!(result.status().is_empty());
        assert!(!*ctx.bindings().get("ran").unwrap().get::<bool>().unwrap());
    }

    #[test]
    fn rule_error_is_recorded_and_the_set_continues() {
        let ctx = context();
        let set = RuleSet::builder("resilient")
            .rule(
                Rule::builder("exploding")
                    .given(Condition::new("boom", [], |_| {
                        Err(EngineError::execution("given", "boom"))
                    }))
                    .build()
                    .unwrap(),
            )
            .rule(passing_rule("still_runs"))
            .build()
            .unwrap();

        let result = set.run(&ctx).unwrap();
        assert_eq!(result.outcome(), RuleSetOutcome::Completed);
        assert_eq!(result.status().len(), 2);
        assert!(result.status().results()[0].outcome().is_failure());
        assert!(result.status().results()[1].outcome().is_pass());
    }

    #[test]
    fn run_scope_is_discarded_on_success() {
        let ctx = context();
        let depth_before = ctx.bindings().depth();
        let set = RuleSet::builder("scoped")
            .rule(passing_rule("only"))
            .build()
            .unwrap();
        set.run(&ctx).unwrap();
        assert_eq!(ctx.bindings().depth(), depth_before);
    }

    #[test]
    fn run_scope_is_discarded_on_validation_failure() {
        let ctx = context();
        let depth_before = ctx.bindings().depth();
        let set = RuleSet::builder("invalid")
            .validator(Action::new("always_bad", [], |args| {
                let sink = args.bindings().get(VIOLATIONS_BINDING)?;
                sink.get::<Violations>()?
                    .add(tenet_validator::Violation::new("bad", "always"));
                Ok(())
            }))
            .rule(passing_rule("never_runs"))
            .build()
            .unwrap();

        let err = set.run(&ctx).unwrap_err();
        assert!(matches!(err, EngineError::ValidationFailure { violations } if violations.len() == 1));
        assert_eq!(ctx.bindings().depth(), depth_before);
    }

    #[test]
    fn result_function_extracts_a_value() {
        let ctx = context();
        ctx.bindings().bind_value("total", 40_i64).unwrap();

        let set = RuleSet::builder("extracting")
            .rule(passing_rule("only"))
            .result(Function::producing("plus_two", [Param::of::<i64>("total")], |args| {
                Ok(*args.value::<i64>("total")? + 2)
            }))
            .build()
            .unwrap();

        let result = set.run(&ctx).unwrap();
        assert_eq!(*result.value_as::<i64>().unwrap(), 42);
    }

    #[test]
    fn finalizer_runs_after_a_stop() {
        let ctx = context();
        ctx.bindings().bind_value("finalized", false).unwrap();

        let set = RuleSet::builder("finalizing")
            .rule(failing_rule("fails"))
            .rule(passing_rule("never_runs"))
            .stop_when(StopCondition::when_one_fails())
            .finalizer(Action::new("mark", [Param::cell::<bool>("finalized")], |args| {
                args.cell("finalized")?.set(true)?;
                Ok(())
            }))
            .build()
            .unwrap();

        let result = set.run(&ctx).unwrap();
        assert_eq!(result.outcome(), RuleSetOutcome::Stopped);
        assert!(*ctx.bindings().get("finalized").unwrap().get::<bool>().unwrap());
    }

    #[test]
    fn empty_rule_set_is_rejected_at_build() {
        let err = RuleSet::builder("empty").build().unwrap_err();
        assert!(matches!(err, EngineError::InvalidDefinition(_)));
    }
}
