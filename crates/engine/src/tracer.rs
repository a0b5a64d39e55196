//! Lifecycle listeners and the tracer hub.
//!
//! The state machines fire one callback per lifecycle event,
//! synchronously, on the calling thread, before proceeding. The hub
//! iterates a snapshot of each registration list, so listeners may
//! register further listeners mid-run without upsetting the walk.
//! Listener panics are not caught; a misbehaving listener aborts the run.

use std::sync::Arc;

use parking_lot::RwLock;

use tenet_validator::Violations;

use crate::callable::{Action, Condition};
use crate::error::EngineError;
use crate::rule::{Rule, RuleResult};
use crate::ruleset::{RuleSet, RuleSetResult, RuleSetStatus};

/// Observes single-rule execution.
#[allow(unused_variables)]
pub trait RuleListener: Send + Sync {
    /// The rule entered its state machine.
    fn on_rule_start(&self, rule: &Rule) {}

    /// The precondition was evaluated.
    fn on_pre_condition_check(&self, rule: &Rule, condition: &Condition, passed: bool) {}

    /// The condition ("given") was evaluated.
    fn on_given(&self, rule: &Rule, condition: &Condition, passed: bool) {}

    /// A "then" action completed.
    fn on_action(&self, rule: &Rule, action: &Action) {}

    /// The "otherwise" action completed.
    fn on_otherwise(&self, rule: &Rule, action: &Action) {}

    /// A phase failed; fired for observation only, propagation continues.
    fn on_rule_error(&self, rule: &Rule, error: &EngineError) {}

    /// The rule reached its end state.
    fn on_rule_end(&self, rule: &Rule, result: &RuleResult) {}
}

/// Observes rule-set execution.
#[allow(unused_variables)]
pub trait RuleSetListener: Send + Sync {
    /// The rule set entered its state machine.
    fn on_rule_set_start(&self, rule_set: &RuleSet) {}

    /// Input validation completed; the sink holds whatever was recorded.
    fn on_rule_set_input_check(&self, rule_set: &RuleSet, violations: &Violations) {}

    /// The rule-set precondition was evaluated.
    fn on_rule_set_pre_condition_check(&self, rule_set: &RuleSet, passed: bool) {}

    /// The initializer completed.
    fn on_initializer(&self, rule_set: &RuleSet) {}

    /// The stop condition fired; remaining rules are skipped.
    fn on_rule_set_stop(&self, rule_set: &RuleSet, status: &RuleSetStatus) {}

    /// The finalizer completed.
    fn on_finalizer(&self, rule_set: &RuleSet) {}

    /// A phase failed; fired for observation only, propagation continues.
    fn on_rule_set_error(&self, rule_set: &RuleSet, error: &EngineError) {}

    /// The rule set reached its end state.
    fn on_rule_set_end(&self, rule_set: &RuleSet, result: &RuleSetResult) {}
}

#[derive(Default)]
struct TracerInner {
    rule_listeners: RwLock<Vec<Arc<dyn RuleListener>>>,
    rule_set_listeners: RwLock<Vec<Arc<dyn RuleSetListener>>>,
}

/// The listener hub carried by the rule context.
///
/// Cheap to clone; clones share the registration lists.
#[derive(Clone, Default)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

impl Tracer {
    /// A hub with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule listener; callbacks fire in registration order.
    pub fn add_rule_listener(&self, listener: Arc<dyn RuleListener>) {
        self.inner.rule_listeners.write().push(listener);
    }

    /// Registers a rule-set listener; callbacks fire in registration order.
    pub fn add_rule_set_listener(&self, listener: Arc<dyn RuleSetListener>) {
        self.inner.rule_set_listeners.write().push(listener);
    }

    pub(crate) fn notify_rule(&self, notify: impl Fn(&dyn RuleListener)) {
        let snapshot = self.inner.rule_listeners.read().clone();
        for listener in &snapshot {
            notify(listener.as_ref());
        }
    }

    pub(crate) fn notify_rule_set(&self, notify: impl Fn(&dyn RuleSetListener)) {
        let snapshot = self.inner.rule_set_listeners.read().clone();
        for listener in &snapshot {
            notify(listener.as_ref());
        }
    }
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("rule_listeners", &self.inner.rule_listeners.read().len())
            .field(
                "rule_set_listeners",
                &self.inner.rule_set_listeners.read().len(),
            )
            .finish()
    }
}
