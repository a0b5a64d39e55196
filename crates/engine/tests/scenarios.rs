//! End-to-end runs through the rule and rule-set state machines.

use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use tenet_bindings::Bindings;
use tenet_engine::prelude::*;
use tenet_validator::{Alphanumeric, Check, InRange, Matches, NotEmpty};

/// Records every lifecycle event it observes, in order.
#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    fn push(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    fn snapshot(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl RuleListener for EventLog {
    fn on_rule_start(&self, rule: &Rule) {
        self.push(format!("rule_start:{}", rule.name()));
    }
    fn on_pre_condition_check(&self, rule: &Rule, _condition: &Condition, passed: bool) {
        self.push(format!("pre_condition:{}:{passed}", rule.name()));
    }
    fn on_given(&self, rule: &Rule, _condition: &Condition, passed: bool) {
        self.push(format!("given:{}:{passed}", rule.name()));
    }
    fn on_action(&self, rule: &Rule, action: &Action) {
        self.push(format!("action:{}:{}", rule.name(), action.name()));
    }
    fn on_otherwise(&self, rule: &Rule, action: &Action) {
        self.push(format!("otherwise:{}:{}", rule.name(), action.name()));
    }
    fn on_rule_end(&self, rule: &Rule, result: &RuleResult) {
        self.push(format!("rule_end:{}:{}", rule.name(), result.outcome()));
    }
}

impl RuleSetListener for EventLog {
    fn on_rule_set_start(&self, rule_set: &RuleSet) {
        self.push(format!("set_start:{}", rule_set.name()));
    }
    fn on_rule_set_input_check(&self, rule_set: &RuleSet, violations: &Violations) {
        self.push(format!(
            "input_check:{}:{}",
            rule_set.name(),
            violations.severe_count()
        ));
    }
    fn on_rule_set_stop(&self, rule_set: &RuleSet, status: &tenet_engine::RuleSetStatus) {
        self.push(format!("set_stop:{}:{}", rule_set.name(), status.len()));
    }
    fn on_rule_set_end(&self, rule_set: &RuleSet, result: &RuleSetResult) {
        self.push(format!("set_end:{}:{}", rule_set.name(), result.outcome()));
    }
}

fn traced_context(bindings: Bindings, log: &Arc<EventLog>) -> RuleContext {
    let tracer = Tracer::new();
    tracer.add_rule_listener(Arc::clone(log) as Arc<dyn RuleListener>);
    tracer.add_rule_set_listener(Arc::clone(log) as Arc<dyn RuleSetListener>);
    RuleContext::builder(bindings).tracer(tracer).build()
}

/// Scenario A: an empty `y` makes the rule fire and reset `c` through a
/// caller-supplied cell.
#[test]
fn empty_string_condition_resets_counter() {
    let bindings = Bindings::new();
    bindings.bind_value("y", String::new()).unwrap();
    bindings.bind_value("c", -1_i64).unwrap();

    let rule = Rule::builder("empty_means_zero")
        .given(Condition::new("y_empty", [Param::of::<String>("y")], |args| {
            Ok(args.value::<String>("y")?.is_empty())
        }))
        .then(Action::new("reset_c", [Param::cell::<i64>("c")], |args| {
            args.cell("c")?.set(0_i64)?;
            Ok(())
        }))
        .build()
        .unwrap();
    let set = RuleSet::builder("scenario_a").rule(rule).build().unwrap();

    let ctx = RuleContext::new(bindings);
    let result = set.run(&ctx).unwrap();

    assert_eq!(result.outcome(), RuleSetOutcome::Completed);
    assert_eq!(*ctx.bindings().get("c").unwrap().get::<i64>().unwrap(), 0);
}

fn check_to_action<T, C>(name: &str, param: Param, check: C) -> Action
where
    T: Send + Sync + 'static,
    C: Check<T> + Send + Sync + 'static,
{
    Action::new(name, [param, Param::of::<Violations>("violations")], move |args| {
        let value = args.value_at::<T>(0)?;
        let sink = args.value::<Violations>("violations")?;
        if let Err(violation) = check.check(&value) {
            sink.add(violation);
        }
        Ok(())
    })
}

/// Scenario B: three passing validators; the input check reports no
/// severe violations and the run reaches its end event.
#[test]
fn passing_validators_reach_rule_set_end() {
    let bindings = Bindings::new();
    bindings.bind_value("a", String::from("abc")).unwrap();
    bindings.bind_value("b", 100_i64).unwrap();
    bindings.bind_value("c", String::from("C")).unwrap();

    let set = RuleSet::builder("scenario_b")
        .validator(check_to_action(
            "a_alphanumeric",
            Param::of::<String>("a"),
            StringCheck(Box::new(NotEmpty), Box::new(Alphanumeric)),
        ))
        .validator(check_to_action(
            "b_in_range",
            Param::of::<i64>("b"),
            InRange::new(0, 1000),
        ))
        .validator(check_to_action(
            "c_single_capital",
            Param::of::<String>("c"),
            StringCheck(
                Box::new(Matches::new("^[A-Z]$").unwrap()),
                Box::new(NotEmpty),
            ),
        ))
        .rule(
            Rule::builder("trivial")
                .given(Condition::constant(true))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let log = Arc::new(EventLog::default());
    let ctx = traced_context(bindings, &log);
    let result = set.run(&ctx).unwrap();

    assert_eq!(result.outcome(), RuleSetOutcome::Completed);
    let events = log.snapshot();
    assert!(events.contains(&String::from("input_check:scenario_b:0")));
    assert_eq!(events.last().unwrap(), "set_end:scenario_b:completed");
}

/// Both checks must hold for a string value.
struct StringCheck(Box<dyn Check<str> + Send + Sync>, Box<dyn Check<str> + Send + Sync>);

impl Check<String> for StringCheck {
    fn check(&self, input: &String) -> Result<(), Violation> {
        self.0.check(input)?;
        self.1.check(input)
    }
}

/// Scenario C: a rejected precondition fires only start, the
/// precondition check, and end; neither the condition nor any action.
#[test]
fn rejected_precondition_fires_only_skip_events() {
    let bindings = Bindings::new();
    bindings.bind_value("touched", false).unwrap();

    let rule = Rule::builder("gated")
        .pre_condition(Condition::constant(false))
        .given(Condition::constant(true))
        .then(Action::new("touch", [Param::cell::<bool>("touched")], |args| {
            args.cell("touched")?.set(true)?;
            Ok(())
        }))
        .build()
        .unwrap();

    let log = Arc::new(EventLog::default());
    let ctx = traced_context(bindings, &log);
    let result = rule.run(&ctx).unwrap();

    assert_eq!(result.outcome(), RuleOutcome::Skipped);
    assert_eq!(
        log.snapshot(),
        [
            "rule_start:gated",
            "pre_condition:gated:false",
            "rule_end:gated:skipped",
        ]
    );
    assert!(!*ctx.bindings().get("touched").unwrap().get::<bool>().unwrap());
}

/// Scenario D: `when_one_fails` halts after the failing rule; later
/// rules never run and the stop event fires exactly once.
#[test]
fn stop_when_one_fails_halts_after_the_failing_rule() {
    let bindings = Bindings::new();
    bindings.bind_value("runs", 0_i64).unwrap();

    let counting_rule = |name: &str, passes: bool| {
        Rule::builder(name)
            .given(Condition::constant(passes))
            .then(Action::new("count", [Param::cell::<i64>("runs")], |args| {
                let cell = args.cell("runs")?;
                let next = *cell.get::<i64>()? + 1;
                cell.set(next)?;
                Ok(())
            }))
            .otherwise(Action::new("count_fail", [Param::cell::<i64>("runs")], |args| {
                let cell = args.cell("runs")?;
                let next = *cell.get::<i64>()? + 1;
                cell.set(next)?;
                Ok(())
            }))
            .build()
            .unwrap()
    };

    let set = RuleSet::builder("scenario_d")
        .rule(counting_rule("first", true))
        .rule(counting_rule("second", true))
        .rule(counting_rule("failing", false))
        .rule(counting_rule("fourth", true))
        .rule(counting_rule("fifth", true))
        .stop_when(StopCondition::when_one_fails())
        .build()
        .unwrap();

    let log = Arc::new(EventLog::default());
    let ctx = traced_context(bindings, &log);
    let result = set.run(&ctx).unwrap();

    assert_eq!(result.outcome(), RuleSetOutcome::Stopped);
    assert_eq!(result.status().len(), 3);
    assert_eq!(*ctx.bindings().get("runs").unwrap().get::<i64>().unwrap(), 3);

    let stops: Vec<_> = log
        .snapshot()
        .into_iter()
        .filter(|event| event.starts_with("set_stop"))
        .collect();
    assert_eq!(stops, ["set_stop:scenario_d:3"]);
}

/// A severe violation aborts the run before the precondition, carrying
/// the recorded violations on the error.
#[test]
fn severe_violation_aborts_before_the_precondition() {
    let bindings = Bindings::new();
    bindings.bind_value("a", String::new()).unwrap();
    bindings.bind_value("pre_checked", false).unwrap();

    let set = RuleSet::builder("invalid_input")
        .validator(check_to_action(
            "a_not_empty",
            Param::of::<String>("a"),
            StringCheck(Box::new(NotEmpty), Box::new(NotEmpty)),
        ))
        .pre_condition(Condition::new(
            "mark_pre",
            [Param::cell::<bool>("pre_checked")],
            |args| {
                // Never reached: validation fails first.
                assert!(args.cell("pre_checked").is_err());
                Ok(true)
            },
        ))
        .rule(
            Rule::builder("never_runs")
                .given(Condition::constant(true))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let ctx = RuleContext::new(bindings);
    let err = set.run(&ctx).unwrap_err();
    match err {
        EngineError::ValidationFailure { violations } => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].code(), "not_empty");
        }
        other => panic!("expected ValidationFailure, got {other}"),
    }
}

/// A callable that opts into offloading reads the runtime handle from
/// its arguments; the state machine itself stays synchronous.
#[test]
fn actions_can_offload_through_the_executor() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let bindings = Bindings::new();
    bindings.bind_value("sum", 0_i64).unwrap();

    let ctx = RuleContext::builder(bindings)
        .executor(runtime.handle().clone())
        .build();

    let action = Action::new("offload", [Param::cell::<i64>("sum")], |args| {
        let handle = args
            .executor()
            .ok_or_else(|| EngineError::execution("then", "no executor configured"))?
            .clone();
        let value = handle.block_on(async { 40_i64 + 2 });
        args.cell("sum")?.set(value)?;
        Ok(())
    });
    action.run(&ctx).unwrap();
    assert_eq!(*ctx.bindings().get("sum").unwrap().get::<i64>().unwrap(), 42);
}

/// Conditions read the context clock instead of the wall clock.
#[test]
fn conditions_read_the_context_clock() {
    use chrono::{TimeZone, Utc};
    use tenet_engine::FixedClock;

    let instant = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let ctx = RuleContext::builder(Bindings::new())
        .clock(Arc::new(FixedClock::at(instant)))
        .build();

    let condition = Condition::new("is_june", [], move |args| {
        Ok(args.clock().now() == instant)
    });
    assert!(condition.check(&ctx).unwrap());
}

/// Bindings created inside the run's nested scope do not leak outward;
/// writes through caller-supplied cells do.
#[test]
fn nested_run_scope_isolates_side_effects() {
    let bindings = Bindings::new();
    bindings.bind_value("kept", 0_i64).unwrap();

    let set = RuleSet::builder("isolated")
        .initializer(Action::new("setup", [], |args| {
            args.bindings().bind_value("scratch", 99_i64)?;
            Ok(())
        }))
        .rule(
            Rule::builder("update")
                .given(Condition::constant(true))
                .then(Action::new("keep", [Param::cell::<i64>("kept")], |args| {
                    args.cell("kept")?.set(1_i64)?;
                    Ok(())
                }))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let ctx = RuleContext::new(bindings);
    set.run(&ctx).unwrap();

    assert!(!ctx.bindings().contains("scratch"));
    assert_eq!(*ctx.bindings().get("kept").unwrap().get::<i64>().unwrap(), 1);
}
