//! Argument assembly: from parameter matches to a callable's [`Args`].

use std::sync::Arc;

use tenet_bindings::{AnyValue, TypeInfo, any_value};

use crate::args::{Args, ResolvedArg};
use crate::context::RuleContext;
use crate::error::EngineError;
use crate::matching::{ParameterMatch, match_method};
use crate::method::MethodDefinition;
use crate::param::{ParamShape, ParameterDefinition};

/// Resolves `method`'s parameters against the context and assembles the
/// ordered argument list.
///
/// Precedence per index: caller-supplied positional value, then the
/// matched binding (as value or cell per the declared shape, converting
/// text where the match says so), then the textual default, then the
/// explicit empty marker. With `read_only` set (conditions), cell
/// arguments are swapped for immutable snapshots before the body can see
/// them.
pub(crate) fn resolve_args(
    ctx: &RuleContext,
    method: &Arc<MethodDefinition>,
    positional: &[AnyValue],
    read_only: bool,
) -> Result<Args, EngineError> {
    let matches = match_method(method, ctx.bindings(), ctx.match_by(), ctx.converters())?;
    let mut values = Vec::with_capacity(method.params().len());
    for (param, m) in method.params().iter().zip(&matches) {
        let arg = resolve_one(ctx, param, m, positional)?;
        values.push(arg);
    }
    if read_only {
        for value in &mut values {
            if let ResolvedArg::Cell(binding) = value {
                *value = ResolvedArg::Value(binding.value());
            }
        }
    }
    Ok(Args::new(
        Arc::clone(method),
        values,
        ctx.bindings().clone(),
        ctx.clock_handle(),
        ctx.locale().clone(),
        ctx.executor().cloned(),
    ))
}

fn resolve_one(
    ctx: &RuleContext,
    param: &ParameterDefinition,
    m: &ParameterMatch,
    positional: &[AnyValue],
) -> Result<ResolvedArg, EngineError> {
    if let Some(value) = positional.get(param.index()) {
        return Ok(ResolvedArg::Value(Arc::clone(value)));
    }
    if let Some(binding) = m.binding() {
        if param.shape() == ParamShape::Cell {
            return Ok(ResolvedArg::Cell(binding.clone()));
        }
        let value = if m.is_converted() {
            ctx.converters()
                .convert(&binding.value(), binding.type_info(), param.type_info())?
        } else {
            binding.value()
        };
        return Ok(ResolvedArg::Value(value));
    }
    if let Some(text) = param.default_text() {
        return default_value(ctx, param, text).map(ResolvedArg::Value);
    }
    Ok(ResolvedArg::Empty)
}

fn default_value(
    ctx: &RuleContext,
    param: &ParameterDefinition,
    text: &str,
) -> Result<AnyValue, EngineError> {
    let text_value = any_value(text.to_owned());
    if param.type_info() == TypeInfo::of::<String>() {
        return Ok(text_value);
    }
    ctx.converters()
        .convert(&text_value, TypeInfo::of::<String>(), param.type_info())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::{Action, Condition};
    use crate::param::Param;
    use pretty_assertions::assert_eq;
    use tenet_bindings::Bindings;

    fn context() -> RuleContext {
        RuleContext::new(Bindings::new())
    }

    #[test]
    fn positional_values_override_resolved_bindings() {
        let ctx = context();
        ctx.bindings().bind_value("x", 1_i64).unwrap();

        let condition = Condition::new("is_two", [Param::of::<i64>("x")], |args| {
            Ok(*args.value::<i64>("x")? == 2)
        });
        assert!(!condition.check(&ctx).unwrap());
        assert!(condition.check_with(&ctx, &[any_value(2_i64)]).unwrap());
    }

    #[test]
    fn defaults_fill_unmatched_parameters() {
        let ctx = context();
        let condition = Condition::new(
            "defaulted",
            [Param::of::<i64>("limit").with_default("10")],
            |args| Ok(*args.value::<i64>("limit")? == 10),
        );
        assert!(condition.check(&ctx).unwrap());
    }

    #[test]
    fn missing_required_value_errors_at_access() {
        let ctx = context();
        let condition = Condition::new("needs_x", [Param::of::<i64>("x")], |args| {
            Ok(*args.value::<i64>("x")? > 0)
        });
        let err = condition.check(&ctx).unwrap_err();
        assert!(matches!(err, EngineError::ParameterMismatch { .. }));
    }

    #[test]
    fn optional_parameter_resolves_to_none() {
        let ctx = context();
        let condition = Condition::new("maybe", [Param::optional::<i64>("x")], |args| {
            Ok(args.optional::<i64>("x")?.is_none())
        });
        assert!(condition.check(&ctx).unwrap());
    }

    #[test]
    fn actions_write_through_cells() {
        let ctx = context();
        ctx.bindings().bind_value("counter", 0_i64).unwrap();

        let action = Action::new("bump", [Param::cell::<i64>("counter")], |args| {
            let cell = args.cell("counter")?;
            let next = *cell.get::<i64>()? + 1;
            cell.set(next)?;
            Ok(())
        });
        action.run(&ctx).unwrap();
        action.run(&ctx).unwrap();
        assert_eq!(
            *ctx.bindings().get("counter").unwrap().get::<i64>().unwrap(),
            2
        );
    }

    #[test]
    fn conditions_see_cells_read_only() {
        let ctx = context();
        ctx.bindings().bind_value("counter", 0_i64).unwrap();

        let condition = Condition::new("peek", [Param::cell::<i64>("counter")], |args| {
            // The projection still reads through as a value...
            assert_eq!(*args.value::<i64>("counter").unwrap(), 0);
            // ...but the cell itself is withheld.
            Ok(args.cell("counter").is_err())
        });
        assert!(condition.check(&ctx).unwrap());
    }

    #[test]
    fn converted_name_match_parses_text() {
        let ctx = context();
        ctx.bindings()
            .bind_value("threshold", String::from("42"))
            .unwrap();

        let condition = Condition::new("is_42", [Param::of::<i64>("threshold")], |args| {
            Ok(*args.value::<i64>("threshold")? == 42)
        });
        assert!(condition.check(&ctx).unwrap());
    }
}
