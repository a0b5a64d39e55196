//! The matching engine.
//!
//! Resolves a [`MethodDefinition`]'s parameters against a binding store,
//! producing one [`ParameterMatch`] per parameter. Strategy selection is
//! per call (the context default) with per-parameter overrides.
//!
//! Precedence under [`MatchBy::NameAndType`]: a name hit whose type
//! neither assigns nor converts is *not* confident. The engine falls
//! back to by-type resolution, so a well-typed type-only candidate beats
//! a wrongly-typed name hit.

use tracing::trace;

use tenet_bindings::{Binding, Bindings, TypeInfo};

use crate::convert::ConverterRegistry;
use crate::error::EngineError;
use crate::method::MethodDefinition;
use crate::param::{MatchBy, ParamShape, ParameterDefinition};

/// The resolution outcome for one declared parameter.
#[derive(Debug, Clone)]
pub struct ParameterMatch {
    index: usize,
    binding: Option<Binding>,
    converted: bool,
    description: String,
}

impl ParameterMatch {
    fn matched(index: usize, binding: Binding, converted: bool, description: String) -> Self {
        Self {
            index,
            binding: Some(binding),
            converted,
            description,
        }
    }

    fn unmatched(index: usize, description: impl Into<String>) -> Self {
        Self {
            index,
            binding: None,
            converted: false,
            description: description.into(),
        }
    }

    /// Index of the parameter this match resolves.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The matched binding, if any.
    #[must_use]
    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    /// Returns `true` if a binding was matched.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.binding.is_some()
    }

    /// Returns `true` if the match goes through a text conversion.
    #[must_use]
    pub fn is_converted(&self) -> bool {
        self.converted
    }

    /// Human-readable account of why the parameter did or did not match.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Resolves every parameter of `method` against `bindings`.
///
/// Fails only on conditions that would hand the invocation invalid data
/// (ambiguous by-type candidates); unmatched parameters are recorded, not
/// raised.
pub fn match_method(
    method: &MethodDefinition,
    bindings: &Bindings,
    default_by: MatchBy,
    converters: &ConverterRegistry,
) -> Result<Vec<ParameterMatch>, EngineError> {
    method
        .params()
        .iter()
        .map(|param| match_parameter(param, bindings, default_by, converters))
        .collect()
}

fn match_parameter(
    param: &ParameterDefinition,
    bindings: &Bindings,
    default_by: MatchBy,
    converters: &ConverterRegistry,
) -> Result<ParameterMatch, EngineError> {
    if param.is_no_binding() {
        return Ok(ParameterMatch::unmatched(
            param.index(),
            "positional only; never resolved against the store",
        ));
    }

    let strategy = param.strategy_override().unwrap_or(default_by);
    let result = match strategy {
        MatchBy::Name => match by_name(param, bindings, converters) {
            NameOutcome::Match(m) => m,
            NameOutcome::Rejected(description) | NameOutcome::Miss(description) => {
                ParameterMatch::unmatched(param.index(), description)
            }
        },
        MatchBy::Type => by_type(param, bindings)?,
        MatchBy::NameAndType => match by_name(param, bindings, converters) {
            NameOutcome::Match(m) => m,
            NameOutcome::Rejected(_) | NameOutcome::Miss(_) => by_type(param, bindings)?,
        },
    };
    trace!(
        parameter = param.name(),
        matched = result.is_matched(),
        "{}",
        result.description()
    );
    Ok(result)
}

enum NameOutcome {
    /// The name resolved to an assignable (or convertible) binding.
    Match(ParameterMatch),
    /// The name exists but its type fits neither directly nor through a
    /// converter.
    Rejected(String),
    /// No visible binding carries the name.
    Miss(String),
}

fn by_name(
    param: &ParameterDefinition,
    bindings: &Bindings,
    converters: &ConverterRegistry,
) -> NameOutcome {
    let Ok(binding) = bindings.get(param.name()) else {
        return NameOutcome::Miss(format!("no binding named '{}'", param.name()));
    };
    if assignable(&binding, param.type_info()) {
        return NameOutcome::Match(ParameterMatch::matched(
            param.index(),
            binding.clone(),
            false,
            format!("matched binding '{}' by name", param.name()),
        ));
    }
    // A conversion can satisfy a value parameter, but writes cannot flow
    // back through a converted cell.
    if param.shape() != ParamShape::Cell
        && converters
            .find(binding.type_info(), param.type_info())
            .is_some()
    {
        return NameOutcome::Match(ParameterMatch::matched(
            param.index(),
            binding.clone(),
            true,
            format!(
                "matched binding '{}' by name via conversion {} -> {}",
                param.name(),
                binding.type_info(),
                param.type_info()
            ),
        ));
    }
    NameOutcome::Rejected(format!(
        "binding '{}' matched by name but {} is not assignable to {}",
        param.name(),
        binding.type_info(),
        param.type_info()
    ))
}

fn by_type(
    param: &ParameterDefinition,
    bindings: &Bindings,
) -> Result<ParameterMatch, EngineError> {
    let candidates = bindings.find_by_type_id(param.type_info().id());
    match candidates.len() {
        0 => Ok(ParameterMatch::unmatched(
            param.index(),
            if param.shape() == ParamShape::Optional {
                format!("no candidate of type {}; resolves to empty", param.type_info())
            } else {
                format!("no binding matched name or type {}", param.type_info())
            },
        )),
        1 => Ok(ParameterMatch::matched(
            param.index(),
            candidates[0].binding.clone(),
            false,
            format!(
                "matched binding '{}' by type {}",
                candidates[0].binding.name(),
                param.type_info()
            ),
        )),
        _ => {
            // Candidates come innermost-scope-first: the deepest scope
            // wins outright, a tie within it is unresolvable.
            let innermost_depth = candidates[0].depth;
            let innermost: Vec<_> = candidates
                .iter()
                .filter(|candidate| candidate.depth == innermost_depth)
                .collect();
            if innermost.len() == 1 {
                return Ok(ParameterMatch::matched(
                    param.index(),
                    innermost[0].binding.clone(),
                    false,
                    format!(
                        "matched binding '{}' by type {} (innermost of {} candidates)",
                        innermost[0].binding.name(),
                        param.type_info(),
                        candidates.len()
                    ),
                ));
            }
            Err(EngineError::AmbiguousMatch {
                parameter: param.name().to_owned(),
                candidates: candidates
                    .iter()
                    .map(|candidate| candidate.binding.name().to_owned())
                    .collect(),
            })
        }
    }
}

fn assignable(binding: &Binding, ty: TypeInfo) -> bool {
    binding.type_info() == ty || ty.matches_value(&binding.value())
}
