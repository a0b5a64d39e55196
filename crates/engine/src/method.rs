//! Callable signature metadata.

use crate::param::ParameterDefinition;

/// The declared signature of one callable: descriptive metadata plus the
/// ordered parameter list the matching engine resolves.
#[derive(Debug, Clone)]
pub struct MethodDefinition {
    name: String,
    description: Option<String>,
    params: Vec<ParameterDefinition>,
}

impl MethodDefinition {
    /// A signature with the given name and parameters; parameter indexes
    /// are assigned from declaration order.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParameterDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            params: params
                .into_iter()
                .enumerate()
                .map(|(index, param)| param.at_index(index))
                .collect(),
        }
    }

    /// Attaches a description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The callable's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The declared parameters, in order.
    #[must_use]
    pub fn params(&self) -> &[ParameterDefinition] {
        &self.params
    }

    /// The parameter at `index`.
    #[must_use]
    pub fn param(&self, index: usize) -> Option<&ParameterDefinition> {
        self.params.get(index)
    }

    /// The parameter with the given declared name.
    #[must_use]
    pub fn param_named(&self, name: &str) -> Option<&ParameterDefinition> {
        self.params.iter().find(|param| param.name() == name)
    }
}
