//! Structured violation records.
//!
//! A [`Violation`] carries an error code for programmatic handling, a
//! message template, and ordered named parameters. Message interpolation
//! belongs to outer formatting layers; the record keeps the raw template.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Severity of a recorded violation.
///
/// Only severe ([`Error`](Severity::Error)) violations abort a rule set's
/// input-validation phase; warnings and notes are carried for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational note.
    Info,
    /// Should be addressed but does not block the run.
    Warning,
    /// Must be fixed; blocks the run (default).
    #[default]
    Error,
}

impl Severity {
    /// Returns `true` if this severity aborts input validation.
    #[must_use]
    pub fn is_severe(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

type Params = SmallVec<[(Cow<'static, str>, Cow<'static, str>); 4]>;

/// One structured violation: code, severity, message template, and
/// ordered named parameters.
///
/// Uses `Cow<'static, str>` so the common case of static codes and
/// templates allocates nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    code: Cow<'static, str>,
    severity: Severity,
    message: Cow<'static, str>,
    params: Params,
}

impl Violation {
    /// A severe violation with the given code and message template.
    pub fn new(code: impl Into<Cow<'static, str>>, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: code.into(),
            severity: Severity::Error,
            message: message.into(),
            params: SmallVec::new(),
        }
    }

    /// Overrides the severity.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Appends a named parameter for the message template.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_param(
        mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// The violation code, e.g. `"not_empty"`.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The raw message template.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Ordered named parameters.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_ref(), v.as_ref()))
    }

    /// Looks up one parameter by key.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v.as_ref())
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}
