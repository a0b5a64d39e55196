//! Built-in input checks.
//!
//! A [`Check`] examines one value and reports a [`Violation`] on failure.
//! Validation rules wrap these in callables that resolve the value and
//! the sink from the binding store. The set here covers the common
//! string and numeric cases; anything richer belongs to the application.

use regex::Regex;

use crate::violation::Violation;

/// A single-value predicate producing a structured violation on failure.
pub trait Check<T: ?Sized> {
    /// Checks `input`, returning the violation that describes a failure.
    fn check(&self, input: &T) -> Result<(), Violation>;
}

/// The string must not be empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotEmpty;

impl Check<str> for NotEmpty {
    fn check(&self, input: &str) -> Result<(), Violation> {
        if input.is_empty() {
            return Err(Violation::new("not_empty", "value must not be empty"));
        }
        Ok(())
    }
}

/// The string must have at least `min` characters.
#[derive(Debug, Clone, Copy)]
pub struct MinLength {
    min: usize,
}

impl MinLength {
    /// A minimum-length check counting Unicode scalar values.
    #[must_use]
    pub fn new(min: usize) -> Self {
        Self { min }
    }
}

impl Check<str> for MinLength {
    fn check(&self, input: &str) -> Result<(), Violation> {
        let actual = input.chars().count();
        if actual < self.min {
            return Err(Violation::new("min_length", "value is too short")
                .with_param("min", self.min.to_string())
                .with_param("actual", actual.to_string()));
        }
        Ok(())
    }
}

/// The string must not exceed `max` characters.
#[derive(Debug, Clone, Copy)]
pub struct MaxLength {
    max: usize,
}

impl MaxLength {
    /// A maximum-length check counting Unicode scalar values.
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl Check<str> for MaxLength {
    fn check(&self, input: &str) -> Result<(), Violation> {
        let actual = input.chars().count();
        if actual > self.max {
            return Err(Violation::new("max_length", "value is too long")
                .with_param("max", self.max.to_string())
                .with_param("actual", actual.to_string()));
        }
        Ok(())
    }
}

/// The number must fall within an inclusive range.
#[derive(Debug, Clone, Copy)]
pub struct InRange {
    min: i64,
    max: i64,
}

impl InRange {
    /// An inclusive range check.
    #[must_use]
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

impl Check<i64> for InRange {
    fn check(&self, input: &i64) -> Result<(), Violation> {
        if *input < self.min || *input > self.max {
            return Err(Violation::new("in_range", "value is out of range")
                .with_param("min", self.min.to_string())
                .with_param("max", self.max.to_string())
                .with_param("actual", input.to_string()));
        }
        Ok(())
    }
}

/// The string must match a regular expression.
#[derive(Debug, Clone)]
pub struct Matches {
    pattern: Regex,
}

impl Matches {
    /// A pattern check; fails at construction on an invalid pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Check<str> for Matches {
    fn check(&self, input: &str) -> Result<(), Violation> {
        if !self.pattern.is_match(input) {
            return Err(Violation::new("pattern", "value does not match pattern")
                .with_param("pattern", self.pattern.as_str().to_owned()));
        }
        Ok(())
    }
}

/// The string must contain only ASCII alphanumeric characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Alphanumeric;

impl Check<str> for Alphanumeric {
    fn check(&self, input: &str) -> Result<(), Violation> {
        if !input.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Violation::new(
                "alphanumeric",
                "value must contain only letters and digits",
            ));
        }
        Ok(())
    }
}
