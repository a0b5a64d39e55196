//! Text-to-type conversion at the matching boundary.
//!
//! The store never coerces values; when a textual binding (or a
//! parameter's default text) must satisfy a non-text declared type, the
//! matching and invocation paths go through an explicit registry owned by
//! the rule context. The registry ships with the text converters the
//! engine itself needs; applications register richer ones.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use tenet_bindings::{AnyValue, TypeInfo, any_value, downcast};

use crate::error::EngineError;

/// Converts values of one type into another.
pub trait Converter: Send + Sync {
    /// Returns `true` if this converter handles `from` → `to`.
    fn can_convert(&self, from: TypeInfo, to: TypeInfo) -> bool;

    /// Converts `value` to the target type.
    ///
    /// Callers check [`can_convert`](Self::can_convert) first; a
    /// converter may still fail on the concrete value (e.g. unparsable
    /// text).
    fn convert(&self, value: &AnyValue, to: TypeInfo) -> Result<AnyValue, EngineError>;
}

/// Parses a `String` binding into any `FromStr` target type.
pub struct TextConverter<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> TextConverter<T>
where
    T: FromStr + Send + Sync + 'static,
{
    /// A converter producing `T` from text.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<T> Default for TextConverter<T>
where
    T: FromStr + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Converter for TextConverter<T>
where
    T: FromStr + Send + Sync + 'static,
{
    fn can_convert(&self, from: TypeInfo, to: TypeInfo) -> bool {
        from == TypeInfo::of::<String>() && to == TypeInfo::of::<T>()
    }

    fn convert(&self, value: &AnyValue, to: TypeInfo) -> Result<AnyValue, EngineError> {
        let text = downcast::<String>(value).ok_or_else(|| EngineError::ConversionFailed {
            value: String::from("<non-text value>"),
            target: to.name(),
        })?;
        let parsed = text
            .parse::<T>()
            .map_err(|_| EngineError::ConversionFailed {
                value: text.as_ref().clone(),
                target: to.name(),
            })?;
        Ok(any_value(parsed))
    }
}

/// An ordered collection of converters; first match wins.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: Vec<Arc<dyn Converter>>,
}

impl ConverterRegistry {
    /// A registry with no converters at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the engine's own text converters: text to
    /// `i64`, `u64`, `f64`, and `bool`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(TextConverter::<i64>::new()));
        registry.register(Arc::new(TextConverter::<u64>::new()));
        registry.register(Arc::new(TextConverter::<f64>::new()));
        registry.register(Arc::new(TextConverter::<bool>::new()));
        registry
    }

    /// Appends a converter; earlier registrations take precedence.
    pub fn register(&mut self, converter: Arc<dyn Converter>) {
        self.converters.push(converter);
    }

    /// Finds the first converter handling `from` → `to`.
    #[must_use]
    pub fn find(&self, from: TypeInfo, to: TypeInfo) -> Option<&dyn Converter> {
        self.converters
            .iter()
            .find(|converter| converter.can_convert(from, to))
            .map(AsRef::as_ref)
    }

    /// Converts `value` (of type `from`) to `to`, if a converter exists.
    pub fn convert(
        &self,
        value: &AnyValue,
        from: TypeInfo,
        to: TypeInfo,
    ) -> Result<AnyValue, EngineError> {
        let converter = self
            .find(from, to)
            .ok_or_else(|| EngineError::ConversionFailed {
                value: format!("<{from}>"),
                target: to.name(),
            })?;
        converter.convert(value, to)
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("len", &self.converters.len())
            .finish()
    }
}
