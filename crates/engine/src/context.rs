//! The per-run execution environment.

use std::fmt;
use std::sync::Arc;

use tenet_bindings::Bindings;

use crate::clock::{Clock, SystemClock};
use crate::convert::ConverterRegistry;
use crate::param::MatchBy;
use crate::tracer::Tracer;

/// A BCP 47-style language tag, carried for callables that format or
/// compare text. The engine itself never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale(String);

impl Locale {
    /// A locale from a language tag such as `"en-US"`.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The language tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self(String::from("en-US"))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The execution environment threaded through every invocation of one
/// top-level run: the active store, the default matching strategy, the
/// converter registry, a clock, a locale, an optional runtime handle for
/// callables that offload work, and the listener hub.
///
/// Created once per run and shared by reference down the call tree.
/// Immutable by convention: only the bindings it holds mutate, and
/// nested runs scope those rather than replacing the context.
pub struct RuleContext {
    bindings: Bindings,
    match_by: MatchBy,
    converters: ConverterRegistry,
    clock: Arc<dyn Clock>,
    locale: Locale,
    executor: Option<tokio::runtime::Handle>,
    tracer: Tracer,
}

impl RuleContext {
    /// A context over `bindings` with default strategy, converters,
    /// clock, and locale, and an empty tracer.
    #[must_use]
    pub fn new(bindings: Bindings) -> Self {
        Self::builder(bindings).build()
    }

    /// Starts building a customized context.
    #[must_use]
    pub fn builder(bindings: Bindings) -> RuleContextBuilder {
        RuleContextBuilder {
            bindings,
            match_by: MatchBy::default(),
            converters: None,
            clock: None,
            locale: None,
            executor: None,
            tracer: None,
        }
    }

    /// The active binding store.
    #[must_use]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// The default matching strategy for this run.
    #[must_use]
    pub fn match_by(&self) -> MatchBy {
        self.match_by
    }

    /// The converter registry.
    #[must_use]
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// The clock callables should read instead of the wall clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// The locale for text-sensitive callables.
    #[must_use]
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Runtime handle for callables that explicitly offload work; the
    /// state machines themselves never block on it.
    #[must_use]
    pub fn executor(&self) -> Option<&tokio::runtime::Handle> {
        self.executor.as_ref()
    }

    /// The listener hub.
    #[must_use]
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub(crate) fn clock_handle(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }
}

impl fmt::Debug for RuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleContext")
            .field("bindings", &self.bindings)
            .field("match_by", &self.match_by)
            .field("locale", &self.locale)
            .field("has_executor", &self.executor.is_some())
            .finish_non_exhaustive()
    }
}

/// Accumulates context configuration, then builds it.
pub struct RuleContextBuilder {
    bindings: Bindings,
    match_by: MatchBy,
    converters: Option<ConverterRegistry>,
    clock: Option<Arc<dyn Clock>>,
    locale: Option<Locale>,
    executor: Option<tokio::runtime::Handle>,
    tracer: Option<Tracer>,
}

impl RuleContextBuilder {
    /// Sets the default matching strategy.
    #[must_use]
    pub fn match_by(mut self, match_by: MatchBy) -> Self {
        self.match_by = match_by;
        self
    }

    /// Replaces the converter registry.
    #[must_use]
    pub fn converters(mut self, converters: ConverterRegistry) -> Self {
        self.converters = Some(converters);
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the locale.
    #[must_use]
    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Attaches a runtime handle for offloading callables.
    #[must_use]
    pub fn executor(mut self, handle: tokio::runtime::Handle) -> Self {
        self.executor = Some(handle);
        self
    }

    /// Attaches a pre-populated tracer.
    #[must_use]
    pub fn tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> RuleContext {
        RuleContext {
            bindings: self.bindings,
            match_by: self.match_by,
            converters: self.converters.unwrap_or_else(ConverterRegistry::with_defaults),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            locale: self.locale.unwrap_or_default(),
            executor: self.executor,
            tracer: self.tracer.unwrap_or_default(),
        }
    }
}
