//! Ordered middleware registry and dispatcher.
//!
//! One `Vec` of units, append-only. Every dispatch builds a fresh chain over
//! it, so nothing about one event leaks into the next. Register everything
//! at startup through `&mut self`, then share the pipeline (`Arc` works) and
//! dispatch from as many tasks as you like through `&self`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, debug, debug_span};

use crate::error::Error;
use crate::middleware::{self, Middleware};
use crate::next::Next;
use crate::terminal::{BoxFuture, FnTerminal, Noop, Reached, Terminal};

/// An ordered chain of middleware units.
///
/// Registration order is invocation order, always. Each registration call
/// has a builder twin that returns `self`, so setup chains naturally:
///
/// ```rust
/// # use baton::{middleware::Trace, Pipeline};
/// let pipeline = Pipeline::<u64>::new()
///     .named("inbound")
///     .with(Trace::new("inbound"))
///     .with_fn(|n, next| Box::pin(async move {
///         *n += 1;
///         next.run(n).await
///     }));
/// assert_eq!(pipeline.len(), 2);
/// ```
pub struct Pipeline<E> {
    name: &'static str,
    units: Vec<Arc<dyn Middleware<E>>>,
}

impl<E: Send + 'static> Pipeline<E> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { name: "pipeline", units: Vec::with_capacity(capacity) }
    }

    /// Sets the name recorded on every dispatch span. Defaults to `"pipeline"`.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Appends `unit` to the end of the chain.
    ///
    /// No deduplication: registering the same unit twice runs it twice.
    #[doc(alias = "use")]
    pub fn register(&mut self, unit: impl Middleware<E>) -> &mut Self {
        self.units.push(Arc::new(unit));
        self
    }

    /// Appends a closure as a unit. See [`middleware::from_fn`].
    pub fn register_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut E, Next<'a, E>) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        self.register(middleware::from_fn::<E, F>(f))
    }

    /// Builder form of [`register`](Pipeline::register).
    pub fn with(mut self, unit: impl Middleware<E>) -> Self {
        self.register(unit);
        self
    }

    /// Builder form of [`register_fn`](Pipeline::register_fn).
    pub fn with_fn<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut E, Next<'a, E>) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        self.register_fn(f);
        self
    }

    /// Runs `event` through every unit in order.
    ///
    /// Resolves once the whole chain (or the prefix before a short-circuit)
    /// has unwound. An error no unit intercepted is returned as-is. With no
    /// units registered this is a no-op that cannot fail.
    pub async fn dispatch(&self, event: &mut E) -> Result<(), Error> {
        self.run(event, &Noop).await
    }

    /// Runs `event` through every unit, then through `terminal` if every
    /// unit passed control along.
    ///
    /// Returns `Ok(true)` iff `terminal` was invoked, `Ok(false)` if some
    /// unit short-circuited. If an error escapes the chain there is no
    /// status, only the error.
    ///
    /// ```rust
    /// # use baton::Pipeline;
    /// # async fn demo() -> Result<(), baton::Error> {
    /// let pipeline = Pipeline::<Vec<&'static str>>::new();
    /// let mut log = Vec::new();
    /// let reached = pipeline
    ///     .dispatch_with_status(&mut log, |log| Box::pin(async move {
    ///         log.push("terminal");
    ///         Ok(())
    ///     }))
    ///     .await?;
    /// assert!(reached);
    /// assert_eq!(log, ["terminal"]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn dispatch_with_status<F>(&self, event: &mut E, terminal: F) -> Result<bool, Error>
    where
        F: for<'t> Fn(&'t mut E) -> BoxFuture<'t, Result<(), Error>> + Send + Sync,
    {
        let terminal = Reached::new(FnTerminal(terminal));
        self.run(event, &terminal).await?;

        let reached = terminal.reached();
        debug!(pipeline = self.name, reached, "dispatch complete");
        Ok(reached)
    }

    /// Builds the chain for one event and drives it. Shared by both
    /// dispatch flavors and by nesting.
    fn run<'a>(
        &'a self,
        event: &'a mut E,
        terminal: &'a dyn Terminal<E>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        let span = debug_span!("dispatch", pipeline = self.name, units = self.units.len());
        Box::pin(Next::new(&self.units, terminal).run(event).instrument(span))
    }
}

impl<E> Pipeline<E> {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<E: Send + 'static> Default for Pipeline<E> {
    fn default() -> Self { Self::new() }
}

// Manual impl: units are shared through `Arc`, `E` itself is never cloned.
// Registering on a clone does not affect the original.
impl<E> Clone for Pipeline<E> {
    fn clone(&self) -> Self {
        Self { name: self.name, units: self.units.clone() }
    }
}

impl<E> fmt::Debug for Pipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("units", &self.units.len())
            .finish()
    }
}

// ── Nesting ───────────────────────────────────────────────────────────────────

/// Terminal that resumes the enclosing pipeline's chain.
struct Resume<'n, E>(Next<'n, E>);

impl<E: Send + 'static> Terminal<E> for Resume<'_, E> {
    fn call<'a>(&'a self, event: &'a mut E) -> BoxFuture<'a, Result<(), Error>> {
        self.0.clone().run(event)
    }
}

/// A pipeline is itself a unit. Registered inside another pipeline, it runs
/// its own units and then hands control back to the outer continuation.
/// If one of its units short-circuits, the outer chain stops there too.
#[async_trait]
impl<E: Send + 'static> Middleware<E> for Pipeline<E> {
    async fn handle(&self, event: &mut E, next: Next<'_, E>) -> Result<(), Error> {
        let resume = Resume(next);
        self.run(event, &resume).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<&'static str>;

    struct Tag(&'static str);

    #[async_trait]
    impl Middleware<Log> for Tag {
        async fn handle(&self, log: &mut Log, next: Next<'_, Log>) -> Result<(), Error> {
            log.push(self.0);
            next.run(log).await
        }
    }

    #[test]
    fn registration_grows_the_chain() {
        let mut pipeline = Pipeline::new();
        assert!(pipeline.is_empty());

        pipeline.register(Tag("a")).register(Tag("a"));
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.name(), "pipeline");
    }

    #[test]
    fn builder_sets_name() {
        let pipeline = Pipeline::<Log>::with_capacity(4).named("inbound").with(Tag("a"));
        assert_eq!(pipeline.name(), "inbound");
        assert_eq!(format!("{pipeline:?}"), r#"Pipeline { name: "inbound", units: 1 }"#);
    }

    #[tokio::test]
    async fn duplicates_run_twice() {
        let tag = Tag("dup");
        let pipeline = Pipeline::new().with(tag).with(Tag("dup"));

        let mut log = Vec::new();
        pipeline.dispatch(&mut log).await.unwrap();
        assert_eq!(log, ["dup", "dup"]);
    }

    #[tokio::test]
    async fn clones_are_extended_independently() {
        let base = Pipeline::new().with(Tag("base"));
        let extended = base.clone().with(Tag("extra"));

        let mut log = Vec::new();
        base.dispatch(&mut log).await.unwrap();
        assert_eq!(log, ["base"]);

        log.clear();
        extended.dispatch(&mut log).await.unwrap();
        assert_eq!(log, ["base", "extra"]);
    }

    #[tokio::test]
    async fn registering_between_dispatches_is_picked_up() {
        let mut pipeline = Pipeline::new().with(Tag("first"));

        let mut log = Vec::new();
        pipeline.dispatch(&mut log).await.unwrap();
        pipeline.register(Tag("second"));
        pipeline.dispatch(&mut log).await.unwrap();
        assert_eq!(log, ["first", "first", "second"]);
    }
}
