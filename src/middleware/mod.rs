//! Middleware layer.
//!
//! A middleware unit sees every event dispatched through its pipeline,
//! together with a [`Next`] standing for everything registered after it.
//! It is the right place for cross-cutting concerns: tracing, request-id
//! injection, authentication checks, error translation.
//!
//! Two ways to write one:
//!
//! - implement [`Middleware`] on a type (state goes in the struct);
//! - hand a closure to [`from_fn`] or [`Pipeline::register_fn`](crate::Pipeline::register_fn).
//!
//! Built-in units:
//! - [`Trace`]: debug log with downstream latency and outcome

use std::fmt;

use async_trait::async_trait;

use crate::error::Error;
use crate::next::Next;
use crate::terminal::BoxFuture;

mod trace;

pub use trace::Trace;

/// One interceptor in a [`Pipeline`](crate::Pipeline).
///
/// `handle` decides what happens to the rest of the chain:
///
/// ```rust
/// use async_trait::async_trait;
/// use baton::{Error, Middleware, Next};
///
/// struct RequireUser;
///
/// #[async_trait]
/// impl Middleware<Option<String>> for RequireUser {
///     async fn handle(
///         &self,
///         user: &mut Option<String>,
///         next: Next<'_, Option<String>>,
///     ) -> Result<(), Error> {
///         if user.is_none() {
///             // short-circuit: nothing after this unit runs, and it is not an error
///             return Ok(());
///         }
///         // pass control downstream; code after the await runs on the way out
///         next.run(user).await
///     }
/// }
/// ```
///
/// Returning `Err` unwinds through every enclosing unit's `next.run(..)`
/// call. Any of them may match on that result and swallow the error.
#[async_trait]
pub trait Middleware<E>: Send + Sync + 'static {
    async fn handle(&self, event: &mut E, next: Next<'_, E>) -> Result<(), Error>;
}

/// A closure-backed unit. Built by [`from_fn`].
pub struct FromFn<F>(F);

/// Turns a closure into a middleware unit.
///
/// The closure returns a boxed future so that it may borrow the event and
/// the continuation:
///
/// ```rust
/// use baton::{middleware, Pipeline};
///
/// let mut pipeline = Pipeline::<Vec<String>>::new();
/// pipeline.register(middleware::from_fn(|log: &mut Vec<String>, next| {
///     Box::pin(async move {
///         log.push("before".to_owned());
///         let outcome = next.run(log).await;
///         log.push("after".to_owned());
///         outcome
///     })
/// }));
/// ```
pub fn from_fn<E, F>(f: F) -> FromFn<F>
where
    F: for<'a> Fn(&'a mut E, Next<'a, E>) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync
        + 'static,
{
    FromFn(f)
}

#[async_trait]
impl<E, F> Middleware<E> for FromFn<F>
where
    E: Send + 'static,
    F: for<'a> Fn(&'a mut E, Next<'a, E>) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync
        + 'static,
{
    async fn handle(&self, event: &mut E, next: Next<'_, E>) -> Result<(), Error> {
        (self.0)(event, next).await
    }
}

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFn").finish_non_exhaustive()
    }
}
