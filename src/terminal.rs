//! Terminal handlers and type erasure.
//!
//! # How the end of the chain is stored
//!
//! The innermost [`Next`](crate::Next) has to call *something* once every
//! unit has passed control along, and that something varies per dispatch:
//! a no-op for [`Pipeline::dispatch`](crate::Pipeline::dispatch), a caller
//! closure for `dispatch_with_status`, or the outer continuation when a
//! pipeline is nested inside another. Continuations borrow it as a trait
//! object (`&dyn Terminal<E>`) so all three look the same to the chain:
//!
//! ```text
//! |log| Box::pin(async move { … })        ← caller writes this
//!        ↓ dispatch_with_status(&mut ev, f)
//! Reached::new(FnTerminal(f))             ← flags "terminal was reached"
//!        ↓ borrowed as &dyn Terminal<E>
//! terminal.call(event)  at chain end      ← one vtable dispatch
//! ```
//!
//! Nothing here is heap-allocated per unit. The terminal lives on the
//! dispatching future's stack and the chain only borrows it.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Error;

/// A heap-allocated, type-erased future borrowing from the dispatch for `'a`.
///
/// Every step of the chain returns one of these: a unit's `handle`, the
/// continuation's `run`, and the terminal handler. `Send` lets a dispatch be
/// driven from any tokio worker.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The action at the very end of a chain.
pub(crate) trait Terminal<E>: Send + Sync {
    fn call<'a>(&'a self, event: &'a mut E) -> BoxFuture<'a, Result<(), Error>>;
}

/// Default terminal: reaching the end of the chain is the whole job.
pub(crate) struct Noop;

impl<E> Terminal<E> for Noop {
    fn call<'a>(&'a self, _event: &'a mut E) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async { Ok(()) })
    }
}

/// Newtype that lets a caller closure sit at the end of the chain.
pub(crate) struct FnTerminal<F>(pub(crate) F);

impl<E, F> Terminal<E> for FnTerminal<F>
where
    F: for<'t> Fn(&'t mut E) -> BoxFuture<'t, Result<(), Error>> + Send + Sync,
{
    fn call<'a>(&'a self, event: &'a mut E) -> BoxFuture<'a, Result<(), Error>> {
        (self.0)(event)
    }
}

/// Records whether the wrapped terminal was ever invoked.
///
/// The flag flips on *entry*, before the inner handler runs. If that handler
/// fails, the error propagates and the flag is never read.
pub(crate) struct Reached<T> {
    inner: T,
    reached: AtomicBool,
}

impl<T> Reached<T> {
    pub(crate) fn new(inner: T) -> Self {
        Self { inner, reached: AtomicBool::new(false) }
    }

    pub(crate) fn reached(&self) -> bool {
        self.reached.load(Ordering::Acquire)
    }
}

impl<E, T: Terminal<E>> Terminal<E> for Reached<T> {
    fn call<'a>(&'a self, event: &'a mut E) -> BoxFuture<'a, Result<(), Error>> {
        self.reached.store(true, Ordering::Release);
        self.inner.call(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal<E, F>(f: F) -> Reached<FnTerminal<F>>
    where
        F: for<'t> Fn(&'t mut E) -> BoxFuture<'t, Result<(), Error>> + Send + Sync,
    {
        Reached::new(FnTerminal(f))
    }

    #[tokio::test]
    async fn noop_always_succeeds() {
        let mut event = ();
        assert!(Noop.call(&mut event).await.is_ok());
    }

    #[tokio::test]
    async fn reached_flips_on_invocation() {
        let terminal = terminal(|hits: &mut u32| {
            Box::pin(async move {
                *hits += 1;
                Ok(())
            })
        });
        assert!(!terminal.reached());

        let mut hits = 0;
        terminal.call(&mut hits).await.unwrap();
        assert!(terminal.reached());
        assert_eq!(hits, 1);
    }

    #[tokio::test]
    async fn reached_is_set_even_when_the_handler_fails() {
        let terminal = terminal(|_: &mut ()| Box::pin(async { Err(Error::new("boom")) }));

        let err = terminal.call(&mut ()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(terminal.reached());
    }
}
