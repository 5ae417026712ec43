//! The continuation handed to every middleware unit.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::Error;
use crate::middleware::Middleware;
use crate::terminal::{BoxFuture, Terminal};

/// The rest of the chain, from the unit after the current one down to the
/// terminal handler.
///
/// A `Next` only borrows the *suffix* of the pipeline that follows the unit
/// it was handed to. Units cannot see, skip back to, or reorder anything
/// registered before them.
///
/// # Calling it
///
/// - `next.run(event).await` once: the normal case. Everything downstream
///   runs to completion (or fails) before `run` resolves, so code after the
///   `await` is "after" code in the onion.
/// - Never: a short-circuit. Nothing downstream runs and the dispatch
///   reports that the terminal handler was not reached. It is not an error.
/// - More than once: `run` consumes the continuation, so a unit has to
///   `clone()` it first. Every clone re-runs the whole suffix, terminal
///   handler included. baton does not guard against this. A unit that
///   retries downstream work relies on exactly this behavior.
pub struct Next<'a, E> {
    chain: &'a [Arc<dyn Middleware<E>>],
    terminal: &'a dyn Terminal<E>,
    position: usize,
}

impl<'a, E: Send + 'static> Next<'a, E> {
    pub(crate) fn new(chain: &'a [Arc<dyn Middleware<E>>], terminal: &'a dyn Terminal<E>) -> Self {
        Self { chain, terminal, position: 0 }
    }

    /// Runs the rest of the chain against `event`.
    ///
    /// Resolves once every downstream unit and the terminal handler have
    /// returned, or with the first error none of them intercepted.
    pub fn run(self, event: &'a mut E) -> BoxFuture<'a, Result<(), Error>> {
        match self.chain.split_first() {
            Some((unit, rest)) => {
                trace!(position = self.position, "entering middleware");
                let next = Next {
                    chain: rest,
                    terminal: self.terminal,
                    position: self.position + 1,
                };
                unit.handle(event, next)
            }
            None => {
                trace!(position = self.position, "reached terminal handler");
                self.terminal.call(event)
            }
        }
    }
}

impl<E> Next<'_, E> {
    /// Number of units still ahead of this continuation, not counting the
    /// terminal handler.
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }

    /// Index in the pipeline of the unit this continuation will enter.
    /// Equal to the pipeline length when only the terminal handler is left.
    pub fn position(&self) -> usize {
        self.position
    }
}

// Manual impl: a derive would demand `E: Clone`, but only references are copied.
impl<E> Clone for Next<'_, E> {
    fn clone(&self) -> Self {
        Self { chain: self.chain, terminal: self.terminal, position: self.position }
    }
}

impl<E> fmt::Debug for Next<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("position", &self.position)
            .field("remaining", &self.chain.len())
            .finish()
    }
}
