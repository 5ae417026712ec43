//! # baton
//!
//! An in-process middleware pipeline. Register units once, then push each
//! event through all of them, in order, as one nested chain of calls.
//!
//! ## The contract
//!
//! Every unit gets the event and a [`Next`], the rest of the chain. What
//! happens downstream is the unit's call:
//!
//! - **Pass it on**: `next.run(event).await`. Everything after this unit,
//!   down to the terminal handler, finishes before the `await` resolves.
//!   Code before the call runs on the way in, code after it on the way out.
//! - **Short-circuit**: return without calling `next`. Nothing downstream
//!   runs. This is not an error.
//! - **Fail**: return `Err`. The error unwinds through every enclosing
//!   unit's `next.run(..)` in reverse order. Any of them may match on it and
//!   stop it; otherwise it reaches the caller of `dispatch`.
//!
//! What baton deliberately leaves to units:
//!
//! - **Retries and backoff**: a unit may clone its `Next` and run it again
//! - **Error logging**: errors pass through the engine untouched
//! - **Cancellation**: drop the dispatch future, or carry a signal in the event
//!
//! ## Quick start
//!
//! ```rust
//! use async_trait::async_trait;
//! use baton::{Error, Middleware, Next, Pipeline};
//!
//! #[derive(Default)]
//! struct Turn {
//!     text: String,
//!     replies: Vec<String>,
//! }
//!
//! struct Greet;
//!
//! #[async_trait]
//! impl Middleware<Turn> for Greet {
//!     async fn handle(&self, turn: &mut Turn, next: Next<'_, Turn>) -> Result<(), Error> {
//!         if turn.text == "hi" {
//!             turn.replies.push("hello!".to_owned());
//!             return Ok(()); // handled: skip the rest
//!         }
//!         next.run(turn).await
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let pipeline = Pipeline::new()
//!         .with(Greet)
//!         .with_fn(|turn: &mut Turn, next| Box::pin(async move {
//!             turn.replies.push(format!("echo: {}", turn.text));
//!             next.run(turn).await
//!         }));
//!
//!     let mut turn = Turn { text: "hi".into(), ..Turn::default() };
//!     let reached = pipeline
//!         .dispatch_with_status(&mut turn, |_| Box::pin(async { Ok(()) }))
//!         .await?;
//!
//!     assert!(!reached);
//!     assert_eq!(turn.replies, ["hello!"]);
//!     Ok(())
//! }
//! ```

mod error;
mod next;
mod pipeline;
mod terminal;

pub mod middleware;

pub use error::Error;
pub use middleware::Middleware;
pub use next::Next;
pub use pipeline::Pipeline;
pub use terminal::BoxFuture;
