//! Minimal baton example: a chat-turn pipeline with logging, a keyword
//! short-circuit, error translation, and a terminal "bot" handler.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic

use async_trait::async_trait;
use baton::{Error, Middleware, Next, Pipeline, middleware::Trace};

#[derive(Debug, Default)]
struct Turn {
    text: String,
    replies: Vec<String>,
}

impl Turn {
    fn new(text: &str) -> Self {
        Self { text: text.to_owned(), ..Self::default() }
    }
}

// Answers "help" itself; nothing after it runs for that turn.
struct Help;

#[async_trait]
impl Middleware<Turn> for Help {
    async fn handle(&self, turn: &mut Turn, next: Next<'_, Turn>) -> Result<(), Error> {
        if turn.text.eq_ignore_ascii_case("help") {
            turn.replies.push("try: echo <text>".to_owned());
            return Ok(());
        }
        next.run(turn).await
    }
}

// Turns any downstream failure into an apology instead of an error.
struct Apologize;

#[async_trait]
impl Middleware<Turn> for Apologize {
    async fn handle(&self, turn: &mut Turn, next: Next<'_, Turn>) -> Result<(), Error> {
        if let Err(e) = next.run(turn).await {
            turn.replies.push(format!("sorry, something broke: {e}"));
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let pipeline = Pipeline::new()
        .named("chat")
        .with(Trace::new("chat"))
        .with(Apologize)
        .with(Help)
        .with_fn(|turn: &mut Turn, next| {
            Box::pin(async move {
                if turn.text.is_empty() {
                    return Err(Error::new("empty message"));
                }
                next.run(turn).await
            })
        });

    for text in ["help", "echo hello", ""] {
        let mut turn = Turn::new(text);
        let reached = pipeline.dispatch_with_status(&mut turn, bot).await?;
        println!("{text:?} -> {:?} (bot reached: {reached})", turn.replies);
    }
    Ok(())
}

// Terminal handler: only runs when every unit passed the turn along.
fn bot(turn: &mut Turn) -> baton::BoxFuture<'_, Result<(), Error>> {
    Box::pin(async move {
        let reply = turn.text.strip_prefix("echo ").unwrap_or("?").to_owned();
        turn.replies.push(reply);
        Ok(())
    })
}
