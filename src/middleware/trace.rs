//! Per-dispatch timing around the downstream chain.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::Middleware;
use crate::error::Error;
use crate::next::Next;

/// Logs how long everything downstream of it took, and whether it failed.
///
/// Register it first to time the whole pipeline, or in the middle to time a
/// suffix. The downstream result is returned unchanged. A failure is logged
/// at `warn` and still propagates.
///
/// ```rust
/// use baton::{middleware::Trace, Pipeline};
///
/// let pipeline = Pipeline::<u64>::new().with(Trace::new("inbound"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Trace {
    label: &'static str,
}

impl Trace {
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl Default for Trace {
    fn default() -> Self { Self::new("trace") }
}

#[async_trait]
impl<E: Send + 'static> Middleware<E> for Trace {
    async fn handle(&self, event: &mut E, next: Next<'_, E>) -> Result<(), Error> {
        let started = Instant::now();
        let downstream = next.remaining();
        let outcome = next.run(event).await;
        let elapsed = started.elapsed();

        match &outcome {
            Ok(()) => debug!(label = self.label, downstream, ?elapsed, "downstream completed"),
            Err(e) => {
                warn!(label = self.label, downstream, ?elapsed, error = %e, "downstream failed")
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::subscriber::DefaultGuard;

    use super::*;
    use crate::Pipeline;

    /// Collects formatted log lines for the current thread.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn install(&self) -> DefaultGuard {
            let sink = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .with_writer(move || sink.clone())
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes).lines().map(str::to_owned).collect()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Fail;

    #[async_trait]
    impl Middleware<u32> for Fail {
        async fn handle(&self, _: &mut u32, _: Next<'_, u32>) -> Result<(), Error> {
            Err(Error::new("downstream broke"))
        }
    }

    #[tokio::test]
    async fn passes_success_through() {
        let pipeline = Pipeline::<u32>::new().with(Trace::new("t"));
        let mut hits = 0u32;
        let reached = pipeline
            .dispatch_with_status(&mut hits, |hits| {
                Box::pin(async move {
                    *hits += 1;
                    Ok(())
                })
            })
            .await
            .unwrap();
        assert!(reached);
        assert_eq!(hits, 1);
    }

    #[tokio::test]
    async fn passes_failure_through_unchanged() {
        let pipeline = Pipeline::new().with(Trace::default()).with(Fail);
        let err = pipeline.dispatch(&mut 0u32).await.unwrap_err();
        assert_eq!(err.to_string(), "downstream broke");
    }

    #[tokio::test]
    async fn failure_is_logged_at_warn() {
        let logs = Captured::default();
        let _guard = logs.install();

        let pipeline = Pipeline::new().with(Trace::new("inbound")).with(Fail);
        pipeline.dispatch(&mut 0u32).await.unwrap_err();

        let lines = logs.lines();
        let failed = lines
            .iter()
            .find(|l| l.contains("downstream failed"))
            .expect("no failure line logged");
        assert!(failed.contains("WARN"), "{failed}");
        assert!(failed.contains("label=\"inbound\""), "{failed}");
        assert!(failed.contains("error=downstream broke"), "{failed}");
        assert!(failed.contains("elapsed="), "{failed}");
        assert!(!lines.iter().any(|l| l.contains("downstream completed")));
    }

    #[tokio::test]
    async fn success_is_logged_at_debug() {
        let logs = Captured::default();
        let _guard = logs.install();

        let pipeline = Pipeline::<u32>::new().with(Trace::new("inbound"));
        pipeline.dispatch(&mut 0).await.unwrap();

        let lines = logs.lines();
        let done = lines
            .iter()
            .find(|l| l.contains("downstream completed"))
            .expect("no completion line logged");
        assert!(done.contains("DEBUG"), "{done}");
        assert!(done.contains("downstream=0"), "{done}");
        assert!(!lines.iter().any(|l| l.contains("WARN")));
    }
}
