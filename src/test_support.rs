//! Helpers shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Counts events at `WARN` and `INFO` emitted while installed.
#[derive(Clone, Default)]
pub struct DiagnosticCounter {
    warnings: Arc<AtomicUsize>,
    infos: Arc<AtomicUsize>,
}

impl DiagnosticCounter {
    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::SeqCst)
    }

    pub fn infos(&self) -> usize {
        self.infos.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for DiagnosticCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        match *event.metadata().level() {
            Level::WARN => {
                self.warnings.fetch_add(1, Ordering::SeqCst);
            }
            Level::INFO => {
                self.infos.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
    }
}

/// Run `f` with a counting subscriber installed on this thread.
pub fn count_diagnostics<T>(f: impl FnOnce() -> T) -> (T, DiagnosticCounter) {
    let counter = DiagnosticCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, counter)
}
