use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time;

/// Interval between progress polls. Matches the UI refresh cadence.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Shared count of finished probes.
///
/// Every probe task increments exactly once on completion, success or not.
/// The raw storage is deliberately not exposed; callers get `increment` and
/// `snapshot` only. The counter is advisory (progress display) and is never
/// what the orchestrator waits on.
#[derive(Clone, Debug, Default)]
pub struct CompletionCounter {
    inner: Arc<AtomicU64>,
}

impl CompletionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.inner.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }
}

/// Spawn the background progress reporter.
///
/// Polls the counter every `interval`, publishes `completed / total` clamped
/// to [0, 1] on the returned watch channel, and exits once the fraction
/// reaches 1.0. A run with zero probes publishes 1.0 straight away.
pub fn spawn_progress_reporter(
    counter: CompletionCounter,
    total: u64,
    interval: Duration,
) -> watch::Receiver<f64> {
    let (tx, rx) = watch::channel(if total == 0 { 1.0 } else { 0.0 });
    tokio::spawn(async move {
        if total == 0 {
            return;
        }
        loop {
            time::sleep(interval).await;
            let fraction = (counter.snapshot() as f64 / total as f64).min(1.0);
            if tx.send(fraction).is_err() {
                // All receivers dropped; nobody is watching anymore.
                return;
            }
            if fraction >= 1.0 {
                return;
            }
        }
    });
    rx
}
