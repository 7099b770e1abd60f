use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::encode::sink::ImageSink;
use crate::pipeline::changelog::ChangeLog;
use crate::pipeline::cursor::CursorStore;
use crate::pipeline::worker::{PassOutcome, RenderWorker};

/// Fixed-interval trigger loop for a [`RenderWorker`].
#[derive(Clone, Debug)]
pub struct Scheduler {
    interval: Duration,
    max_ticks: Option<u64>,
    stop: Arc<AtomicBool>,
}

/// Counters accumulated by [`Scheduler::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub completed: u64,
    pub suppressed: u64,
    /// Passes that returned an error, transient or not.
    pub failed: u64,
    /// Subset of `failed` whose error retrying cannot clear (bad config, corrupt log, cursor
    /// regression).
    pub fatal: u64,
    pub events_processed: u64,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_ticks: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop after `ticks` triggers.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Flag that ends [`Scheduler::run`] at the next tick boundary when set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Trigger the worker once per interval until stopped. Failed passes are logged; the loop
    /// keeps going so the next tick retries from the persisted cursor.
    pub fn run<L, C, S>(&self, worker: &RenderWorker<L, C, S>) -> SchedulerStats
    where
        L: ChangeLog,
        C: CursorStore,
        S: ImageSink,
    {
        let mut stats = SchedulerStats::default();
        loop {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            if self.max_ticks.is_some_and(|max| stats.ticks >= max) {
                break;
            }

            let started = Instant::now();
            stats.ticks += 1;
            match worker.trigger() {
                Ok(PassOutcome::Completed(report)) => {
                    stats.completed += 1;
                    stats.events_processed += report.processed;
                }
                Ok(PassOutcome::Suppressed) => stats.suppressed += 1,
                Err(err) if err.is_transient() => {
                    stats.failed += 1;
                    tracing::warn!(tick = stats.ticks, error = %err, "scheduled render pass failed");
                }
                Err(err) => {
                    stats.failed += 1;
                    stats.fatal += 1;
                    tracing::error!(
                        tick = stats.ticks,
                        error = %err,
                        "scheduled render pass failed, retrying will not help"
                    );
                }
            }

            if self.max_ticks.is_some_and(|max| stats.ticks >= max) {
                break;
            }
            if let Some(rest) = self.interval.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        stats
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
