//! Elite spawn queue metrics and statistics.
//!
//! Tracks drain throughput, roll latency, and queue status.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Elite spawn queue metrics updated by enqueue and drain.
///
/// Uses atomics for lock-free access across world threads.
#[derive(Debug, Default)]
pub struct EliteQueueMetrics {
    /// Tasks accepted by `enqueue`
    enqueued: AtomicU64,

    /// Tasks whose roll ran (successfully or not)
    processed: AtomicU64,

    /// Rolls that upgraded the entity
    upgraded: AtomicU64,

    /// Rolls the bridge reported as failed
    failed: AtomicU64,

    /// Tasks discarded without a roll (no bridge, or world shut down)
    dropped: AtomicU64,

    /// Drain calls skipped because the interval had not elapsed
    skipped_drains: AtomicU64,

    /// Drain calls that ran
    drains: AtomicU64,

    /// Tasks currently queued across all worlds
    queue_depth: AtomicU64,

    /// Peak queue depth observed
    peak_queue_depth: AtomicU64,

    total_wait_nanos: AtomicU64,
    total_roll_nanos: AtomicU64,
    total_drain_nanos: AtomicU64,
}

impl EliteQueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one roll with the time it waited in the queue and the roll's duration.
    pub fn record_roll(&self, waited: Duration, rolled: Duration, upgraded: bool) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if upgraded {
            self.upgraded.fetch_add(1, Ordering::Relaxed);
        }
        self.total_wait_nanos
            .fetch_add(waited.as_nanos() as u64, Ordering::Relaxed);
        self.total_roll_nanos
            .fetch_add(rolled.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, count: u64) {
        self.dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_skipped_drain(&self) {
        self.skipped_drains.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drain(&self, elapsed: Duration) {
        self.drains.fetch_add(1, Ordering::Relaxed);
        self.total_drain_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Updates queue depth and tracks peak.
    pub fn set_queue_depth(&self, depth: u64) {
        self.queue_depth.store(depth, Ordering::Relaxed);

        let mut current_peak = self.peak_queue_depth.load(Ordering::Relaxed);
        while depth > current_peak {
            match self.peak_queue_depth.compare_exchange_weak(
                current_peak,
                depth,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current_peak = actual,
            }
        }
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn queue_depth(&self) -> u64 {
        self.queue_depth.load(Ordering::Relaxed)
    }

    pub fn peak_queue_depth(&self) -> u64 {
        self.peak_queue_depth.load(Ordering::Relaxed)
    }

    fn average(total: &AtomicU64, count: u64) -> Duration {
        if count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(total.load(Ordering::Relaxed) / count)
        }
    }

    pub fn avg_queue_wait(&self) -> Duration {
        Self::average(&self.total_wait_nanos, self.processed())
    }

    pub fn avg_roll_time(&self) -> Duration {
        Self::average(&self.total_roll_nanos, self.processed())
    }

    /// Creates a snapshot of all metrics for display/logging.
    ///
    /// Individual fields are read atomically; the snapshot as a whole may be
    /// inconsistent while drains are running.
    pub fn snapshot(&self) -> EliteQueueSnapshot {
        EliteQueueSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            processed: self.processed(),
            upgraded: self.upgraded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped(),
            skipped_drains: self.skipped_drains.load(Ordering::Relaxed),
            drains: self.drains.load(Ordering::Relaxed),
            queue_depth: self.queue_depth(),
            peak_queue_depth: self.peak_queue_depth(),
            avg_queue_wait: self.avg_queue_wait(),
            avg_roll_time: self.avg_roll_time(),
            total_drain_time: Duration::from_nanos(self.total_drain_nanos.load(Ordering::Relaxed)),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct EliteQueueSnapshot {
    pub enqueued: u64,
    pub processed: u64,
    pub upgraded: u64,
    pub failed: u64,
    pub dropped: u64,
    pub skipped_drains: u64,
    pub drains: u64,
    pub queue_depth: u64,
    pub peak_queue_depth: u64,
    pub avg_queue_wait: Duration,
    pub avg_roll_time: Duration,
    pub total_drain_time: Duration,
}
