//! Deferred elite upgrade rolls, drained per world.
//!
//! Spawn handlers only enqueue; the world's own tick drains a bounded batch so
//! a burst of spawns never stalls a single tick. Each world has an independent
//! queue. Draining one world never touches another's tasks.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tier_core::EliteQueueConfig;
use tier_core::scaling::{EliteChances, EliteRollBridge, EntityRef, roll_with_override};
use tracing::{debug, warn};

use super::metrics::{EliteQueueMetrics, EliteQueueSnapshot};

/// One pending elite roll.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnTask {
    pub entity: EntityRef,
    /// The tier's `elite_mobs_chance_multiplier` at enqueue time.
    pub chance_multiplier: f64,
    /// The tier's explicit chances at enqueue time.
    pub chances: EliteChances,
    pub enqueued_at: Instant,
}

/// What one drain call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Rolls performed.
    pub processed: usize,
    pub upgraded: usize,
    pub failed: usize,
    /// Tasks discarded because no roller was available.
    pub dropped: usize,
    /// Tasks still queued for the world.
    pub remaining: usize,
    /// The drain interval had not elapsed; nothing was touched.
    pub throttled: bool,
}

#[derive(Default)]
struct WorldQueue {
    tasks: VecDeque<SpawnTask>,
    last_drain: Option<Instant>,
}

/// Per-world FIFO queues of elite rolls with shared throttling and metrics.
pub struct EliteSpawnQueue {
    worlds: Mutex<HashMap<String, Arc<Mutex<WorldQueue>>>>,
    config: RwLock<EliteQueueConfig>,
    metrics: EliteQueueMetrics,
}

impl EliteSpawnQueue {
    pub fn new(config: EliteQueueConfig) -> Self {
        Self {
            worlds: Mutex::new(HashMap::new()),
            config: RwLock::new(config),
            metrics: EliteQueueMetrics::new(),
        }
    }

    pub fn config(&self) -> EliteQueueConfig {
        *self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the drain limits; takes effect on the next drain.
    pub fn set_config(&self, config: EliteQueueConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    fn world(&self, world: &str) -> Arc<Mutex<WorldQueue>> {
        let mut worlds = self.worlds.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(worlds.entry(world.to_string()).or_default())
    }

    fn existing_world(&self, world: &str) -> Option<Arc<Mutex<WorldQueue>>> {
        self.worlds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(world)
            .cloned()
    }

    /// Appends a task to the world's queue.
    pub fn enqueue(&self, world: &str, task: SpawnTask) {
        let queue = self.world(world);
        queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tasks
            .push_back(task);
        self.metrics.record_enqueued();
        self.refresh_depth();
    }

    /// Drains a bounded batch for `world` now.
    pub fn drain(&self, world: &str, bridge: Option<&dyn EliteRollBridge>) -> DrainReport {
        self.drain_at(world, bridge, Instant::now())
    }

    /// Drains a bounded batch for `world` as of `now`.
    ///
    /// Stops after `max_per_drain` rolls or once `max_drain_time` of wall-clock
    /// time is spent, whichever comes first; at least one task is handled per
    /// drain. Without a bridge the whole queue is dropped.
    ///
    /// The batch is taken off the queue before rolling, so the bridge may
    /// enqueue into the same world. Those tasks wait for the next drain, and
    /// tasks the time budget cut off go back to the front in order.
    pub fn drain_at(
        &self,
        world: &str,
        bridge: Option<&dyn EliteRollBridge>,
        now: Instant,
    ) -> DrainReport {
        let Some(queue) = self.existing_world(world) else {
            return DrainReport::default();
        };
        let config = self.config();
        let mut report = DrainReport::default();

        let mut batch = {
            let mut state = queue.lock().unwrap_or_else(PoisonError::into_inner);
            if let (Some(interval), Some(last)) = (config.interval, state.last_drain)
                && now.saturating_duration_since(last) < interval
            {
                self.metrics.record_skipped_drain();
                report.throttled = true;
                report.remaining = state.tasks.len();
                return report;
            }
            state.last_drain = Some(now);

            if bridge.is_none() {
                report.dropped = state.tasks.len();
                state.tasks.clear();
            }
            let take = config
                .max_per_drain
                .map_or(state.tasks.len(), |max| max.min(state.tasks.len()));
            state.tasks.drain(..take).collect::<VecDeque<_>>()
        };

        let Some(bridge) = bridge else {
            if report.dropped > 0 {
                warn!(
                    target: "tier::elite",
                    world,
                    dropped = report.dropped,
                    "Elite roller unavailable; dropping queued spawns"
                );
                self.metrics.record_dropped(report.dropped as u64);
                self.refresh_depth();
            }
            return report;
        };

        let started = Instant::now();
        while let Some(task) = batch.pop_front() {
            self.roll(bridge, task, now, &mut report);
            if config
                .max_drain_time
                .is_some_and(|budget| started.elapsed() >= budget)
            {
                break;
            }
        }
        self.metrics.record_drain(started.elapsed());

        {
            let mut state = queue.lock().unwrap_or_else(PoisonError::into_inner);
            while let Some(task) = batch.pop_back() {
                state.tasks.push_front(task);
            }
            report.remaining = state.tasks.len();
        }

        self.refresh_depth();
        if report.processed > 0 {
            debug!(
                target: "tier::elite",
                world,
                processed = report.processed,
                upgraded = report.upgraded,
                remaining = report.remaining,
                "Drained elite spawn queue"
            );
        }
        report
    }

    fn roll(
        &self,
        bridge: &dyn EliteRollBridge,
        task: SpawnTask,
        now: Instant,
        report: &mut DrainReport,
    ) {
        let waited = now.saturating_duration_since(task.enqueued_at);
        let started = Instant::now();
        let result = roll_with_override(bridge, task.entity, task.chances, task.chance_multiplier);
        let rolled = started.elapsed();

        report.processed += 1;
        match result {
            Ok(outcome) => {
                if outcome.upgraded {
                    report.upgraded += 1;
                }
                self.metrics.record_roll(waited, rolled, outcome.upgraded);
            }
            Err(err) => {
                report.failed += 1;
                self.metrics.record_roll(waited, rolled, false);
                self.metrics.record_failure();
                warn!(target: "tier::elite", entity = task.entity.0, error = %err, "Elite roll failed");
            }
        }
    }

    /// Discards the world's pending tasks and forgets its state.
    ///
    /// Returns the number of tasks dropped.
    pub fn shutdown_world(&self, world: &str) -> usize {
        let removed = self
            .worlds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(world);
        let Some(queue) = removed else {
            return 0;
        };
        let dropped = {
            let mut state = queue.lock().unwrap_or_else(PoisonError::into_inner);
            let count = state.tasks.len();
            state.tasks.clear();
            count
        };
        if dropped > 0 {
            self.metrics.record_dropped(dropped as u64);
            debug!(target: "tier::elite", world, dropped, "Dropped elite spawns on world shutdown");
        }
        self.refresh_depth();
        dropped
    }

    /// Tasks queued for `world`.
    pub fn depth(&self, world: &str) -> usize {
        self.existing_world(world)
            .map(|queue| queue.lock().unwrap_or_else(PoisonError::into_inner).tasks.len())
            .unwrap_or(0)
    }

    /// Tasks queued across every world.
    pub fn total_depth(&self) -> usize {
        let queues: Vec<_> = self
            .worlds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        queues
            .iter()
            .map(|queue| queue.lock().unwrap_or_else(PoisonError::into_inner).tasks.len())
            .sum()
    }

    /// Worlds with queue state.
    pub fn worlds(&self) -> Vec<String> {
        let mut worlds: Vec<String> = self
            .worlds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        worlds.sort();
        worlds
    }

    pub fn metrics(&self) -> &EliteQueueMetrics {
        &self.metrics
    }

    pub fn metrics_snapshot(&self) -> EliteQueueSnapshot {
        self.metrics.snapshot()
    }

    fn refresh_depth(&self) {
        self.metrics.set_queue_depth(self.total_depth() as u64);
    }
}

impl Default for EliteSpawnQueue {
    fn default() -> Self {
        Self::new(EliteQueueConfig::default())
    }
}

impl SpawnTask {
    pub fn new(entity: EntityRef, chances: EliteChances, chance_multiplier: f64) -> Self {
        Self {
            entity,
            chance_multiplier,
            chances,
            enqueued_at: Instant::now(),
        }
    }

    /// Overrides the enqueue timestamp.
    pub fn enqueued_at(mut self, at: Instant) -> Self {
        self.enqueued_at = at;
        self
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.enqueued_at)
    }
}
