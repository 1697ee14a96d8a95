use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;
use tier_core::EliteQueueConfig;
use tier_core::scaling::{EliteChances, EliteRollBridge, EntityRef, RollError, SpawnOrigin};
use tier_runtime::{EliteSpawnQueue, EngineConfig, SpawnTask, TierEngine};

const ORIGINAL: EliteChances = EliteChances::new(0.1, 0.05, 0.01);

/// Roller that records every roll and fails on odd entity ids when asked to.
struct RecordingRoller {
    chances: Mutex<EliteChances>,
    rolls: Mutex<HashMap<u64, usize>>,
    seen: Mutex<Vec<EliteChances>>,
    fail_odd: bool,
}

impl RecordingRoller {
    fn new(fail_odd: bool) -> Self {
        Self {
            chances: Mutex::new(ORIGINAL),
            rolls: Mutex::new(HashMap::new()),
            seen: Mutex::new(Vec::new()),
            fail_odd,
        }
    }
}

impl EliteRollBridge for RecordingRoller {
    fn chances(&self) -> EliteChances {
        *self.chances.lock().unwrap()
    }

    fn set_chances(&self, chances: EliteChances) {
        *self.chances.lock().unwrap() = chances;
    }

    fn try_roll(&self, entity: EntityRef) -> Result<bool, RollError> {
        *self.rolls.lock().unwrap().entry(entity.0).or_default() += 1;
        self.seen.lock().unwrap().push(self.chances());
        if self.fail_odd && entity.0 % 2 == 1 {
            return Err(RollError::Failed {
                entity,
                reason: "entity despawned".into(),
            });
        }
        Ok(entity.0 % 3 == 0)
    }
}

fn task(id: u64) -> SpawnTask {
    SpawnTask::new(EntityRef(id), EliteChances::new(0.2, 0.0, 0.0), 1.5)
}

#[test]
fn every_task_is_processed_exactly_once() {
    const K: u64 = 23;
    let queue = EliteSpawnQueue::new(EliteQueueConfig::from_raw(0, 5, 0));
    let roller = RecordingRoller::new(false);
    for id in 0..K {
        queue.enqueue("overworld", task(id));
    }

    let mut drains = 0;
    while queue.depth("overworld") > 0 {
        let report = queue.drain("overworld", Some(&roller));
        assert!(report.processed <= 5);
        drains += 1;
    }

    assert_eq!(drains, 5);
    let rolls = roller.rolls.lock().unwrap();
    assert_eq!(rolls.len(), K as usize);
    assert!(rolls.values().all(|&n| n == 1));

    let metrics = queue.metrics_snapshot();
    assert_eq!(metrics.processed, K);
    assert_eq!(metrics.upgraded, 8);
    assert_eq!(metrics.queue_depth, 0);
    assert_eq!(metrics.peak_queue_depth, K);
}

#[test]
fn chances_are_restored_after_every_roll() {
    let queue = EliteSpawnQueue::new(EliteQueueConfig::unbounded());
    let roller = RecordingRoller::new(true);
    for id in 0..6 {
        queue.enqueue("nether", task(id));
    }

    let report = queue.drain("nether", Some(&roller));

    assert_eq!(report.processed, 6);
    assert_eq!(report.failed, 3);
    assert_eq!(roller.chances(), ORIGINAL);
    let seen = roller.seen.lock().unwrap();
    assert!(seen.iter().all(|c| (c.uncommon - 0.3).abs() < 1e-12 && c.rare == 0.0));
}

#[test]
fn worlds_drain_concurrently_without_sharing_tasks() {
    let queue = Arc::new(EliteSpawnQueue::new(EliteQueueConfig::from_raw(0, 4, 0)));
    let worlds = ["a", "b", "c", "d"];
    for (w, world) in worlds.iter().enumerate() {
        for i in 0..50u64 {
            queue.enqueue(world, task(w as u64 * 1000 + i));
        }
    }

    let handles: Vec<_> = worlds
        .iter()
        .map(|world| {
            let queue = Arc::clone(&queue);
            let world = world.to_string();
            thread::spawn(move || {
                // Each world keeps its own roller; a shared one would race on its chances.
                let roller = RecordingRoller::new(false);
                while queue.depth(&world) > 0 {
                    queue.drain(&world, Some(&roller));
                }
                roller.rolls.lock().unwrap().len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 50);
    }
    assert_eq!(queue.metrics().processed(), 200);
    assert_eq!(queue.total_depth(), 0);
}

/// Roller whose upgrades spawn a follower into the same world.
struct SpawningRoller {
    queue: Arc<EliteSpawnQueue>,
    chances: Mutex<EliteChances>,
    rolled: Mutex<Vec<u64>>,
}

impl EliteRollBridge for SpawningRoller {
    fn chances(&self) -> EliteChances {
        *self.chances.lock().unwrap()
    }

    fn set_chances(&self, chances: EliteChances) {
        *self.chances.lock().unwrap() = chances;
    }

    fn try_roll(&self, entity: EntityRef) -> Result<bool, RollError> {
        self.rolled.lock().unwrap().push(entity.0);
        if entity.0 < 100 {
            self.queue.enqueue("w", task(entity.0 + 100));
        }
        Ok(true)
    }
}

#[test]
fn rolls_may_enqueue_into_the_draining_world() {
    let queue = Arc::new(EliteSpawnQueue::new(EliteQueueConfig::unbounded()));
    queue.enqueue("w", task(1));
    queue.enqueue("w", task(2));
    let roller = Arc::new(SpawningRoller {
        queue: Arc::clone(&queue),
        chances: Mutex::new(ORIGINAL),
        rolled: Mutex::new(Vec::new()),
    });

    let (tx, rx) = mpsc::channel();
    {
        let queue = Arc::clone(&queue);
        let roller = Arc::clone(&roller);
        thread::spawn(move || {
            let report = queue.drain("w", Some(roller.as_ref()));
            tx.send(report).unwrap();
        });
    }
    let report = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("drain did not return");

    assert_eq!(report.processed, 2);
    assert_eq!(report.remaining, 2);
    assert_eq!(queue.depth("w"), 2);

    let report = queue.drain("w", Some(roller.as_ref()));
    assert_eq!(report.processed, 2);
    assert_eq!(queue.depth("w"), 0);
    assert_eq!(*roller.rolled.lock().unwrap(), vec![1, 2, 101, 102]);
}

/// Roller that takes longer than a 1 ms drain budget per roll.
struct SlowRoller {
    inner: RecordingRoller,
}

impl EliteRollBridge for SlowRoller {
    fn chances(&self) -> EliteChances {
        self.inner.chances()
    }

    fn set_chances(&self, chances: EliteChances) {
        self.inner.set_chances(chances);
    }

    fn try_roll(&self, entity: EntityRef) -> Result<bool, RollError> {
        thread::sleep(Duration::from_millis(5));
        self.inner.try_roll(entity)
    }
}

#[test]
fn time_budget_stops_after_one_slow_roll() {
    let queue = EliteSpawnQueue::new(EliteQueueConfig::from_raw(0, 0, 1));
    let roller = SlowRoller {
        inner: RecordingRoller::new(false),
    };
    for id in 0..4 {
        queue.enqueue("w", task(id));
    }

    let first = queue.drain("w", Some(&roller));
    assert_eq!(first.processed, 1);
    assert_eq!(first.remaining, 3);

    let mut drains = 1;
    while queue.depth("w") > 0 {
        assert_eq!(queue.drain("w", Some(&roller)).processed, 1);
        drains += 1;
    }

    assert_eq!(drains, 4);
    let rolls = roller.inner.rolls.lock().unwrap();
    assert_eq!(rolls.len(), 4);
    assert!(rolls.values().all(|&n| n == 1));
    assert_eq!(queue.metrics_snapshot().processed, 4);
}

#[test]
fn engine_only_queues_natural_npc_spawns() {
    let dir = TempDir::new().unwrap();
    let engine = TierEngine::open(EngineConfig::new(dir.path())).unwrap();

    assert!(engine.on_entity_spawn("w", "normal", EntityRef(1), SpawnOrigin::Natural, false));
    assert!(!engine.on_entity_spawn("w", "normal", EntityRef(2), SpawnOrigin::Synthetic, false));
    assert!(!engine.on_entity_spawn("w", "normal", EntityRef(3), SpawnOrigin::Natural, true));
    assert_eq!(engine.elite_queue().depth("w"), 1);

    assert_eq!(engine.elite_queue().shutdown_world("w"), 1);
    assert_eq!(engine.elite_queue().metrics().dropped(), 1);
}
