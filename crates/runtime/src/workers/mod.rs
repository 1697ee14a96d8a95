//! Work that runs on the host's tick rather than inline with game events.

mod elite_queue;
mod metrics;

pub use elite_queue::{DrainReport, EliteSpawnQueue, SpawnTask};
pub use metrics::{EliteQueueMetrics, EliteQueueSnapshot};
