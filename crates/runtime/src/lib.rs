//! Runtime services for difficulty tiers.
//!
//! This crate wires the pure tier model and the file-backed configuration into
//! a single engine that game collaborators query for tiers and scaled values.
//! Hosts construct one [`TierEngine`] at startup and share it.
//!
//! Modules are organized by responsibility:
//! - [`engine`] hosts the facade and its builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`overrides`] keeps per-player choices and display preferences
//! - [`scaling`] binds the formulas to one configuration snapshot
//! - [`workers`] holds the per-world elite spawn queue
//! - [`repository`] persists what players and admins change at runtime
pub mod api;
pub mod config;
pub mod engine;
pub mod overrides;
pub mod repository;
pub mod scaling;
pub mod workers;

pub use api::{ChangeGate, Result, RuntimeError, WorldTierSnapshot};
pub use config::EngineConfig;
pub use engine::{TierEngine, TierEngineBuilder};
pub use overrides::{LoadReport, PlayerOverrideStore, PlayerPreferences};
pub use repository::{
    FilePlayerSettingsRepository, FileWorldTierRepository, InMemoryPlayerSettingsRepo,
    InMemoryWorldTierRepo, PlayerSettingsRepository, RepositoryError, WorldTierRepository,
};
pub use scaling::{AttitudeFacts, Contributor, TierScaler};
pub use workers::{DrainReport, EliteQueueMetrics, EliteQueueSnapshot, EliteSpawnQueue, SpawnTask};
