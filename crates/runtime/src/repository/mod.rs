//! Repository layer for mutable tier state.
//!
//! Repositories handle data that CHANGES while the server runs:
//! - Per-player tier overrides and display preferences
//! - The world tier admin override
//!
//! Tier definitions and global settings are configuration, loaded by `tier-content`.

mod error;
mod file;
mod memory;
mod records;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::{FilePlayerSettingsRepository, FileWorldTierRepository};
pub use memory::{InMemoryPlayerSettingsRepo, InMemoryWorldTierRepo};
pub use records::{PlayerEntries, PlayerSettingsRecord, StoredPlayerEntry, WorldTierRecord};
pub use traits::{PlayerSettingsRepository, WorldTierRepository};
