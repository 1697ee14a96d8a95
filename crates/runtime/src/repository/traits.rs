//! Repository contracts for mutable tier state.
//!
//! Configuration documents are owned by `tier-content`; these repositories
//! hold what players and admins change while the server runs.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::Result;
use super::records::{PlayerEntries, PlayerSettingsRecord, WorldTierRecord};

/// Per-player tier choice and display preferences.
pub trait PlayerSettingsRepository: Send + Sync {
    /// Entries of the current document, or `None` if it does not exist yet.
    fn load(&self) -> Result<Option<PlayerEntries>>;

    /// Entries of the legacy `{uuid: tierId}` document, if present.
    fn load_legacy(&self) -> Result<Option<PlayerEntries>>;

    /// Replaces the whole document.
    fn save(&self, entries: &BTreeMap<Uuid, PlayerSettingsRecord>) -> Result<()>;
}

/// World tier admin override.
pub trait WorldTierRepository: Send + Sync {
    fn load(&self) -> Result<Option<WorldTierRecord>>;

    fn save(&self, record: &WorldTierRecord) -> Result<()>;
}
