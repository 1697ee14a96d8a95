//! File-based PlayerSettingsRepository implementation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use uuid::Uuid;

use super::{read_document, write_document};
use crate::repository::{
    PlayerEntries, PlayerSettingsRecord, PlayerSettingsRepository, Result, StoredPlayerEntry,
};

/// Player settings stored as one JSON object keyed by player UUID.
pub struct FilePlayerSettingsRepository {
    path: PathBuf,
    legacy_path: PathBuf,
}

impl FilePlayerSettingsRepository {
    pub fn new(path: impl AsRef<Path>, legacy_path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            legacy_path: legacy_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(path: &Path) -> Result<Option<PlayerEntries>> {
        let Some(document) = read_document(path)? else {
            return Ok(None);
        };
        let Value::Object(map) = document else {
            tracing::warn!(target: "tier::players", "{} is not a JSON object; ignoring it", path.display());
            return Ok(Some(Vec::new()));
        };

        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            if value.is_null() {
                continue;
            }
            match serde_json::from_value::<StoredPlayerEntry>(value) {
                Ok(entry) => entries.push((key, entry)),
                Err(err) => {
                    tracing::warn!(target: "tier::players", player = %key, error = %err, "Skipping malformed player settings");
                }
            }
        }
        Ok(Some(entries))
    }
}

impl PlayerSettingsRepository for FilePlayerSettingsRepository {
    fn load(&self) -> Result<Option<PlayerEntries>> {
        Self::read_entries(&self.path)
    }

    fn load_legacy(&self) -> Result<Option<PlayerEntries>> {
        Self::read_entries(&self.legacy_path)
    }

    fn save(&self, entries: &BTreeMap<Uuid, PlayerSettingsRecord>) -> Result<()> {
        write_document(&self.path, entries)?;
        tracing::debug!(target: "tier::players", players = entries.len(), "Saved player settings: {}", self.path.display());
        Ok(())
    }
}
