//! In-memory PlayerSettingsRepository implementation for tests and local runs.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use uuid::Uuid;

use crate::repository::{
    PlayerEntries, PlayerSettingsRecord, PlayerSettingsRepository, RepositoryError, Result,
    StoredPlayerEntry,
};

/// Holds documents in memory and counts saves.
#[derive(Default)]
pub struct InMemoryPlayerSettingsRepo {
    current: RwLock<Option<PlayerEntries>>,
    legacy: RwLock<Option<PlayerEntries>>,
    saves: AtomicUsize,
}

impl InMemoryPlayerSettingsRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the current document.
    pub fn with_entries(entries: PlayerEntries) -> Self {
        Self {
            current: RwLock::new(Some(entries)),
            ..Self::default()
        }
    }

    /// Seeds only the legacy document.
    pub fn with_legacy(entries: PlayerEntries) -> Self {
        Self {
            legacy: RwLock::new(Some(entries)),
            ..Self::default()
        }
    }

    /// Number of `save` calls so far.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl PlayerSettingsRepository for InMemoryPlayerSettingsRepo {
    fn load(&self) -> Result<Option<PlayerEntries>> {
        let current = self
            .current
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(current.clone())
    }

    fn load_legacy(&self) -> Result<Option<PlayerEntries>> {
        let legacy = self
            .legacy
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(legacy.clone())
    }

    fn save(&self, entries: &BTreeMap<Uuid, PlayerSettingsRecord>) -> Result<()> {
        let mut current = self
            .current
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        *current = Some(
            entries
                .iter()
                .map(|(id, record)| (id.to_string(), StoredPlayerEntry::Settings(record.clone())))
                .collect(),
        );
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
