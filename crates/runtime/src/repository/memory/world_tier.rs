//! In-memory WorldTierRepository implementation for tests and local runs.

use std::sync::RwLock;

use crate::repository::{RepositoryError, Result, WorldTierRecord, WorldTierRepository};

#[derive(Default)]
pub struct InMemoryWorldTierRepo {
    record: RwLock<Option<WorldTierRecord>>,
}

impl InMemoryWorldTierRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorldTierRepository for InMemoryWorldTierRepo {
    fn load(&self) -> Result<Option<WorldTierRecord>> {
        let record = self
            .record
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(record.clone())
    }

    fn save(&self, record: &WorldTierRecord) -> Result<()> {
        let mut stored = self
            .record
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        *stored = Some(record.clone());
        Ok(())
    }
}
