//! File-based WorldTierRepository implementation.

use std::path::{Path, PathBuf};

use super::{read_document, write_document};
use crate::repository::{RepositoryError, Result, WorldTierRecord, WorldTierRepository};

pub struct FileWorldTierRepository {
    path: PathBuf,
}

impl FileWorldTierRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl WorldTierRepository for FileWorldTierRepository {
    fn load(&self) -> Result<Option<WorldTierRecord>> {
        let Some(document) = read_document(&self.path)? else {
            return Ok(None);
        };
        let record =
            serde_json::from_value(document).map_err(|e| RepositoryError::Json(e.to_string()))?;
        Ok(Some(record))
    }

    fn save(&self, record: &WorldTierRecord) -> Result<()> {
        write_document(&self.path, record)?;
        tracing::debug!(target: "tier::world", "Saved world tier settings: {}", self.path.display());
        Ok(())
    }
}
