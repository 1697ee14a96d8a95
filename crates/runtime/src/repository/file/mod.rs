//! File-based repository implementations.
//!
//! Documents are pretty-printed JSON written through a temp file and rename,
//! so a crash mid-write never leaves a truncated document behind.

mod player_settings;
mod world_tier;

pub use player_settings::FilePlayerSettingsRepository;
pub use world_tier::FileWorldTierRepository;

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::repository::{RepositoryError, Result};

/// Reads a JSON document, `None` if the file does not exist.
fn read_document(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path)?;
    let value = serde_json::from_str(&json).map_err(|e| RepositoryError::Json(e.to_string()))?;
    Ok(Some(value))
}

/// Serializes `value` to a temp file, then renames it over `path`.
fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("json.tmp");

    let json =
        serde_json::to_string_pretty(value).map_err(|e| RepositoryError::Json(e.to_string()))?;
    fs::write(&temp_path, json)?;
    fs::rename(&temp_path, path)?;

    Ok(())
}
