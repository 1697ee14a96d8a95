//! Loaders turning JSON documents on disk into typed tier configuration.
//!
//! - [`document`] extracts [`tier_core::TierConfig`] and the tier catalog from a merged tree
//! - [`dropins`] reads and merges drop-in tier fragments
//! - [`defaults`] synthesizes first-run defaults and migrates legacy documents

pub mod defaults;
pub mod document;
pub mod dropins;

pub use defaults::{bootstrap, default_document};
pub use document::{build_catalog, extract_config};
pub use dropins::{DropInLoader, Fragment};

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};

/// Fragment-level result; failures are logged and the fragment skipped.
pub type LoadResult<T> = anyhow::Result<T>;

/// Reads a file to string.
pub(crate) fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
}

/// Reads a document whose top level must be a JSON object.
pub(crate) fn read_object(path: &Path) -> Result<Map<String, Value>> {
    let content = read_file(path)?;
    match serde_json::from_str(&content).map_err(|e| ConfigError::json(path, e))? {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Writes pretty JSON through a temp file and rename.
pub(crate) fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }
    let temp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value).map_err(|e| ConfigError::json(path, e))?;
    fs::write(&temp_path, json).map_err(|e| ConfigError::io(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| ConfigError::io(path, e))?;

    tracing::debug!(target: "tier::config", "Wrote {}", path.display());
    Ok(())
}
