//! Loaded configuration snapshots with atomic reload.
use std::sync::{Arc, PoisonError, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value};
use tier_core::{TierCatalog, TierConfig};
use tracing::info;

use crate::error::Result;
use crate::loaders::{self, DropInLoader, build_catalog, extract_config};
use crate::paths::ConfigPaths;

/// One immutable, fully parsed configuration.
///
/// Readers hold an `Arc` to a snapshot; a reload builds a new one and swaps it
/// in, so a reader never observes a mix of old and new state.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: TierConfig,
    pub catalog: TierCatalog,
    /// Merged document the snapshot was built from.
    pub document: Map<String, Value>,
    /// Number of drop-in fragments merged into `document`.
    pub fragments: usize,
    /// Increments on each successful load.
    pub generation: u64,
}

impl LoadedConfig {
    /// Builds a snapshot from an in-memory document, without touching disk.
    pub fn from_document(document: Map<String, Value>) -> Self {
        Self {
            config: extract_config(&document),
            catalog: build_catalog(&document),
            document,
            fragments: 0,
            generation: 0,
        }
    }
}

/// Owns the on-disk configuration and the current snapshot.
pub struct ConfigStore {
    paths: ConfigPaths,
    current: RwLock<Arc<LoadedConfig>>,
    generation: AtomicU64,
}

impl ConfigStore {
    /// Bootstraps missing files under `paths`, then loads the first snapshot.
    pub fn load_or_create(paths: ConfigPaths) -> Result<Self> {
        loaders::bootstrap(&paths)?;
        let loaded = load(&paths, 1)?;
        Ok(Self {
            paths,
            current: RwLock::new(Arc::new(loaded)),
            generation: AtomicU64::new(1),
        })
    }

    /// Wraps a prebuilt snapshot. Reloads still read from `paths`.
    pub fn with_snapshot(paths: ConfigPaths, loaded: LoadedConfig) -> Self {
        let generation = loaded.generation;
        Self {
            paths,
            current: RwLock::new(Arc::new(loaded)),
            generation: AtomicU64::new(generation),
        }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<LoadedConfig> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-reads everything and swaps the snapshot.
    ///
    /// Any error leaves the previous snapshot in place.
    pub fn reload(&self) -> Result<Arc<LoadedConfig>> {
        let generation = self.generation.load(Ordering::Acquire) + 1;
        let loaded = Arc::new(load(&self.paths, generation)?);

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&loaded);
        self.generation.store(generation, Ordering::Release);

        info!(
            target: "tier::config",
            generation,
            tiers = loaded.catalog.len(),
            fragments = loaded.fragments,
            "Reloaded tier configuration"
        );
        Ok(loaded)
    }
}

/// Reads the base document, merges drop-ins and extracts typed state.
pub fn load(paths: &ConfigPaths, generation: u64) -> Result<LoadedConfig> {
    let mut document = loaders::read_object(&paths.base_file)?;
    let fragments = DropInLoader::new(&paths.drop_in_dir).load()?;
    loaders::dropins::merge_fragments(&mut document, &fragments);

    Ok(LoadedConfig {
        config: extract_config(&document),
        catalog: build_catalog(&document),
        document,
        fragments: fragments.len(),
        generation,
    })
}
