//! File-backed tier configuration.
//!
//! This crate turns the JSON documents under the configuration root into
//! immutable [`LoadedConfig`] snapshots:
//! - the base document (`base`, legacy `meta`/`tiers`)
//! - drop-in tier fragments, sorted by `(order, id)`
//! - synthesized defaults on first run and legacy tier migration
//!
//! Typed extraction happens once per load; the runtime never reads the raw tree.

pub mod error;
pub mod loaders;
pub mod paths;
pub mod store;

pub use error::{ConfigError, Result};
pub use loaders::{DropInLoader, Fragment, bootstrap, build_catalog, default_document, extract_config};
pub use paths::ConfigPaths;
pub use store::{ConfigStore, LoadedConfig};
