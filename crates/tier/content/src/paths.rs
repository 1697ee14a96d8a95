//! On-disk layout of the configuration root.
use std::path::{Path, PathBuf};

/// Files and directories used by the tier system, all under one root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigPaths {
    pub root: PathBuf,
    /// Base document with `base`, and optionally legacy `meta`/`tiers`.
    pub base_file: PathBuf,
    /// Directory of drop-in tier fragments.
    pub drop_in_dir: PathBuf,
    pub player_settings: PathBuf,
    /// Pre-migration `{uuid: tierId}` overrides.
    pub legacy_player_overrides: PathBuf,
    /// Persisted world tier admin override.
    pub world_tier: PathBuf,
}

impl ConfigPaths {
    pub const BASE_FILE: &'static str = "difficulty.json";
    pub const DROP_IN_DIR: &'static str = "difficultys";
    pub const PLAYER_SETTINGS_FILE: &'static str = "players-settings.json";
    pub const LEGACY_PLAYER_FILE: &'static str = "difficulty-players.json";
    pub const WORLD_TIER_FILE: &'static str = "world-tier.json";

    /// Relative root used when no platform directory is available.
    pub const DEFAULT_ROOT: &'static str = "config/ascendant";

    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            base_file: root.join(Self::BASE_FILE),
            drop_in_dir: root.join(Self::DROP_IN_DIR),
            player_settings: root.join(Self::PLAYER_SETTINGS_FILE),
            legacy_player_overrides: root.join(Self::LEGACY_PLAYER_FILE),
            world_tier: root.join(Self::WORLD_TIER_FILE),
            root,
        }
    }
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::under(Self::DEFAULT_ROOT)
    }
}
