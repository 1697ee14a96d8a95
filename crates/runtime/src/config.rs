//! Process-level engine configuration.
use std::env;
use std::path::PathBuf;

use tier_content::ConfigPaths;

/// Where the engine keeps its documents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub paths: ConfigPaths,
}

impl EngineConfig {
    pub const CONFIG_DIR_ENV: &'static str = "ASCENDANT_CONFIG_DIR";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: ConfigPaths::under(root.into()),
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ASCENDANT_CONFIG_DIR` - Configuration root (default: platform config dir, then `config/ascendant`)
    pub fn from_env() -> Self {
        if let Some(root) = read_env::<PathBuf>(Self::CONFIG_DIR_ENV) {
            return Self::new(root);
        }
        Self::new(default_root())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(default_root())
    }
}

/// Platform config directory for the project, else the relative fallback.
pub fn default_root() -> PathBuf {
    directories::ProjectDirs::from("", "", "ascendant")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(ConfigPaths::DEFAULT_ROOT))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    let raw = env::var(key).ok()?;
    if raw.trim().is_empty() {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_the_root() {
        let config = EngineConfig::new("/srv/tiers");
        assert_eq!(config.paths.root, PathBuf::from("/srv/tiers"));
        assert_eq!(
            config.paths.player_settings,
            PathBuf::from("/srv/tiers/players-settings.json")
        );
        assert_eq!(config.paths.drop_in_dir, PathBuf::from("/srv/tiers/difficultys"));
    }
}
