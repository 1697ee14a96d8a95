//! Read-only views handed to admin tooling.

use serde::Serialize;
use tier_core::WorldTierMode;

/// World tier state at one instant.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldTierSnapshot {
    pub enabled: bool,
    pub mode: WorldTierMode,
    /// Tier the world resolves to for the given online players.
    pub resolved_tier: String,
    pub fixed_tier: String,
    pub admin_override: Option<String>,
    pub scaled_factor: f64,
    pub use_all_online_players: bool,
}
