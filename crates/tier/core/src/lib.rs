//! Pure difficulty-tier model and scaling formulas.
//!
//! `tier-core` owns the canonical rules: which settings exist, how tiers
//! inherit from one another, how the shared world tier is chosen, and how a
//! tier's numbers turn into damage, health, loot, experience and elite odds.
//! It performs no I/O; loaders build a [`TierCatalog`] and [`TierConfig`] and
//! hand them to the runtime.
pub mod catalog;
pub mod config;
pub mod error;
pub mod keys;
pub mod meta;
pub mod scaling;
pub mod settings;
pub mod world;

pub use catalog::{Tier, TierCatalog, TierSpec};
pub use config::{
    AttitudeBands, DamageRules, DownscaleCurve, DropRules, EliteConfig, EliteQueueConfig,
    HealthScaling, IntegrationMultipliers, LevelingConfig, PlayerRules, RewardConfig,
    SpawnCountRules, SpawnTierReward, TierConfig,
};
pub use error::TierError;
pub use keys::{DamageCause, FlagKey, SettingKey};
pub use meta::{MetaSpec, TierMeta};
pub use settings::{BaseSettings, SettingsOverrides, TierSettings};
pub use world::{WorldTierMode, WorldTierResolver, WorldTierSettings};

/// Tier id returned when the catalog has no tiers at all.
pub const FALLBACK_TIER_ID: &str = "normal";
