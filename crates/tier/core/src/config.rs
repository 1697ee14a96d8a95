//! Typed global configuration read from the `base` section.
//!
//! Each group mirrors one sub-object of the document. Values are extracted once
//! per load; nothing downstream queries the raw document.
use std::time::Duration;

use strum::EnumCount;

use crate::keys::DamageCause;
use crate::world::WorldTierSettings;

/// Complete global configuration.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TierConfig {
    pub players: PlayerRules,
    pub health: HealthScaling,
    pub damage: DamageRules,
    pub drops: DropRules,
    pub rewards: RewardConfig,
    pub elite: EliteConfig,
    pub spawn_count: SpawnCountRules,
    pub world: WorldTierSettings,
}

/// Player-facing tier selection rules.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerRules {
    pub default_tier: String,
    pub allow_change: bool,
    pub allow_change_in_combat: bool,
    pub change_cooldown: Duration,
    pub combat_timeout: Duration,
    pub tier_values_as_percent: bool,
}

impl PlayerRules {
    pub const DEFAULT_TIER: &'static str = "normal";
    pub const DEFAULT_CHANGE_COOLDOWN_MS: u64 = 0;
    pub const DEFAULT_COMBAT_TIMEOUT_MS: u64 = 10_000;
}

impl Default for PlayerRules {
    fn default() -> Self {
        Self {
            default_tier: Self::DEFAULT_TIER.to_string(),
            allow_change: true,
            allow_change_in_combat: false,
            change_cooldown: Duration::from_millis(Self::DEFAULT_CHANGE_COOLDOWN_MS),
            combat_timeout: Duration::from_millis(Self::DEFAULT_COMBAT_TIMEOUT_MS),
            tier_values_as_percent: true,
        }
    }
}

/// Bounds for the max-health modifier.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealthScaling {
    pub enabled: bool,
    pub tolerance: f64,
    pub min_factor: f64,
    pub max_factor: f64,
}

impl HealthScaling {
    pub const DEFAULT_TOLERANCE: f64 = 0.0001;
    pub const DEFAULT_MIN_FACTOR: f64 = 0.05;
    pub const DEFAULT_MAX_FACTOR: f64 = 300.0;
}

impl Default for HealthScaling {
    fn default() -> Self {
        Self {
            enabled: true,
            tolerance: Self::DEFAULT_TOLERANCE,
            min_factor: Self::DEFAULT_MIN_FACTOR,
            max_factor: Self::DEFAULT_MAX_FACTOR,
        }
    }
}

/// Damage and armor modifier switches.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageRules {
    pub enabled: bool,
    pub armor_enabled: bool,
    pub min_damage_factor: f64,
    /// Indexed by `DamageCause as usize`.
    pub causes: [bool; DamageCause::COUNT],
}

impl DamageRules {
    pub const DEFAULT_MIN_DAMAGE_FACTOR: f64 = 0.001;

    pub fn cause_enabled(&self, cause: DamageCause) -> bool {
        self.causes[cause as usize]
    }

    pub fn set_cause_enabled(&mut self, cause: DamageCause, enabled: bool) {
        self.causes[cause as usize] = enabled;
    }
}

impl Default for DamageRules {
    fn default() -> Self {
        Self {
            enabled: true,
            armor_enabled: true,
            min_damage_factor: Self::DEFAULT_MIN_DAMAGE_FACTOR,
            causes: [true; DamageCause::COUNT],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropRules {
    pub enabled: bool,
}

impl Default for DropRules {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// XP and cash reward tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RewardConfig {
    pub cash_variance: f64,
    pub spawn_tier_reward: SpawnTierReward,
    pub leveling: LevelingConfig,
    pub integration_multipliers: IntegrationMultipliers,
}

impl RewardConfig {
    pub const DEFAULT_CASH_VARIANCE: f64 = 0.23;
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            cash_variance: Self::DEFAULT_CASH_VARIANCE,
            spawn_tier_reward: SpawnTierReward::default(),
            leveling: LevelingConfig::default(),
            integration_multipliers: IntegrationMultipliers::default(),
        }
    }
}

/// Scale applied when an entity's spawn tier differs from the rewarded player's tier.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpawnTierReward {
    pub enabled: bool,
    pub over_factor: f64,
    pub under_factor: f64,
}

impl SpawnTierReward {
    pub const DEFAULT_OVER_FACTOR: f64 = 1.05;
    pub const DEFAULT_UNDER_FACTOR: f64 = 0.95;
}

impl Default for SpawnTierReward {
    fn default() -> Self {
        Self {
            enabled: true,
            over_factor: Self::DEFAULT_OVER_FACTOR,
            under_factor: Self::DEFAULT_UNDER_FACTOR,
        }
    }
}

/// Custom leveling: base factor composition, attacker share, attitude and downscale.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelingConfig {
    pub enabled: bool,
    pub use_most_damage_attacker: bool,
    pub most_damage_multiplier: f64,
    pub other_attacker_multiplier: f64,
    pub reward_most_damage_attacker: bool,
    pub include_range: bool,
    pub include_default_stats: bool,
    pub include_scaled_damage: bool,
    pub scaled_damage_factor: f64,
    pub mana_multiplier: f64,
    pub ammo_multiplier: f64,
    pub signature_multiplier: f64,
    pub use_attitude_multiplier: bool,
    pub attitude: AttitudeBands,
    pub downscale: DownscaleCurve,
}

impl LevelingConfig {
    pub const DEFAULT_MOST_DAMAGE_MULTIPLIER: f64 = 1.1;
    pub const DEFAULT_OTHER_ATTACKER_MULTIPLIER: f64 = 0.1;
    pub const DEFAULT_SCALED_DAMAGE_FACTOR: f64 = 4.0;
    pub const DEFAULT_MANA_MULTIPLIER: f64 = 4.0;
    pub const DEFAULT_AMMO_MULTIPLIER: f64 = 4.0;
    pub const DEFAULT_SIGNATURE_MULTIPLIER: f64 = 10.0;
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_most_damage_attacker: true,
            most_damage_multiplier: Self::DEFAULT_MOST_DAMAGE_MULTIPLIER,
            other_attacker_multiplier: Self::DEFAULT_OTHER_ATTACKER_MULTIPLIER,
            reward_most_damage_attacker: true,
            include_range: true,
            include_default_stats: true,
            include_scaled_damage: true,
            scaled_damage_factor: Self::DEFAULT_SCALED_DAMAGE_FACTOR,
            mana_multiplier: Self::DEFAULT_MANA_MULTIPLIER,
            ammo_multiplier: Self::DEFAULT_AMMO_MULTIPLIER,
            signature_multiplier: Self::DEFAULT_SIGNATURE_MULTIPLIER,
            use_attitude_multiplier: true,
            attitude: AttitudeBands::default(),
            downscale: DownscaleCurve::default(),
        }
    }
}

/// Relationship scores and the three-threshold multiplier table.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttitudeBands {
    pub revered_score: f64,
    pub friendly_score: f64,
    pub hostile_score: f64,
    pub npc_hostile_bonus: f64,
    pub threshold_low: f64,
    pub threshold_mid: f64,
    pub threshold_high: f64,
    pub multiplier_low: f64,
    pub multiplier_mid: f64,
    pub multiplier_high: f64,
}

impl Default for AttitudeBands {
    fn default() -> Self {
        Self {
            revered_score: -1000.0,
            friendly_score: -500.0,
            hostile_score: 50.0,
            npc_hostile_bonus: 50.0,
            threshold_low: -900.0,
            threshold_mid: -400.0,
            threshold_high: 50.0,
            multiplier_low: 0.05,
            multiplier_mid: 0.2,
            multiplier_high: 1.1,
        }
    }
}

/// `xp = final / (base + level^exponent * multiplier)`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DownscaleCurve {
    pub base: f64,
    pub level_exponent: f64,
    pub level_multiplier: f64,
}

impl DownscaleCurve {
    pub const DEFAULT_BASE: f64 = 12.0;
    pub const DEFAULT_LEVEL_EXPONENT: f64 = 0.75;
    pub const DEFAULT_LEVEL_MULTIPLIER: f64 = 1.8;
}

impl Default for DownscaleCurve {
    fn default() -> Self {
        Self {
            base: Self::DEFAULT_BASE,
            level_exponent: Self::DEFAULT_LEVEL_EXPONENT,
            level_multiplier: Self::DEFAULT_LEVEL_MULTIPLIER,
        }
    }
}

/// Extra scale applied to bonuses routed through third-party reward systems.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntegrationMultipliers {
    pub leveling: f64,
    pub economy: f64,
}

impl Default for IntegrationMultipliers {
    fn default() -> Self {
        Self {
            leveling: 1.0,
            economy: 1.0,
        }
    }
}

/// Elite spawn feature switches and drain throttling.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EliteConfig {
    pub enabled: bool,
    pub integration_enabled: bool,
    pub queue: EliteQueueConfig,
}

impl Default for EliteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            integration_enabled: true,
            queue: EliteQueueConfig::default(),
        }
    }
}

/// Drain throttling. `None` means unbounded for that dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EliteQueueConfig {
    pub interval: Option<Duration>,
    pub max_per_drain: Option<usize>,
    pub max_drain_time: Option<Duration>,
}

impl EliteQueueConfig {
    pub const DEFAULT_INTERVAL_MS: i64 = 0;
    pub const DEFAULT_MAX_PER_DRAIN: i64 = 2;
    pub const DEFAULT_MAX_DRAIN_MS: i64 = 4;

    /// Builds from raw document numbers, mapping non-positive values to unbounded.
    pub fn from_raw(interval_ms: i64, max_per_drain: i64, max_drain_ms: i64) -> Self {
        let positive_ms = |ms: i64| (ms > 0).then(|| Duration::from_millis(ms as u64));
        Self {
            interval: positive_ms(interval_ms),
            max_per_drain: (max_per_drain > 0).then_some(max_per_drain as usize),
            max_drain_time: positive_ms(max_drain_ms),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            interval: None,
            max_per_drain: None,
            max_drain_time: None,
        }
    }
}

impl Default for EliteQueueConfig {
    fn default() -> Self {
        Self::from_raw(
            Self::DEFAULT_INTERVAL_MS,
            Self::DEFAULT_MAX_PER_DRAIN,
            Self::DEFAULT_MAX_DRAIN_MS,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpawnCountRules {
    pub enabled: bool,
}

impl Default for SpawnCountRules {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_queue_limits_are_unbounded() {
        let queue = EliteQueueConfig::from_raw(0, -1, 0);
        assert_eq!(queue, EliteQueueConfig::unbounded());
    }

    #[test]
    fn default_queue_limits() {
        let queue = EliteQueueConfig::default();
        assert_eq!(queue.interval, None);
        assert_eq!(queue.max_per_drain, Some(2));
        assert_eq!(queue.max_drain_time, Some(Duration::from_millis(4)));
    }

    #[test]
    fn causes_toggle_individually() {
        let mut rules = DamageRules::default();
        rules.set_cause_enabled(DamageCause::Fall, false);
        assert!(!rules.cause_enabled(DamageCause::Fall));
        assert!(rules.cause_enabled(DamageCause::Physical));
    }
}
