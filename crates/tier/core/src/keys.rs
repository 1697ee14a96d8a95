//! Recognized per-tier setting keys.
//!
//! Every numeric key listed here cascades from tier to tier. Keys outside this
//! set are still readable through [`crate::TierCatalog::resolve`], but they are
//! answered from the base section only.
use strum::{AsRefStr, EnumCount, EnumIter, EnumString, IntoStaticStr};

/// Numeric settings that cascade across tiers.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    AsRefStr,
    EnumCount,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SettingKey {
    #[strum(serialize = "baseDamageRandomPercentageModifier")]
    BaseDamageRandomPercentageModifier,
    #[strum(serialize = "health_multiplier")]
    HealthMultiplier,
    #[strum(serialize = "maxSpeed")]
    MaxSpeed,
    #[strum(serialize = "wanderRadius")]
    WanderRadius,
    #[strum(serialize = "viewRange")]
    ViewRange,
    #[strum(serialize = "hearingRange")]
    HearingRange,
    #[strum(serialize = "combatRelativeTurnSpeed")]
    CombatRelativeTurnSpeed,
    #[strum(serialize = "armor_multiplier")]
    ArmorMultiplier,
    #[strum(serialize = "damage_multiplier")]
    DamageMultiplier,
    #[strum(serialize = "damage_multiplier_physical")]
    DamageMultiplierPhysical,
    #[strum(serialize = "damage_multiplier_projectile")]
    DamageMultiplierProjectile,
    #[strum(serialize = "damage_multiplier_command")]
    DamageMultiplierCommand,
    #[strum(serialize = "damage_multiplier_drowning")]
    DamageMultiplierDrowning,
    #[strum(serialize = "damage_multiplier_environment")]
    DamageMultiplierEnvironment,
    #[strum(serialize = "damage_multiplier_fall")]
    DamageMultiplierFall,
    #[strum(serialize = "damage_multiplier_out_of_world")]
    DamageMultiplierOutOfWorld,
    #[strum(serialize = "damage_multiplier_suffocation")]
    DamageMultiplierSuffocation,
    #[strum(serialize = "knockbackResistance")]
    KnockbackResistance,
    #[strum(serialize = "regeneration")]
    Regeneration,
    #[strum(serialize = "drop_rate_multiplier")]
    DropRateMultiplier,
    #[strum(serialize = "drop_quantity_multiplier")]
    DropQuantityMultiplier,
    #[strum(serialize = "drop_quality_multiplier")]
    DropQualityMultiplier,
    #[strum(serialize = "xp_multiplier")]
    XpMultiplier,
    #[strum(serialize = "cash_multiplier")]
    CashMultiplier,
    #[strum(serialize = "spawn_count_multiplier")]
    SpawnCountMultiplier,
    #[strum(serialize = "elite_mobs_chance_multiplier")]
    EliteMobsChanceMultiplier,
    #[strum(serialize = "elite_mobs_chance_uncommon")]
    EliteMobsChanceUncommon,
    #[strum(serialize = "elite_mobs_chance_rare")]
    EliteMobsChanceRare,
    #[strum(serialize = "elite_mobs_chance_legendary")]
    EliteMobsChanceLegendary,
    #[strum(serialize = "elite_spawn_multiplier")]
    EliteSpawnMultiplier,
}

impl SettingKey {
    /// Stable position of this key inside dense per-tier value tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Base value used when no document sets the key.
    ///
    /// Multipliers are neutral at 1.0. Explicit elite chances are absent (0.0)
    /// so the collaborator's own odds apply unless a tier configures them.
    pub const fn default_value(self) -> f64 {
        match self {
            SettingKey::EliteMobsChanceUncommon
            | SettingKey::EliteMobsChanceRare
            | SettingKey::EliteMobsChanceLegendary
            | SettingKey::EliteSpawnMultiplier => 0.0,
            _ => 1.0,
        }
    }

    /// Parses a document key, returning `None` for unrecognized keys.
    pub fn parse(key: &str) -> Option<Self> {
        key.parse().ok()
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Boolean per-tier flags. They cascade exactly like numeric keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, EnumIter, EnumString, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlagKey {
    #[strum(serialize = "is_allowed")]
    IsAllowed,
    #[strum(serialize = "is_hidden")]
    IsHidden,
}

impl FlagKey {
    pub const fn default_value(self) -> bool {
        match self {
            FlagKey::IsAllowed => true,
            FlagKey::IsHidden => false,
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        key.parse().ok()
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Source of incoming damage, used to select a per-cause multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum DamageCause {
    Physical,
    Projectile,
    Command,
    Drowning,
    Environment,
    Fall,
    OutOfWorld,
    Suffocation,
}

impl DamageCause {
    /// Setting consulted before falling back to [`SettingKey::DamageMultiplier`].
    pub const fn setting_key(self) -> SettingKey {
        match self {
            DamageCause::Physical => SettingKey::DamageMultiplierPhysical,
            DamageCause::Projectile => SettingKey::DamageMultiplierProjectile,
            DamageCause::Command => SettingKey::DamageMultiplierCommand,
            DamageCause::Drowning => SettingKey::DamageMultiplierDrowning,
            DamageCause::Environment => SettingKey::DamageMultiplierEnvironment,
            DamageCause::Fall => SettingKey::DamageMultiplierFall,
            DamageCause::OutOfWorld => SettingKey::DamageMultiplierOutOfWorld,
            DamageCause::Suffocation => SettingKey::DamageMultiplierSuffocation,
        }
    }
}
