//! Elite roll with a scoped override of the roller's shared chances.
//!
//! The roller owns its chance table. To roll with tier-specific odds the table
//! is overwritten, the roll performed, and the original table written back.
//! [`ChanceOverrideGuard`] performs the write-back on drop, so an error or a
//! panic inside the roll still restores the original chances.
use thiserror::Error;

use crate::catalog::TierCatalog;
use crate::keys::SettingKey;

/// Opaque handle to a spawned entity, supplied by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityRef(pub u64);

/// Per-rarity upgrade probabilities.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EliteChances {
    pub uncommon: f64,
    pub rare: f64,
    pub legendary: f64,
}

impl EliteChances {
    pub const fn new(uncommon: f64, rare: f64, legendary: f64) -> Self {
        Self {
            uncommon,
            rare,
            legendary,
        }
    }

    /// Reads the tier's explicit chances. Uncommon adds `elite_spawn_multiplier`.
    pub fn for_tier(catalog: &TierCatalog, tier_id: &str) -> Self {
        let settings = catalog.settings_for(tier_id);
        Self {
            uncommon: settings.get(SettingKey::EliteSpawnMultiplier)
                + settings.get(SettingKey::EliteMobsChanceUncommon),
            rare: settings.get(SettingKey::EliteMobsChanceRare),
            legendary: settings.get(SettingKey::EliteMobsChanceLegendary),
        }
    }

    /// Every chance sanitized: non-finite or non-positive reads as zero.
    pub fn sanitized(self) -> Self {
        Self {
            uncommon: sanitize_chance(self.uncommon),
            rare: sanitize_chance(self.rare),
            legendary: sanitize_chance(self.legendary),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.uncommon <= 0.0 && self.rare <= 0.0 && self.legendary <= 0.0
    }

    pub fn scaled(self, multiplier: f64) -> Self {
        Self {
            uncommon: self.uncommon * multiplier,
            rare: self.rare * multiplier,
            legendary: self.legendary * multiplier,
        }
    }

    pub fn clamped(self) -> Self {
        Self {
            uncommon: clamp01(self.uncommon),
            rare: clamp01(self.rare),
            legendary: clamp01(self.legendary),
        }
    }
}

/// Non-finite or negative reads as 0.
pub fn sanitize_chance(chance: f64) -> f64 {
    if chance.is_finite() && chance > 0.0 { chance } else { 0.0 }
}

/// Non-finite reads as neutral 1, negative as 0.
pub fn sanitize_chance_multiplier(multiplier: f64) -> f64 {
    if !multiplier.is_finite() {
        1.0
    } else {
        multiplier.max(0.0)
    }
}

fn clamp01(value: f64) -> f64 {
    if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 }
}

/// Chances the roll should use.
///
/// Explicit chances all zero: scale the roller's current chances. Otherwise
/// scale the explicit ones. Either way each value is clamped into `[0, 1]`.
pub fn effective_chances(current: EliteChances, explicit: EliteChances, multiplier: f64) -> EliteChances {
    let multiplier = sanitize_chance_multiplier(multiplier);
    let explicit = explicit.sanitized();
    let source = if explicit.is_zero() { current } else { explicit };
    source.scaled(multiplier).clamped()
}

#[derive(Debug, Error)]
pub enum RollError {
    #[error("elite roller is unavailable")]
    Unavailable,

    #[error("elite roll for entity {entity:?} failed: {reason}")]
    Failed { entity: EntityRef, reason: String },
}

/// Narrow interface onto the component that performs elite upgrades.
pub trait EliteRollBridge: Send + Sync {
    fn chances(&self) -> EliteChances;

    fn set_chances(&self, chances: EliteChances);

    /// Rolls for `entity` using the current chances. `Ok(true)` when upgraded.
    fn try_roll(&self, entity: EntityRef) -> Result<bool, RollError>;
}

/// Restores the bridge's original chances when dropped.
pub struct ChanceOverrideGuard<'a, B: EliteRollBridge + ?Sized> {
    bridge: &'a B,
    original: EliteChances,
}

impl<'a, B: EliteRollBridge + ?Sized> ChanceOverrideGuard<'a, B> {
    /// Captures the current chances and installs `chances`.
    pub fn install(bridge: &'a B, chances: EliteChances) -> Self {
        let original = bridge.chances();
        bridge.set_chances(chances);
        Self { bridge, original }
    }

    pub fn original(&self) -> EliteChances {
        self.original
    }
}

impl<B: EliteRollBridge + ?Sized> Drop for ChanceOverrideGuard<'_, B> {
    fn drop(&mut self) {
        self.bridge.set_chances(self.original);
    }
}

/// Result of one guarded roll.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RollOutcome {
    pub applied: EliteChances,
    pub upgraded: bool,
}

/// Mutate, roll, restore.
pub fn roll_with_override<B: EliteRollBridge + ?Sized>(
    bridge: &B,
    entity: EntityRef,
    explicit: EliteChances,
    multiplier: f64,
) -> Result<RollOutcome, RollError> {
    let applied = effective_chances(bridge.chances(), explicit, multiplier);
    let _guard = ChanceOverrideGuard::install(bridge, applied);
    let upgraded = bridge.try_roll(entity)?;
    Ok(RollOutcome { applied, upgraded })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Roller {
        chances: Mutex<EliteChances>,
        seen: Mutex<Vec<EliteChances>>,
        fail: bool,
    }

    impl Roller {
        fn new(chances: EliteChances, fail: bool) -> Self {
            Self {
                chances: Mutex::new(chances),
                seen: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    impl EliteRollBridge for Roller {
        fn chances(&self) -> EliteChances {
            *self.chances.lock().unwrap()
        }

        fn set_chances(&self, chances: EliteChances) {
            *self.chances.lock().unwrap() = chances;
        }

        fn try_roll(&self, entity: EntityRef) -> Result<bool, RollError> {
            self.seen.lock().unwrap().push(self.chances());
            if self.fail {
                Err(RollError::Failed {
                    entity,
                    reason: "boom".into(),
                })
            } else {
                Ok(true)
            }
        }
    }

    const ORIGINAL: EliteChances = EliteChances::new(0.1, 0.05, 0.01);

    #[test]
    fn zero_explicit_scales_current_chances() {
        let applied = effective_chances(ORIGINAL, EliteChances::default(), 2.0);
        assert_eq!(applied, EliteChances::new(0.2, 0.1, 0.02));
    }

    #[test]
    fn explicit_chances_are_scaled_and_clamped() {
        let applied = effective_chances(ORIGINAL, EliteChances::new(0.6, f64::NAN, -1.0), 2.0);
        assert_eq!(applied, EliteChances::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn multiplier_is_sanitized() {
        assert_eq!(sanitize_chance_multiplier(f64::NAN), 1.0);
        assert_eq!(sanitize_chance_multiplier(-2.0), 0.0);
        assert_eq!(
            effective_chances(ORIGINAL, EliteChances::default(), f64::INFINITY),
            ORIGINAL
        );
    }

    #[test]
    fn roll_sees_override_and_restores() {
        let roller = Roller::new(ORIGINAL, false);
        let outcome =
            roll_with_override(&roller, EntityRef(1), EliteChances::new(0.3, 0.2, 0.1), 1.0)
                .unwrap();

        assert!(outcome.upgraded);
        assert_eq!(roller.seen.lock().unwrap()[0], EliteChances::new(0.3, 0.2, 0.1));
        assert_eq!(roller.chances(), ORIGINAL);
    }

    #[test]
    fn failed_roll_still_restores() {
        let roller = Roller::new(ORIGINAL, true);
        let result = roll_with_override(&roller, EntityRef(9), EliteChances::new(0.5, 0.0, 0.0), 1.0);

        assert!(matches!(result, Err(RollError::Failed { .. })));
        assert_eq!(roller.chances(), ORIGINAL);
    }

    #[test]
    fn uncommon_includes_spawn_multiplier() {
        use crate::catalog::TierSpec;
        use crate::settings::{BaseSettings, SettingsOverrides};

        let catalog = TierCatalog::build(
            BaseSettings::default(),
            [TierSpec::new("elite").with_overrides(
                SettingsOverrides::new()
                    .with(SettingKey::EliteSpawnMultiplier, 0.05)
                    .with(SettingKey::EliteMobsChanceUncommon, 0.1)
                    .with(SettingKey::EliteMobsChanceRare, 0.08),
            )],
        );
        let chances = EliteChances::for_tier(&catalog, "elite");
        assert!((chances.uncommon - 0.15).abs() < 1e-12);
        assert_eq!(chances.rare, 0.08);
        assert_eq!(chances.legendary, 0.0);
    }
}
