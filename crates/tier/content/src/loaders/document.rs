//! Typed extraction from a merged configuration tree.
//!
//! The tree has three sections: `base` (global scalars, nested option groups
//! and the cascade root), `meta.<tier>` and `tiers.<tier>`. Wrongly typed
//! values fall back to their defaults rather than failing the load.
use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Map, Value};
use strum::IntoEnumIterator;
use tier_core::{
    BaseSettings, DamageCause, EliteQueueConfig, FlagKey, MetaSpec, SettingKey, SettingsOverrides,
    TierCatalog, TierConfig, TierSpec, WorldTierMode,
};
use tracing::warn;

pub const SECTION_BASE: &str = "base";
pub const SECTION_META: &str = "meta";
pub const SECTION_TIERS: &str = "tiers";

/// Read-only view over an optional JSON object.
#[derive(Clone, Copy)]
struct Section<'a>(Option<&'a Map<String, Value>>);

impl<'a> Section<'a> {
    fn child(self, name: &str) -> Section<'a> {
        Section(self.0.and_then(|map| map.get(name)).and_then(Value::as_object))
    }

    fn f64(self, name: &str, default: f64) -> f64 {
        self.0
            .and_then(|map| map.get(name))
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    fn i64(self, name: &str, default: i64) -> i64 {
        self.0
            .and_then(|map| map.get(name))
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .unwrap_or(default)
    }

    fn bool(self, name: &str, default: bool) -> bool {
        self.0
            .and_then(|map| map.get(name))
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    fn string(self, name: &str, default: &str) -> String {
        self.0
            .and_then(|map| map.get(name))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(default)
            .to_string()
    }

    fn millis(self, name: &str, default_ms: u64) -> Duration {
        let ms = self.f64(name, default_ms as f64);
        Duration::from_millis(if ms > 0.0 { ms as u64 } else { 0 })
    }
}

/// Builds the typed global configuration from the `base` section.
pub fn extract_config(root: &Map<String, Value>) -> TierConfig {
    let base = Section(root.get(SECTION_BASE).and_then(Value::as_object));
    let allow = base.child("allow");
    let defaults = TierConfig::default();
    let mut config = TierConfig::default();

    let players = &mut config.players;
    players.default_tier = base.string("defaultDifficulty", &defaults.players.default_tier);
    players.allow_change = allow.bool("difficultyChange", defaults.players.allow_change);
    players.allow_change_in_combat =
        allow.bool("difficultyChangeInCombat", defaults.players.allow_change_in_combat);
    players.change_cooldown = base.millis(
        "difficultyChangeCooldownMs",
        defaults.players.change_cooldown.as_millis() as u64,
    );
    players.combat_timeout = base.millis(
        "difficultyChangeCombatTimeoutMs",
        defaults.players.combat_timeout.as_millis() as u64,
    );
    players.tier_values_as_percent =
        base.bool("uiTierValuesAsPercent", defaults.players.tier_values_as_percent);

    let health = &mut config.health;
    health.enabled = allow.bool("healthModifier", defaults.health.enabled);
    health.tolerance = base.f64("healthScalingTolerance", defaults.health.tolerance);
    health.min_factor = base.f64("minHealthScalingFactor", defaults.health.min_factor);
    health.max_factor = base.f64("maxHealthScalingFactor", defaults.health.max_factor);

    let damage = &mut config.damage;
    damage.enabled = allow.bool("damageModifier", defaults.damage.enabled);
    damage.armor_enabled = allow.bool("armorModifier", defaults.damage.armor_enabled);
    damage.min_damage_factor = base.f64("minDamageFactor", defaults.damage.min_damage_factor);
    for cause in DamageCause::iter() {
        damage.set_cause_enabled(cause, allow.bool(cause_allow_key(cause), true));
    }

    config.drops.enabled = allow.bool("dropModifier", defaults.drops.enabled);
    config.spawn_count.enabled = allow.bool("spawnCountMultiplier", defaults.spawn_count.enabled);

    let rewards = &mut config.rewards;
    rewards.cash_variance = base.f64("cashVarianceFactor", defaults.rewards.cash_variance);
    let tier_reward = &mut rewards.spawn_tier_reward;
    tier_reward.enabled = allow.bool("spawnTierReward", tier_reward.enabled);
    tier_reward.over_factor = base.f64("spawnTierRewardOverFactor", tier_reward.over_factor);
    tier_reward.under_factor = base.f64("spawnTierRewardUnderFactor", tier_reward.under_factor);

    let integrations = base.child("integrationMultipliers");
    let im = &mut rewards.integration_multipliers;
    im.leveling = integrations.f64("levelingCore", im.leveling);
    im.economy = integrations.f64("ecotale", im.economy);

    let leveling = base.child("customLeveling");
    let lv = &mut rewards.leveling;
    lv.enabled = allow.bool("customLeveling", lv.enabled);
    lv.use_most_damage_attacker = leveling.bool("useMostDamageAttacker", lv.use_most_damage_attacker);
    lv.most_damage_multiplier =
        leveling.f64("mostDamageAttackerMultiplier", lv.most_damage_multiplier);
    lv.other_attacker_multiplier =
        leveling.f64("otherAttackerMultiplier", lv.other_attacker_multiplier);
    lv.reward_most_damage_attacker =
        leveling.bool("rewardMostDamageAttacker", lv.reward_most_damage_attacker);
    lv.include_range = leveling.bool("includeRange", lv.include_range);
    lv.include_default_stats = leveling.bool("includeDefaultEntityStats", lv.include_default_stats);
    lv.include_scaled_damage = leveling.bool("includeScaledDamage", lv.include_scaled_damage);
    lv.scaled_damage_factor = leveling.f64("scaledDamageFactor", lv.scaled_damage_factor);
    lv.mana_multiplier = leveling.f64("statsManaMultiplier", lv.mana_multiplier);
    lv.ammo_multiplier = leveling.f64("statsAmmoMultiplier", lv.ammo_multiplier);
    lv.signature_multiplier =
        leveling.f64("statsSignatureEnergyMultiplier", lv.signature_multiplier);
    lv.use_attitude_multiplier = leveling.bool("useAttitudeMultiplier", lv.use_attitude_multiplier);

    let attitude = leveling.child("attitude");
    let bands = &mut lv.attitude;
    bands.revered_score = attitude.f64("playerReveredScore", bands.revered_score);
    bands.friendly_score = attitude.f64("playerFriendlyNeutralIgnoreScore", bands.friendly_score);
    bands.hostile_score = attitude.f64("playerHostileScore", bands.hostile_score);
    bands.npc_hostile_bonus = attitude.f64("npcHostileBonus", bands.npc_hostile_bonus);
    bands.threshold_low = attitude.f64("thresholdLow", bands.threshold_low);
    bands.threshold_mid = attitude.f64("thresholdMid", bands.threshold_mid);
    bands.threshold_high = attitude.f64("thresholdHigh", bands.threshold_high);
    bands.multiplier_low = attitude.f64("multiplierLow", bands.multiplier_low);
    bands.multiplier_mid = attitude.f64("multiplierMid", bands.multiplier_mid);
    bands.multiplier_high = attitude.f64("multiplierHigh", bands.multiplier_high);

    let downscale = leveling.child("downscale");
    let curve = &mut lv.downscale;
    curve.base = downscale.f64("base", curve.base);
    curve.level_exponent = downscale.f64("levelExponent", curve.level_exponent);
    curve.level_multiplier = downscale.f64("levelMultiplier", curve.level_multiplier);

    let elite = &mut config.elite;
    elite.enabled = allow.bool("eliteSpawn", elite.enabled);
    elite.integration_enabled = base.child("integrations").bool("eliteMobs", elite.integration_enabled);
    let queue = base.child("eliteSpawnQueue");
    elite.queue = EliteQueueConfig::from_raw(
        queue.i64("intervalMs", EliteQueueConfig::DEFAULT_INTERVAL_MS),
        queue.i64("maxPerDrain", EliteQueueConfig::DEFAULT_MAX_PER_DRAIN),
        queue.i64("maxDrainMs", EliteQueueConfig::DEFAULT_MAX_DRAIN_MS),
    );

    let world = base.child("worldTier");
    let wt = &mut config.world;
    wt.enabled = world.bool("enabled", wt.enabled);
    let raw_mode = world.string("mode", wt.mode.as_str());
    wt.mode = WorldTierMode::parse(&raw_mode).unwrap_or_else(|err| {
        warn!(target: "tier::config", error = %err, "Falling back to fixed world tier mode");
        WorldTierMode::Fixed
    });
    wt.fixed_tier = world.string("fixedTier", &wt.fixed_tier);
    wt.scaled_factor = world.f64("scaledFactor", wt.scaled_factor);
    wt.scaled_use_all_online_players =
        world.bool("scaledUseAllOnlinePlayers", wt.scaled_use_all_online_players);

    config
}

/// `base.allow` switch for one damage cause.
pub(crate) fn cause_allow_key(cause: DamageCause) -> &'static str {
    match cause {
        DamageCause::Physical => "damagePhysical",
        DamageCause::Projectile => "damageProjectile",
        DamageCause::Command => "damageCommand",
        DamageCause::Drowning => "damageDrowning",
        DamageCause::Environment => "damageEnvironment",
        DamageCause::Fall => "damageFall",
        DamageCause::OutOfWorld => "damageOutOfWorld",
        DamageCause::Suffocation => "damageSuffocation",
    }
}

/// Builds the cascading catalog from `base`, `tiers` (document order) and `meta`.
pub fn build_catalog(root: &Map<String, Value>) -> TierCatalog {
    let base_section = root.get(SECTION_BASE).and_then(Value::as_object);
    let (base_overrides, extras) = match base_section {
        Some(section) => read_base(section),
        None => (SettingsOverrides::new(), BTreeMap::new()),
    };
    let base = BaseSettings::new(&base_overrides, extras);

    let meta = root.get(SECTION_META).and_then(Value::as_object);
    let specs = root
        .get(SECTION_TIERS)
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|tiers| tiers.iter())
        .filter_map(|(id, section)| {
            let Some(section) = section.as_object() else {
                warn!(target: "tier::config", tier = %id, "Skipping non-object tier section");
                return None;
            };
            let mut spec = TierSpec::new(id.clone()).with_overrides(read_overrides(section));
            if let Some(meta) = meta.and_then(|m| m.get(id)) {
                spec.meta = read_meta(id, meta);
            }
            Some(spec)
        });

    TierCatalog::build(base, specs)
}

/// Recognized numeric keys and flags written by one tier section.
pub fn read_overrides(section: &Map<String, Value>) -> SettingsOverrides {
    let mut overrides = SettingsOverrides::new();
    for (key, value) in section {
        if let Some(setting) = SettingKey::parse(key) {
            match value.as_f64().filter(|v| v.is_finite()) {
                Some(v) => {
                    overrides.set(setting, v);
                }
                None => {
                    warn!(target: "tier::config", key = %key, "Ignoring non-numeric tier setting")
                }
            }
        } else if let Some(flag) = FlagKey::parse(key)
            && let Some(v) = value.as_bool()
        {
            overrides.set_flag(flag, v);
        }
    }
    overrides
}

/// Base section: recognized keys seed the cascade, other numeric scalars become fallbacks.
fn read_base(section: &Map<String, Value>) -> (SettingsOverrides, BTreeMap<String, f64>) {
    let overrides = read_overrides(section);
    let extras = section
        .iter()
        .filter(|(key, _)| SettingKey::parse(key).is_none())
        .filter_map(|(key, value)| value.as_f64().map(|v| (key.clone(), v)))
        .collect();
    (overrides, extras)
}

fn read_meta(id: &str, value: &Value) -> Option<MetaSpec> {
    match serde_json::from_value::<MetaSpec>(value.clone()) {
        Ok(meta) => Some(meta),
        Err(err) => {
            warn!(target: "tier::config", tier = %id, error = %err, "Ignoring malformed tier metadata");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test documents are objects"),
        }
    }

    #[test]
    fn tiers_keep_document_order_and_cascade() {
        let root = object(json!({
            "base": { "health_multiplier": 1.0, "customBonus": 7.0 },
            "tiers": {
                "zeta": { "health_multiplier": 2.0 },
                "alpha": { "armor_multiplier": 0.5, "is_hidden": true },
                "mid": {}
            },
            "meta": { "alpha": { "displayName": "Alpha" } }
        }));

        let catalog = build_catalog(&root);

        let ids: Vec<_> = catalog.ids().collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
        assert_eq!(catalog.value("mid", SettingKey::HealthMultiplier), 2.0);
        assert_eq!(catalog.value("mid", SettingKey::ArmorMultiplier), 0.5);
        assert!(catalog.flag("mid", FlagKey::IsHidden));
        assert_eq!(catalog.resolve("mid", "customBonus"), 7.0);
        assert_eq!(catalog.get("alpha").map(|t| t.meta().display_name.as_str()), Some("Alpha"));
        assert_eq!(catalog.get("zeta").map(|t| t.meta().display_name.as_str()), Some("zeta"));
    }

    #[test]
    fn config_reads_nested_groups() {
        let root = object(json!({
            "base": {
                "defaultDifficulty": "hard",
                "minDamageFactor": 0.01,
                "allow": { "difficultyChange": false, "damageFall": false },
                "customLeveling": {
                    "otherAttackerMultiplier": 0.25,
                    "downscale": { "base": 20 }
                },
                "eliteSpawnQueue": { "intervalMs": 50, "maxPerDrain": 0 },
                "worldTier": { "enabled": true, "mode": "SCALED", "scaledFactor": 0.75 }
            }
        }));

        let config = extract_config(&root);

        assert_eq!(config.players.default_tier, "hard");
        assert!(!config.players.allow_change);
        assert_eq!(config.damage.min_damage_factor, 0.01);
        assert!(!config.damage.cause_enabled(DamageCause::Fall));
        assert!(config.damage.cause_enabled(DamageCause::Physical));
        assert_eq!(config.rewards.leveling.other_attacker_multiplier, 0.25);
        assert_eq!(config.rewards.leveling.downscale.base, 20.0);
        assert_eq!(config.rewards.leveling.downscale.level_exponent, 0.75);
        assert_eq!(config.elite.queue.interval, Some(Duration::from_millis(50)));
        assert_eq!(config.elite.queue.max_per_drain, None);
        assert!(config.world.enabled);
        assert_eq!(config.world.mode, WorldTierMode::Scaled);
        assert_eq!(config.world.scaled_factor, 0.75);
    }

    #[test]
    fn missing_sections_yield_defaults() {
        let config = extract_config(&Map::new());
        assert_eq!(config, TierConfig::default());
        assert!(build_catalog(&Map::new()).is_empty());
    }

    #[test]
    fn unknown_world_mode_falls_back_to_fixed() {
        let root = object(json!({ "base": { "worldTier": { "mode": "median" } } }));
        assert_eq!(extract_config(&root).world.mode, WorldTierMode::Fixed);
    }

    #[test]
    fn wrongly_typed_values_are_ignored() {
        let root = object(json!({
            "base": { "minDamageFactor": "lots" },
            "tiers": { "easy": { "damage_multiplier": "high", "is_allowed": "no" } }
        }));
        let catalog = build_catalog(&root);

        assert_eq!(extract_config(&root).damage.min_damage_factor, 0.001);
        assert_eq!(catalog.value("easy", SettingKey::DamageMultiplier), 1.0);
        assert!(catalog.flag("easy", FlagKey::IsAllowed));
    }
}
