//! First-run defaults and legacy document migration.
use std::collections::HashSet;

use serde_json::{Map, Value, json};
use strum::IntoEnumIterator;
use tier_core::{DamageCause, EliteQueueConfig, FlagKey, SettingKey, TierConfig};
use tracing::{info, warn};

use super::document::{SECTION_BASE, SECTION_META, SECTION_TIERS, cause_allow_key};
use super::dropins::DropInLoader;
use super::{read_object, write_json};
use crate::error::Result;
use crate::paths::ConfigPaths;

const NAMED_TIERS: [&str; 10] = [
    "very easy",
    "easy",
    "normal",
    "challenging",
    "hard",
    "expert",
    "elite",
    "nightmare",
    "mythic",
    "ascendant",
];

const ASCENDANT_STEPS: usize = 20;

/// Ids of the synthesized tiers, easiest first.
pub fn default_tier_ids() -> Vec<String> {
    NAMED_TIERS
        .iter()
        .map(|id| id.to_string())
        .chain((1..=ASCENDANT_STEPS).map(|n| format!("ascendant {}", roman(n))))
        .collect()
}

fn roman(mut n: usize) -> String {
    const NUMERALS: [(usize, &str); 9] = [
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

/// The `base` section with every recognized key and option group at its default.
pub fn default_base() -> Value {
    let config = TierConfig::default();
    let mut base = Map::new();

    // Per-cause damage keys stay unset so they inherit `damage_multiplier`.
    let per_cause: Vec<SettingKey> = DamageCause::iter().map(DamageCause::setting_key).collect();
    for key in SettingKey::iter().filter(|key| !per_cause.contains(key)) {
        base.insert(key.as_str().to_string(), json!(key.default_value()));
    }
    for flag in FlagKey::iter() {
        base.insert(flag.as_str().to_string(), json!(flag.default_value()));
    }

    let players = &config.players;
    let health = &config.health;
    let damage = &config.damage;
    let rewards = &config.rewards;
    let leveling = &rewards.leveling;
    let attitude = &leveling.attitude;
    let downscale = &leveling.downscale;
    let world = &config.world;

    let mut allow = Map::new();
    allow.insert("difficultyChange".into(), json!(players.allow_change));
    allow.insert(
        "difficultyChangeInCombat".into(),
        json!(players.allow_change_in_combat),
    );
    allow.insert("healthModifier".into(), json!(health.enabled));
    allow.insert("damageModifier".into(), json!(damage.enabled));
    allow.insert("armorModifier".into(), json!(damage.armor_enabled));
    allow.insert("dropModifier".into(), json!(config.drops.enabled));
    allow.insert("spawnCountMultiplier".into(), json!(config.spawn_count.enabled));
    allow.insert(
        "spawnTierReward".into(),
        json!(rewards.spawn_tier_reward.enabled),
    );
    allow.insert("customLeveling".into(), json!(leveling.enabled));
    allow.insert("eliteSpawn".into(), json!(config.elite.enabled));
    for cause in DamageCause::iter() {
        allow.insert(cause_allow_key(cause).into(), json!(damage.cause_enabled(cause)));
    }

    let entries = [
        ("defaultDifficulty", json!(players.default_tier)),
        ("uiTierValuesAsPercent", json!(players.tier_values_as_percent)),
        (
            "difficultyChangeCooldownMs",
            json!(players.change_cooldown.as_millis() as u64),
        ),
        (
            "difficultyChangeCombatTimeoutMs",
            json!(players.combat_timeout.as_millis() as u64),
        ),
        ("minDamageFactor", json!(damage.min_damage_factor)),
        ("healthScalingTolerance", json!(health.tolerance)),
        ("minHealthScalingFactor", json!(health.min_factor)),
        ("maxHealthScalingFactor", json!(health.max_factor)),
        ("cashVarianceFactor", json!(rewards.cash_variance)),
        (
            "spawnTierRewardOverFactor",
            json!(rewards.spawn_tier_reward.over_factor),
        ),
        (
            "spawnTierRewardUnderFactor",
            json!(rewards.spawn_tier_reward.under_factor),
        ),
        ("allow", Value::Object(allow)),
        (
            "customLeveling",
            json!({
                "useMostDamageAttacker": leveling.use_most_damage_attacker,
                "mostDamageAttackerMultiplier": leveling.most_damage_multiplier,
                "otherAttackerMultiplier": leveling.other_attacker_multiplier,
                "rewardMostDamageAttacker": leveling.reward_most_damage_attacker,
                "includeRange": leveling.include_range,
                "includeDefaultEntityStats": leveling.include_default_stats,
                "includeScaledDamage": leveling.include_scaled_damage,
                "scaledDamageFactor": leveling.scaled_damage_factor,
                "statsManaMultiplier": leveling.mana_multiplier,
                "statsAmmoMultiplier": leveling.ammo_multiplier,
                "statsSignatureEnergyMultiplier": leveling.signature_multiplier,
                "useAttitudeMultiplier": leveling.use_attitude_multiplier,
                "attitude": {
                    "playerReveredScore": attitude.revered_score,
                    "playerFriendlyNeutralIgnoreScore": attitude.friendly_score,
                    "playerHostileScore": attitude.hostile_score,
                    "npcHostileBonus": attitude.npc_hostile_bonus,
                    "thresholdLow": attitude.threshold_low,
                    "thresholdMid": attitude.threshold_mid,
                    "thresholdHigh": attitude.threshold_high,
                    "multiplierLow": attitude.multiplier_low,
                    "multiplierMid": attitude.multiplier_mid,
                    "multiplierHigh": attitude.multiplier_high,
                },
                "downscale": {
                    "base": downscale.base,
                    "levelExponent": downscale.level_exponent,
                    "levelMultiplier": downscale.level_multiplier,
                },
            }),
        ),
        (
            "integrations",
            json!({ "eliteMobs": config.elite.integration_enabled }),
        ),
        (
            "integrationMultipliers",
            json!({
                "levelingCore": rewards.integration_multipliers.leveling,
                "ecotale": rewards.integration_multipliers.economy,
            }),
        ),
        (
            "eliteSpawnQueue",
            json!({
                "intervalMs": EliteQueueConfig::DEFAULT_INTERVAL_MS,
                "maxPerDrain": EliteQueueConfig::DEFAULT_MAX_PER_DRAIN,
                "maxDrainMs": EliteQueueConfig::DEFAULT_MAX_DRAIN_MS,
            }),
        ),
        (
            "worldTier",
            json!({
                "enabled": world.enabled,
                "mode": world.mode.as_str(),
                "fixedTier": world.fixed_tier,
                "scaledFactor": world.scaled_factor,
                "scaledUseAllOnlinePlayers": world.scaled_use_all_online_players,
            }),
        ),
    ];
    for (key, value) in entries {
        base.insert(key.to_string(), value);
    }

    Value::Object(base)
}

fn default_tier_section() -> Value {
    let flags = FlagKey::iter()
        .map(|flag| (flag.as_str().to_string(), json!(flag.default_value())))
        .collect();
    Value::Object(flags)
}

/// Full in-memory document: defaults for `base` plus the synthesized tiers.
pub fn default_document() -> Map<String, Value> {
    let mut tiers = Map::new();
    for id in default_tier_ids() {
        tiers.insert(id, default_tier_section());
    }
    let mut root = Map::new();
    root.insert(SECTION_BASE.to_string(), default_base());
    root.insert(SECTION_META.to_string(), Value::Object(Map::new()));
    root.insert(SECTION_TIERS.to_string(), Value::Object(tiers));
    root
}

/// Drop-in file name for a tier: its id reduced to `[a-z0-9_-]`, or `difficulty_NN.json`.
pub fn fragment_file_name(id: &str, position: usize) -> String {
    let sanitized: String = id
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    let sanitized = sanitized.trim_matches('_');
    if sanitized.is_empty() {
        format!("difficulty_{:02}.json", position)
    } else {
        format!("{sanitized}.json")
    }
}

/// Writes one drop-in per tier, ordered by position.
///
/// Ids that sanitize to a taken name get a `_NN` position suffix.
pub fn write_fragments(
    paths: &ConfigPaths,
    tiers: &Map<String, Value>,
    meta: Option<&Map<String, Value>>,
) -> Result<usize> {
    let mut used = HashSet::new();
    let mut written = 0;
    for (position, (id, section)) in tiers.iter().enumerate() {
        let mut fragment = Map::new();
        fragment.insert("id".into(), json!(id));
        fragment.insert("order".into(), json!(position));
        if let Some(m) = meta.and_then(|m| m.get(id)) {
            fragment.insert("meta".into(), m.clone());
        }
        fragment.insert("tier".into(), section.clone());

        let mut name = fragment_file_name(id, position);
        if used.contains(&name) {
            let stem = name.trim_end_matches(".json").to_string();
            let mut attempt = position;
            loop {
                name = format!("{stem}_{attempt:02}.json");
                if !used.contains(&name) {
                    break;
                }
                attempt += 1;
            }
            warn!(target: "tier::config", tier = %id, file = %name, "Drop-in name collision; renamed fragment");
        }
        used.insert(name.clone());
        let path = paths.drop_in_dir.join(name);
        write_json(&path, &Value::Object(fragment))?;
        written += 1;
    }
    Ok(written)
}

/// Ensures a usable document set on disk.
///
/// A missing base file is written from defaults (without `meta`/`tiers`) and
/// every default tier becomes a drop-in. A base file that still carries root
/// `tiers` while the drop-in directory is empty is migrated into drop-ins; the
/// base file itself is left as is.
pub fn bootstrap(paths: &ConfigPaths) -> Result<()> {
    let loader = DropInLoader::new(&paths.drop_in_dir);

    if !paths.base_file.exists() {
        let mut base = Map::new();
        base.insert(SECTION_BASE.to_string(), default_base());
        write_json(&paths.base_file, &Value::Object(base))?;

        if loader.fragment_files()?.is_empty() {
            let document = default_document();
            let tiers = document
                .get(SECTION_TIERS)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            let written = write_fragments(paths, &tiers, None)?;
            info!(target: "tier::config", tiers = written, root = %paths.root.display(), "Wrote default configuration");
        }
        return Ok(());
    }

    if !loader.fragment_files()?.is_empty() {
        return Ok(());
    }

    let root = match read_object(&paths.base_file) {
        Ok(root) => root,
        Err(err) => {
            warn!(target: "tier::config", error = %err, "Skipping drop-in migration");
            return Ok(());
        }
    };
    let Some(tiers) = root.get(SECTION_TIERS).and_then(Value::as_object) else {
        return Ok(());
    };
    if tiers.is_empty() {
        return Ok(());
    }
    let meta = root.get(SECTION_META).and_then(Value::as_object);
    let written = write_fragments(paths, tiers, meta)?;
    info!(target: "tier::config", tiers = written, "Migrated legacy tiers into drop-ins");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::document::{build_catalog, extract_config};

    #[test]
    fn default_ids_follow_named_tiers_then_numerals() {
        let ids = default_tier_ids();
        assert_eq!(ids.len(), 30);
        assert_eq!(ids[0], "very easy");
        assert_eq!(ids[9], "ascendant");
        assert_eq!(ids[10], "ascendant I");
        assert_eq!(ids[13], "ascendant IV");
        assert_eq!(ids[28], "ascendant XIX");
        assert_eq!(ids[29], "ascendant XX");
    }

    #[test]
    fn default_document_round_trips_to_default_config() {
        let document = default_document();
        assert_eq!(extract_config(&document), TierConfig::default());

        let catalog = build_catalog(&document);
        assert_eq!(catalog.len(), 30);
        assert_eq!(catalog.rank("normal"), Some(2));
        assert_eq!(catalog.value("hard", SettingKey::EliteSpawnMultiplier), 0.0);
        assert!(!catalog.is_explicit("hard", SettingKey::DamageMultiplierFall));
        assert!(catalog.is_explicit("hard", SettingKey::DamageMultiplier));
    }

    #[test]
    fn fragment_names_are_sanitized() {
        assert_eq!(fragment_file_name("Very Easy", 0), "very_easy.json");
        assert_eq!(fragment_file_name("ascendant IV", 13), "ascendant_iv.json");
        assert_eq!(fragment_file_name("???", 7), "difficulty_07.json");
    }

    #[test]
    fn colliding_fragment_names_get_a_position_suffix() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = ConfigPaths::under(dir.path());
        let mut tiers = Map::new();
        tiers.insert("Very Easy".into(), json!({ "health_multiplier": 0.25 }));
        tiers.insert("very_easy".into(), json!({ "health_multiplier": 0.5 }));

        assert_eq!(write_fragments(&paths, &tiers, None).unwrap(), 2);

        let first = read_object(&paths.drop_in_dir.join("very_easy.json")).unwrap();
        let second = read_object(&paths.drop_in_dir.join("very_easy_01.json")).unwrap();
        assert_eq!(first["id"], "Very Easy");
        assert_eq!(second["id"], "very_easy");
        assert_eq!(second["order"], 1);
    }
}
