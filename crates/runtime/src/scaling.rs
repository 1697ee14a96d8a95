//! Scaling formulas bound to one configuration snapshot.
//!
//! [`TierScaler`] reads feature switches and tier values from the snapshot it
//! was created from, so a single combat or loot event always sees one
//! consistent configuration even if a reload lands mid-event.

use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use tier_content::LoadedConfig;
use tier_core::scaling::{
    self, Attitude, DropMultipliers, DropStack, EliteChances, EntityRef, HealthOutcome,
    HealthPool, MultiplierResult, RewardFacts, SpawnCountDecision, SpawnOrigin,
};
use tier_core::{DamageCause, SettingKey, TierCatalog, TierConfig};

use crate::workers::SpawnTask;

/// The killed NPC's relationship to the rewarded player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttitudeFacts {
    pub attitude: Attitude,
    /// The NPC was also hostile towards other NPCs.
    pub hostile_to_npcs: bool,
}

/// One player who damaged the killed entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Contributor<K> {
    pub id: K,
    pub damage: f64,
    pub level: u32,
    /// The contributor's own tier.
    pub tier: String,
}

#[derive(Clone)]
pub struct TierScaler {
    snapshot: Arc<LoadedConfig>,
}

impl TierScaler {
    pub fn new(snapshot: Arc<LoadedConfig>) -> Self {
        Self { snapshot }
    }

    pub fn catalog(&self) -> &TierCatalog {
        &self.snapshot.catalog
    }

    pub fn config(&self) -> &TierConfig {
        &self.snapshot.config
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.generation
    }

    /// Damage of `cause` received by an entity under `tier`.
    ///
    /// Returns `base` unchanged when damage scaling or the cause is switched off.
    pub fn scale_received_damage(&self, tier: &str, cause: DamageCause, base: f64) -> f64 {
        let rules = &self.config().damage;
        match scaling::received_damage_multiplier(self.catalog(), rules, tier, cause) {
            Some(multiplier) => {
                scaling::apply_damage_multiplier(base, multiplier, rules.min_damage_factor)
            }
            None => base,
        }
    }

    pub fn scale_armor(&self, tier: &str, base: f64) -> f64 {
        let rules = &self.config().damage;
        if !rules.armor_enabled {
            return base;
        }
        let multiplier = self.catalog().value(tier, SettingKey::ArmorMultiplier);
        if !multiplier.is_finite() {
            return base;
        }
        scaling::apply_armor_multiplier(base, multiplier, rules.min_damage_factor)
    }

    /// Brings the entity's max-health modifier in line with `tier`.
    ///
    /// With health scaling off, any modifier left from an earlier configuration is removed.
    pub fn reconcile_health<P: HealthPool + ?Sized>(&self, tier: &str, pool: &mut P) -> HealthOutcome {
        let health = &self.config().health;
        let factor = if health.enabled {
            self.catalog().value(tier, SettingKey::HealthMultiplier)
        } else {
            1.0
        };
        scaling::reconcile_health(pool, factor, health)
    }

    /// Scale applied when an entity spawned under a different tier than the player's.
    pub fn mismatch_scale(&self, player_tier: &str, spawn_tier: Option<&str>) -> f64 {
        let catalog = self.catalog();
        scaling::spawn_tier_scale(
            spawn_tier.and_then(|id| catalog.rank(id)),
            catalog.rank(player_tier),
            &self.config().rewards.spawn_tier_reward,
        )
    }

    /// Drop multipliers for a kill: values of the spawn tier when known, else
    /// of the player's tier, times the mismatch scale.
    pub fn drop_multipliers(&self, player_tier: &str, spawn_tier: Option<&str>) -> DropMultipliers {
        if !self.config().drops.enabled {
            return DropMultipliers::NEUTRAL;
        }
        let source = spawn_tier.unwrap_or(player_tier);
        let catalog = self.catalog();
        DropMultipliers::scaled(
            catalog.value(source, SettingKey::DropRateMultiplier),
            catalog.value(source, SettingKey::DropQuantityMultiplier),
            catalog.value(source, SettingKey::DropQualityMultiplier),
            self.mismatch_scale(player_tier, spawn_tier),
        )
    }

    pub fn scale_drops<R: Rng + ?Sized>(
        &self,
        player_tier: &str,
        spawn_tier: Option<&str>,
        drops: Vec<DropStack>,
        quality_levels: usize,
        rng: &mut R,
    ) -> Vec<DropStack> {
        if !self.config().drops.enabled {
            return drops;
        }
        let multipliers = self.drop_multipliers(player_tier, spawn_tier);
        scaling::apply_drop_pipeline(drops, multipliers, quality_levels, rng)
    }

    /// Bonus XP for an award granted by the host's leveling system.
    pub fn xp_bonus(&self, tier: &str, amount: u64) -> MultiplierResult {
        scaling::xp_bonus(
            amount,
            self.catalog().value(tier, SettingKey::XpMultiplier),
            self.config().rewards.integration_multipliers.leveling,
            tier,
        )
    }

    /// Bonus cash for a payout granted by the host's economy.
    pub fn cash_bonus<R: Rng + ?Sized>(&self, tier: &str, amount: u64, rng: &mut R) -> MultiplierResult {
        let rewards = &self.config().rewards;
        scaling::cash_bonus(
            amount,
            self.catalog().value(tier, SettingKey::CashMultiplier),
            rewards.cash_variance,
            rewards.integration_multipliers.economy,
            tier,
            rng,
        )
    }

    /// Reward factor for a kill before it is split between attackers.
    pub fn kill_factor(&self, facts: &RewardFacts, attitude: Option<AttitudeFacts>) -> f64 {
        let leveling = &self.config().rewards.leveling;
        let factor = scaling::base_factor(facts, leveling);
        match attitude {
            Some(a) if leveling.use_attitude_multiplier => {
                let score = scaling::attitude_score(a.attitude, a.hostile_to_npcs, &leveling.attitude);
                factor * scaling::attitude_multiplier(score, &leveling.attitude)
            }
            _ => factor,
        }
    }

    /// XP each contributor earns for a kill.
    ///
    /// The kill factor is split by damage, downscaled by each contributor's
    /// level and scaled for spawn-tier mismatch against the contributor's own
    /// tier. Empty when custom leveling is switched off.
    pub fn kill_xp<K: Clone>(
        &self,
        facts: &RewardFacts,
        attitude: Option<AttitudeFacts>,
        spawn_tier: Option<&str>,
        contributors: &[Contributor<K>],
    ) -> Vec<(K, u64)> {
        let leveling = &self.config().rewards.leveling;
        if !leveling.enabled {
            return Vec::new();
        }
        let final_factor = self.kill_factor(facts, attitude);
        let damage: Vec<(usize, f64)> = contributors
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.damage))
            .collect();

        scaling::attacker_shares(final_factor, &damage, leveling)
            .into_iter()
            .map(|(i, share)| {
                let contributor = &contributors[i];
                let xp = scaling::downscaled_xp(share, contributor.level, &leveling.downscale);
                let scale = self.mismatch_scale(&contributor.tier, spawn_tier);
                (contributor.id.clone(), scaling::scale_reward(xp, scale))
            })
            .collect()
    }

    /// What to do with a freshly spawned entity under `tier`.
    pub fn spawn_count<R: Rng + ?Sized>(
        &self,
        tier: &str,
        origin: SpawnOrigin,
        rng: &mut R,
    ) -> SpawnCountDecision {
        if !self.config().spawn_count.enabled {
            return SpawnCountDecision::Untouched;
        }
        let multiplier = self.catalog().value(tier, SettingKey::SpawnCountMultiplier);
        scaling::decide_spawn_count(multiplier, origin, rng)
    }

    pub fn elite_chances(&self, tier: &str) -> EliteChances {
        EliteChances::for_tier(self.catalog(), tier)
    }

    /// Elite roll to enqueue for a spawn, if it qualifies.
    ///
    /// Only natural spawns of non-player entities qualify, and only while the
    /// elite feature and its integration are both enabled.
    pub fn elite_task(
        &self,
        tier: &str,
        entity: EntityRef,
        origin: SpawnOrigin,
        is_player: bool,
        now: Instant,
    ) -> Option<SpawnTask> {
        let elite = &self.config().elite;
        if !elite.enabled || !elite.integration_enabled || is_player {
            return None;
        }
        if origin == SpawnOrigin::Synthetic {
            return None;
        }
        let multiplier = self.catalog().value(tier, SettingKey::EliteMobsChanceMultiplier);
        Some(SpawnTask::new(entity, self.elite_chances(tier), multiplier).enqueued_at(now))
    }
}
