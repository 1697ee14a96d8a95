//! Experience and cash reward formulas.
use rand::Rng;

use crate::config::{AttitudeBands, DownscaleCurve, LevelingConfig, SpawnTierReward};

/// Tolerance under which a reward scale is considered neutral.
const NEUTRAL_EPSILON: f64 = 1e-6;

/// Facts about a killed entity that feed the base reward factor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RewardFacts {
    pub range: f64,
    pub health: f64,
    pub mana: f64,
    pub ammo: f64,
    pub signature_energy: f64,
    /// Damage the entity dealt after tier scaling.
    pub scaled_damage: f64,
}

/// Player's relationship with the killed NPC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attitude {
    Revered,
    /// Friendly, neutral and ignoring share one band.
    Friendly,
    Hostile,
}

/// Sum of the enabled base-factor components.
pub fn base_factor(facts: &RewardFacts, cfg: &LevelingConfig) -> f64 {
    let mut factor = 0.0;
    if cfg.include_range {
        factor += non_negative(facts.range);
    }
    if cfg.include_default_stats {
        factor += non_negative(facts.health)
            + non_negative(facts.mana) * cfg.mana_multiplier
            + non_negative(facts.ammo) * cfg.ammo_multiplier
            + non_negative(facts.signature_energy) * cfg.signature_multiplier;
    }
    if cfg.include_scaled_damage {
        factor += non_negative(facts.scaled_damage) * cfg.scaled_damage_factor;
    }
    factor
}

/// Score for the relationship band, plus a bonus when the NPC also hunts other NPCs.
pub fn attitude_score(attitude: Attitude, hostile_to_npcs: bool, bands: &AttitudeBands) -> f64 {
    let score = match attitude {
        Attitude::Revered => bands.revered_score,
        Attitude::Friendly => bands.friendly_score,
        Attitude::Hostile => bands.hostile_score,
    };
    if hostile_to_npcs {
        score + bands.npc_hostile_bonus
    } else {
        score
    }
}

/// Three-threshold lookup: low, mid, high band, or neutral in between.
pub fn attitude_multiplier(score: f64, bands: &AttitudeBands) -> f64 {
    if score <= bands.threshold_low {
        bands.multiplier_low
    } else if score <= bands.threshold_mid {
        bands.multiplier_mid
    } else if score >= bands.threshold_high {
        bands.multiplier_high
    } else {
        1.0
    }
}

/// `floor(final / (base + max(1, level)^exponent * multiplier))`, zero when not positive.
pub fn downscaled_xp(final_factor: f64, level: u32, curve: &DownscaleCurve) -> u64 {
    let level = f64::from(level.max(1));
    let divisor = curve.base + level.powf(curve.level_exponent) * curve.level_multiplier;
    let xp = final_factor / divisor;
    if !xp.is_finite() || xp <= 0.0 {
        0
    } else {
        xp.floor() as u64
    }
}

/// Splits `final_factor` across contributors by damage dealt.
///
/// The top contributor gets the full factor. Every other contributor with
/// positive damage gets `final_factor * other_attacker_multiplier`. With
/// attacker share disabled, every contributor gets the full factor. Output
/// keeps input order.
///
/// `most_damage_multiplier` is an opt-in bonus on top of the full factor and is
/// gated by `reward_most_damage_attacker`. Contributors carry no killer
/// identity here, so the flag is the only switch for it; with the flag off the
/// top share is exactly `final_factor`.
pub fn attacker_shares<K: Clone>(
    final_factor: f64,
    contributions: &[(K, f64)],
    cfg: &LevelingConfig,
) -> Vec<(K, f64)> {
    let qualifying = contributions
        .iter()
        .enumerate()
        .filter(|(_, (_, damage))| damage.is_finite() && *damage > 0.0);

    if !cfg.use_most_damage_attacker {
        return qualifying
            .map(|(_, (key, _))| (key.clone(), final_factor))
            .collect();
    }

    let top = qualifying
        .clone()
        .fold(None::<(usize, f64)>, |best, (i, (_, damage))| match best {
            Some((_, d)) if d >= *damage => best,
            _ => Some((i, *damage)),
        })
        .map(|(i, _)| i);

    qualifying
        .map(|(i, (key, _))| {
            let share = if Some(i) == top {
                if cfg.reward_most_damage_attacker {
                    final_factor * cfg.most_damage_multiplier
                } else {
                    final_factor
                }
            } else {
                final_factor * cfg.other_attacker_multiplier
            };
            (key.clone(), share)
        })
        .collect()
}

/// Scale applied when the entity spawned under a different tier than the player's.
pub fn spawn_tier_scale(spawn_rank: Option<usize>, player_rank: Option<usize>, cfg: &SpawnTierReward) -> f64 {
    if !cfg.enabled {
        return 1.0;
    }
    match (spawn_rank, player_rank) {
        (Some(spawn), Some(player)) if spawn > player => cfg.over_factor,
        (Some(spawn), Some(player)) if spawn < player => cfg.under_factor,
        _ => 1.0,
    }
}

/// Integer reward scaled by `scale`; exactly neutral scales return the amount unchanged.
pub fn scale_reward(amount: u64, scale: f64) -> u64 {
    if !scale.is_finite() || scale <= 0.0 {
        return 0;
    }
    if (scale - 1.0).abs() < NEUTRAL_EPSILON {
        return amount;
    }
    let scaled = amount as f64 * scale;
    if scaled.is_finite() {
        scaled.floor() as u64
    } else {
        0
    }
}

/// Bonus granted on top of a base reward.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiplierResult {
    pub original: u64,
    pub extra: i64,
    pub percent: i64,
    pub tier_id: String,
}

impl MultiplierResult {
    pub fn zero(original: u64, tier_id: impl Into<String>) -> Self {
        Self {
            original,
            extra: 0,
            percent: 0,
            tier_id: tier_id.into(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.extra == 0
    }

    pub fn total(&self) -> u64 {
        (self.original as i64 + self.extra).max(0) as u64
    }
}

/// `extra = floor(amount * (xp_multiplier - 1) * integration)`.
pub fn xp_bonus(amount: u64, xp_multiplier: f64, integration: f64, tier_id: &str) -> MultiplierResult {
    let scaled = (xp_multiplier - 1.0) * integration;
    if !scaled.is_finite() || amount == 0 {
        return MultiplierResult::zero(amount, tier_id);
    }
    let extra = (amount as f64 * scaled).floor();
    MultiplierResult {
        original: amount,
        extra: extra as i64,
        percent: (scaled * 100.0).round() as i64,
        tier_id: tier_id.to_string(),
    }
}

/// Cash bonus with a uniform variance around the tier multiplier.
///
/// `factor ~ U[cash - variance, cash + variance]`,
/// `extra = floor(max(1, floor(amount / 10 * factor)) * integration)`.
pub fn cash_bonus<R: Rng + ?Sized>(
    amount: u64,
    cash_multiplier: f64,
    variance: f64,
    integration: f64,
    tier_id: &str,
    rng: &mut R,
) -> MultiplierResult {
    if amount == 0 || !cash_multiplier.is_finite() || cash_multiplier <= 0.0 {
        return MultiplierResult::zero(amount, tier_id);
    }
    let variance = if variance.is_finite() { variance.abs() } else { 0.0 };
    let factor = if variance > 0.0 {
        rng.gen_range((cash_multiplier - variance)..=(cash_multiplier + variance))
    } else {
        cash_multiplier
    };
    let base_extra = (amount as f64 / 10.0 * factor).floor().max(1.0);
    let extra = (base_extra * integration).floor();
    if !extra.is_finite() {
        return MultiplierResult::zero(amount, tier_id);
    }
    MultiplierResult {
        original: amount,
        extra: extra as i64,
        percent: (factor * 100.0).round() as i64,
        tier_id: tier_id.to_string(),
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn downscale_shrinks_with_level() {
        let curve = DownscaleCurve::default();
        let low = downscaled_xp(1000.0, 1, &curve);
        let high = downscaled_xp(1000.0, 50, &curve);

        assert_eq!(low, (1000.0_f64 / (12.0 + 1.8)).floor() as u64);
        assert!(high < low);
        assert_eq!(downscaled_xp(1000.0, 0, &curve), low);
    }

    #[test]
    fn downscale_clamps_to_zero() {
        let curve = DownscaleCurve::default();
        assert_eq!(downscaled_xp(-5.0, 3, &curve), 0);
        assert_eq!(downscaled_xp(f64::NAN, 3, &curve), 0);
        let broken = DownscaleCurve {
            base: 0.0,
            level_exponent: 1.0,
            level_multiplier: 0.0,
        };
        assert_eq!(downscaled_xp(10.0, 3, &broken), 0);
    }

    #[test]
    fn attitude_bands() {
        let bands = AttitudeBands::default();
        let revered = attitude_score(Attitude::Revered, false, &bands);
        let friendly = attitude_score(Attitude::Friendly, false, &bands);
        let hostile = attitude_score(Attitude::Hostile, true, &bands);

        assert_eq!(attitude_multiplier(revered, &bands), 0.05);
        assert_eq!(attitude_multiplier(friendly, &bands), 0.2);
        assert_eq!(attitude_multiplier(hostile, &bands), 1.1);
        assert_eq!(attitude_multiplier(0.0, &bands), 1.0);
        assert_eq!(hostile, 100.0);
    }

    #[test]
    fn top_attacker_gets_full_share() {
        let cfg = LevelingConfig {
            reward_most_damage_attacker: false,
            ..LevelingConfig::default()
        };
        let shares = attacker_shares(100.0, &[("a", 10.0), ("b", 40.0), ("c", 0.0)], &cfg);

        assert_eq!(shares, vec![("a", 10.0), ("b", 100.0)]);
    }

    #[test]
    fn top_attacker_bonus_when_enabled() {
        let cfg = LevelingConfig::default();
        let shares = attacker_shares(100.0, &[("a", 50.0), ("b", 5.0)], &cfg);

        assert!((shares[0].1 - 110.0).abs() < 1e-9);
        assert!((shares[1].1 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn share_disabled_gives_everyone_full_factor() {
        let cfg = LevelingConfig {
            use_most_damage_attacker: false,
            ..LevelingConfig::default()
        };
        let shares = attacker_shares(80.0, &[(1, 3.0), (2, 9.0)], &cfg);
        assert_eq!(shares, vec![(1, 80.0), (2, 80.0)]);
    }

    #[test]
    fn base_factor_weights_stats() {
        let facts = RewardFacts {
            range: 2.0,
            health: 100.0,
            mana: 10.0,
            ammo: 5.0,
            signature_energy: 1.0,
            scaled_damage: 3.0,
        };
        let cfg = LevelingConfig::default();
        assert_eq!(base_factor(&facts, &cfg), 2.0 + 100.0 + 40.0 + 20.0 + 10.0 + 12.0);

        let ranged_only = LevelingConfig {
            include_default_stats: false,
            include_scaled_damage: false,
            ..LevelingConfig::default()
        };
        assert_eq!(base_factor(&facts, &ranged_only), 2.0);
    }

    #[test]
    fn spawn_tier_mismatch() {
        let cfg = SpawnTierReward::default();
        assert_eq!(spawn_tier_scale(Some(5), Some(2), &cfg), 1.05);
        assert_eq!(spawn_tier_scale(Some(1), Some(2), &cfg), 0.95);
        assert_eq!(spawn_tier_scale(Some(2), Some(2), &cfg), 1.0);
        assert_eq!(spawn_tier_scale(None, Some(2), &cfg), 1.0);
    }

    #[test]
    fn reward_scale_edges() {
        assert_eq!(scale_reward(17, 1.0000001), 17);
        assert_eq!(scale_reward(17, 0.5), 8);
        assert_eq!(scale_reward(17, 0.0), 0);
        assert_eq!(scale_reward(17, f64::NAN), 0);
    }

    #[test]
    fn xp_bonus_reports_percent() {
        let result = xp_bonus(200, 1.25, 1.0, "hard");
        assert_eq!(result.extra, 50);
        assert_eq!(result.percent, 25);
        assert_eq!(result.total(), 250);
        assert!(xp_bonus(200, 1.0, 1.0, "normal").is_zero());
    }

    #[test]
    fn cash_bonus_stays_within_variance() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..1000 {
            let result = cash_bonus(100, 2.0, 0.23, 1.0, "hard", &mut rng);
            assert!((17..=22).contains(&result.extra), "extra {}", result.extra);
        }
        let tiny = cash_bonus(3, 1.0, 0.0, 1.0, "easy", &mut rng);
        assert_eq!(tiny.extra, 1);
    }
}
