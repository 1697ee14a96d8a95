//! Stateless scaling formulas consuming tier settings.
//!
//! Callers resolve the tier, read the relevant settings from a
//! [`crate::TierCatalog`] snapshot and feed them through these functions. Any
//! randomness comes from a caller-supplied [`rand::Rng`].
pub mod damage;
pub mod drops;
pub mod elite;
pub mod health;
pub mod rewards;
pub mod spawn_count;

pub use damage::{apply_armor_multiplier, apply_damage_multiplier, received_damage_multiplier};
pub use drops::{
    DropMultipliers, DropStack, apply_drop_pipeline, apply_drop_quality, apply_drop_quantity,
    apply_drop_rate,
};
pub use elite::{
    ChanceOverrideGuard, EliteChances, EliteRollBridge, EntityRef, RollError, RollOutcome,
    effective_chances, roll_with_override,
};
pub use health::{HEALTH_MODIFIER_KEY, HealthOutcome, HealthPool, reconcile_health};
pub use rewards::{
    Attitude, MultiplierResult, RewardFacts, attacker_shares, attitude_multiplier,
    attitude_score, base_factor, cash_bonus, downscaled_xp, scale_reward, spawn_tier_scale,
    xp_bonus,
};
pub use spawn_count::{SpawnCountDecision, SpawnOrigin, decide_spawn_count};
