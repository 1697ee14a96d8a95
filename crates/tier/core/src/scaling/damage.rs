//! Damage and armor multipliers with a guaranteed floor.
use crate::catalog::TierCatalog;
use crate::config::DamageRules;
use crate::keys::{DamageCause, SettingKey};

/// `max(base * min_factor, base * max(0, multiplier))`, never negative.
///
/// Even a zero multiplier leaves `base * min_factor`, so scaled damage never
/// vanishes entirely. Non-finite inputs are treated as zero.
pub fn apply_damage_multiplier(base: f64, multiplier: f64, min_factor: f64) -> f64 {
    let base = finite_or_zero(base).max(0.0);
    let multiplier = finite_or_zero(multiplier).max(0.0);
    let min_factor = finite_or_zero(min_factor).max(0.0);
    (base * min_factor).max(base * multiplier)
}

/// Armor uses the same floor as damage.
pub fn apply_armor_multiplier(base: f64, multiplier: f64, min_factor: f64) -> f64 {
    apply_damage_multiplier(base, multiplier, min_factor)
}

/// Multiplier for damage of `cause` received under `tier_id`.
///
/// Returns `None` when damage scaling or this cause is switched off, or when
/// the configured value is not finite; callers leave the damage untouched.
/// The per-cause key is used only if some section set it explicitly,
/// otherwise the generic `damage_multiplier` applies.
pub fn received_damage_multiplier(
    catalog: &TierCatalog,
    rules: &DamageRules,
    tier_id: &str,
    cause: DamageCause,
) -> Option<f64> {
    if !rules.enabled || !rules.cause_enabled(cause) {
        return None;
    }
    let specific = cause.setting_key();
    let key = if catalog.is_explicit(tier_id, specific) {
        specific
    } else {
        SettingKey::DamageMultiplier
    };
    let multiplier = catalog.value(tier_id, key);
    multiplier.is_finite().then_some(multiplier)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
