//! Max-health reconciliation through a single engine-owned modifier.
use crate::config::HealthScaling;

/// Key of the multiplicative max-health modifier owned by tier scaling.
pub const HEALTH_MODIFIER_KEY: &str = "ascendant.nearestPlayerHealthScale.health_multiplier";

/// Entity health as seen by the scaling logic.
///
/// Implemented by an adapter over the host's stat storage.
pub trait HealthPool {
    /// Current value.
    fn current(&self) -> f64;

    /// Maximum, including all active modifiers.
    fn max(&self) -> f64;

    /// Factor of the multiplicative modifier stored under `key`, if any.
    fn modifier(&self, key: &str) -> Option<f64>;

    /// Inserts or replaces the multiplicative max modifier under `key`.
    fn put_modifier(&mut self, key: &str, factor: f64);

    /// Removes the modifier under `key`. Returns whether one was present.
    fn remove_modifier(&mut self, key: &str) -> bool;

    /// Adds `delta` to the current value.
    fn add_current(&mut self, delta: f64);
}

/// What [`reconcile_health`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HealthOutcome {
    /// Factor is neutral; a previously applied modifier (if any) was removed.
    Neutral { removed: bool },
    /// The stored modifier already matches the factor.
    Unchanged,
    /// Modifier upserted. `filled` is the health added on first application.
    Applied { factor: f64, first: bool, filled: f64 },
}

/// Clamps a raw tier factor into the configured bounds; non-finite reads as 1.
pub fn sanitize_health_factor(raw: f64, scaling: &HealthScaling) -> f64 {
    if !raw.is_finite() {
        return 1.0;
    }
    let (lo, hi) = if scaling.min_factor <= scaling.max_factor {
        (scaling.min_factor, scaling.max_factor)
    } else {
        (scaling.max_factor, scaling.min_factor)
    };
    raw.clamp(lo, hi)
}

/// Brings `pool` in line with `raw_factor`.
///
/// Re-applying the same factor is idempotent. On the first application the
/// current value is topped up by `new_max - current` so a freshly scaled
/// entity does not start under-filled.
pub fn reconcile_health<P: HealthPool + ?Sized>(
    pool: &mut P,
    raw_factor: f64,
    scaling: &HealthScaling,
) -> HealthOutcome {
    let factor = sanitize_health_factor(raw_factor, scaling);
    let tolerance = scaling.tolerance.abs();

    if (factor - 1.0).abs() < tolerance {
        let removed = pool.remove_modifier(HEALTH_MODIFIER_KEY);
        return HealthOutcome::Neutral { removed };
    }

    let existing = pool.modifier(HEALTH_MODIFIER_KEY);
    if let Some(current) = existing
        && (current - factor).abs() < tolerance
    {
        return HealthOutcome::Unchanged;
    }

    pool.put_modifier(HEALTH_MODIFIER_KEY, factor);

    let first = existing.is_none();
    let mut filled = 0.0;
    if first {
        let delta = pool.max() - pool.current();
        if delta > tolerance {
            pool.add_current(delta);
            filled = delta;
        }
    }
    HealthOutcome::Applied {
        factor,
        first,
        filled,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct Stat {
        base_max: f64,
        current: f64,
        modifiers: HashMap<String, f64>,
    }

    impl Stat {
        fn full(base_max: f64) -> Self {
            Self {
                base_max,
                current: base_max,
                modifiers: HashMap::new(),
            }
        }
    }

    impl HealthPool for Stat {
        fn current(&self) -> f64 {
            self.current
        }

        fn max(&self) -> f64 {
            self.modifiers.values().fold(self.base_max, |acc, m| acc * m)
        }

        fn modifier(&self, key: &str) -> Option<f64> {
            self.modifiers.get(key).copied()
        }

        fn put_modifier(&mut self, key: &str, factor: f64) {
            self.modifiers.insert(key.to_string(), factor);
        }

        fn remove_modifier(&mut self, key: &str) -> bool {
            self.modifiers.remove(key).is_some()
        }

        fn add_current(&mut self, delta: f64) {
            self.current += delta;
        }
    }

    #[test]
    fn first_application_fills_to_new_max() {
        let mut stat = Stat::full(100.0);
        let outcome = reconcile_health(&mut stat, 2.0, &HealthScaling::default());

        assert_eq!(
            outcome,
            HealthOutcome::Applied {
                factor: 2.0,
                first: true,
                filled: 100.0
            }
        );
        assert_eq!(stat.current, 200.0);
        assert_eq!(stat.max(), 200.0);
    }

    #[test]
    fn reapplying_same_factor_is_idempotent() {
        let mut stat = Stat::full(100.0);
        let scaling = HealthScaling::default();
        reconcile_health(&mut stat, 2.0, &scaling);
        stat.current = 150.0;

        let outcome = reconcile_health(&mut stat, 2.0, &scaling);

        assert_eq!(outcome, HealthOutcome::Unchanged);
        assert_eq!(stat.modifiers.len(), 1);
        assert_eq!(stat.modifier(HEALTH_MODIFIER_KEY), Some(2.0));
        assert_eq!(stat.current, 150.0);
    }

    #[test]
    fn changed_factor_updates_without_refill() {
        let mut stat = Stat::full(100.0);
        let scaling = HealthScaling::default();
        reconcile_health(&mut stat, 2.0, &scaling);

        let outcome = reconcile_health(&mut stat, 3.0, &scaling);

        assert_eq!(
            outcome,
            HealthOutcome::Applied {
                factor: 3.0,
                first: false,
                filled: 0.0
            }
        );
        assert_eq!(stat.current, 200.0);
        assert_eq!(stat.modifiers.len(), 1);
    }

    #[test]
    fn neutral_factor_removes_modifier() {
        let mut stat = Stat::full(100.0);
        let scaling = HealthScaling::default();
        reconcile_health(&mut stat, 2.0, &scaling);

        let outcome = reconcile_health(&mut stat, 1.00001, &scaling);

        assert_eq!(outcome, HealthOutcome::Neutral { removed: true });
        assert!(stat.modifiers.is_empty());
    }

    #[test]
    fn factor_is_clamped_and_sanitized() {
        let scaling = HealthScaling::default();
        assert_eq!(sanitize_health_factor(1000.0, &scaling), 300.0);
        assert_eq!(sanitize_health_factor(0.0, &scaling), 0.05);
        assert_eq!(sanitize_health_factor(f64::NAN, &scaling), 1.0);

        let mut stat = Stat::full(100.0);
        let outcome = reconcile_health(&mut stat, f64::INFINITY, &scaling);
        assert_eq!(outcome, HealthOutcome::Neutral { removed: false });
    }

    #[test]
    fn shrinking_factor_does_not_add_health() {
        let mut stat = Stat::full(100.0);
        let outcome = reconcile_health(&mut stat, 0.5, &HealthScaling::default());

        assert_eq!(
            outcome,
            HealthOutcome::Applied {
                factor: 0.5,
                first: true,
                filled: 0.0
            }
        );
        assert_eq!(stat.current, 100.0);
    }
}
