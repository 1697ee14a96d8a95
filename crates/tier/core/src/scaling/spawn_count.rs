//! Spawn-count multiplier: cull, keep, or duplicate natural spawns.
use rand::Rng;

/// Where a spawn request came from.
///
/// Extra entities created by the multiplier are tagged [`SpawnOrigin::Synthetic`]
/// on their creation request and are never multiplied again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpawnOrigin {
    #[default]
    Natural,
    Synthetic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnCountDecision {
    /// Not subject to the multiplier (synthetic request or unusable multiplier).
    Untouched,
    /// Remove the spawned entity.
    Remove,
    /// Keep it; spawn `extras` additional synthetic copies.
    Keep { extras: u32 },
}

/// `m <= 0` removes, `m < 1` keeps with probability `m`, `m > 1` adds
/// `floor(m - 1)` copies plus one with probability `frac(m - 1)`.
pub fn decide_spawn_count<R: Rng + ?Sized>(
    multiplier: f64,
    origin: SpawnOrigin,
    rng: &mut R,
) -> SpawnCountDecision {
    if origin == SpawnOrigin::Synthetic || !multiplier.is_finite() {
        return SpawnCountDecision::Untouched;
    }
    if multiplier <= 0.0 {
        return SpawnCountDecision::Remove;
    }
    if multiplier < 1.0 {
        return if rng.r#gen::<f64>() < multiplier {
            SpawnCountDecision::Keep { extras: 0 }
        } else {
            SpawnCountDecision::Remove
        };
    }
    let extra = multiplier - 1.0;
    let guaranteed = extra.floor();
    let bonus = rng.r#gen::<f64>() < extra - guaranteed;
    SpawnCountDecision::Keep {
        extras: (guaranteed as u32).saturating_add(u32::from(bonus)),
    }
}
