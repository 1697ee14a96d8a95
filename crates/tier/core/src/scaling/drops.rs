//! Stochastic loot scaling: rate, then quantity, then quality.
//!
//! Each stage only sees the survivors of the previous one. Over many trials the
//! expected total quantity is `qty * rate * quantity_multiplier`.
use rand::Rng;

/// One dropped item stack.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropStack {
    pub item_id: String,
    pub quantity: u32,
    /// Rarity rank on the host's quality ladder; `None` for items without one.
    pub quality: Option<usize>,
}

impl DropStack {
    pub fn new(item_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            quality: None,
        }
    }

    pub fn with_quality(mut self, rank: usize) -> Self {
        self.quality = Some(rank);
        self
    }
}

/// Effective multipliers for one drop event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DropMultipliers {
    pub rate: f64,
    pub quantity: f64,
    pub quality: f64,
}

impl DropMultipliers {
    pub const NEUTRAL: Self = Self {
        rate: 1.0,
        quantity: 1.0,
        quality: 1.0,
    };

    /// Each raw tier value times `scale`, floored at zero. Non-finite reads as zero.
    pub fn scaled(rate: f64, quantity: f64, quality: f64, scale: f64) -> Self {
        let clean = |m: f64| {
            let v = m * scale;
            if v.is_finite() { v.max(0.0) } else { 0.0 }
        };
        Self {
            rate: clean(rate),
            quantity: clean(quantity),
            quality: clean(quality),
        }
    }
}

/// Runs the full pipeline. `quality_levels` is the length of the host's rarity ladder.
pub fn apply_drop_pipeline<R: Rng + ?Sized>(
    drops: Vec<DropStack>,
    multipliers: DropMultipliers,
    quality_levels: usize,
    rng: &mut R,
) -> Vec<DropStack> {
    let drops = apply_drop_rate(drops, multipliers.rate, rng);
    let drops = apply_drop_quantity(drops, multipliers.quantity, rng);
    apply_drop_quality(drops, multipliers.quality, quality_levels)
}

/// Below 1: keep each stack with probability `multiplier`. At or above 1:
/// `floor(multiplier)` copies plus one more with probability `frac(multiplier)`.
pub fn apply_drop_rate<R: Rng + ?Sized>(
    drops: Vec<DropStack>,
    multiplier: f64,
    rng: &mut R,
) -> Vec<DropStack> {
    if !(multiplier > 0.0) || !multiplier.is_finite() {
        return Vec::new();
    }
    if multiplier == 1.0 {
        return drops;
    }
    if multiplier < 1.0 {
        return drops
            .into_iter()
            .filter(|_| rng.r#gen::<f64>() < multiplier)
            .collect();
    }

    let whole = multiplier.floor() as usize;
    let fraction = multiplier - whole as f64;
    let mut out = Vec::with_capacity(drops.len() * (whole + 1));
    for stack in drops {
        let copies = whole + usize::from(rng.r#gen::<f64>() < fraction);
        out.extend(std::iter::repeat_n(stack, copies));
    }
    out
}

/// `floor(qty * m)` plus one with probability of the fractional part. Empty stacks are dropped.
pub fn apply_drop_quantity<R: Rng + ?Sized>(
    drops: Vec<DropStack>,
    multiplier: f64,
    rng: &mut R,
) -> Vec<DropStack> {
    if !(multiplier > 0.0) || !multiplier.is_finite() {
        return Vec::new();
    }
    if multiplier == 1.0 {
        return drops;
    }
    drops
        .into_iter()
        .filter_map(|mut stack| {
            stack.quantity = scale_quantity(stack.quantity, multiplier, rng);
            (stack.quantity > 0).then_some(stack)
        })
        .collect()
}

/// Stochastic rounding of `quantity * multiplier`.
pub fn scale_quantity<R: Rng + ?Sized>(quantity: u32, multiplier: f64, rng: &mut R) -> u32 {
    let scaled = quantity as f64 * multiplier;
    if !scaled.is_finite() || scaled <= 0.0 {
        return 0;
    }
    let whole = scaled.floor();
    let extra = rng.r#gen::<f64>() < scaled - whole;
    (whole as u32).saturating_add(u32::from(extra))
}

/// Moves each stack's rarity rank to `round((rank + 1) * m) - 1`, clamped to the ladder.
pub fn apply_drop_quality(
    drops: Vec<DropStack>,
    multiplier: f64,
    quality_levels: usize,
) -> Vec<DropStack> {
    if !(multiplier > 0.0) || !multiplier.is_finite() {
        return Vec::new();
    }
    if multiplier == 1.0 || quality_levels == 0 {
        return drops;
    }
    drops
        .into_iter()
        .map(|mut stack| {
            if let Some(rank) = stack.quality {
                stack.quality = Some(shift_quality(rank, multiplier, quality_levels));
            }
            stack
        })
        .collect()
}

pub fn shift_quality(rank: usize, multiplier: f64, quality_levels: usize) -> usize {
    let top = quality_levels.saturating_sub(1) as f64;
    let target = ((rank as f64 + 1.0) * multiplier).round() - 1.0;
    target.clamp(0.0, top) as usize
}
