//! Shared world tier computed from the online players' own tiers.
//!
//! Inputs are always the players' *player-level* tiers, never a previously
//! resolved world tier, so resolution cannot feed back into itself.
use strum::{AsRefStr, EnumIter, EnumString, IntoStaticStr};

use crate::catalog::{Tier, TierCatalog};
use crate::error::TierError;

/// How the world tier aggregates online players.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, AsRefStr, EnumIter, EnumString, IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WorldTierMode {
    /// Always the configured fixed tier.
    #[default]
    Fixed,
    /// Hardest tier among online players.
    Highest,
    /// Easiest tier among online players.
    Lowest,
    /// Interpolated between online players' tiers by `scaled_factor`.
    Scaled,
}

impl WorldTierMode {
    pub fn parse(raw: &str) -> Result<Self, TierError> {
        raw.trim()
            .parse()
            .map_err(|_| TierError::UnknownMode(raw.to_string()))
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// World tier configuration from `base.worldTier`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldTierSettings {
    pub enabled: bool,
    pub mode: WorldTierMode,
    pub fixed_tier: String,
    pub scaled_factor: f64,
    pub scaled_use_all_online_players: bool,
}

impl WorldTierSettings {
    pub const DEFAULT_FIXED_TIER: &'static str = "normal";
    pub const DEFAULT_SCALED_FACTOR: f64 = 0.5;

    /// `scaled_factor` clamped into `[0, 1]`; non-finite values read as 0.
    pub fn sanitized_factor(&self) -> f64 {
        if self.scaled_factor.is_finite() {
            self.scaled_factor.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for WorldTierSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: WorldTierMode::Fixed,
            fixed_tier: Self::DEFAULT_FIXED_TIER.to_string(),
            scaled_factor: Self::DEFAULT_SCALED_FACTOR,
            scaled_use_all_online_players: false,
        }
    }
}

/// Resolves the world tier against one catalog snapshot.
pub struct WorldTierResolver<'a> {
    catalog: &'a TierCatalog,
    settings: &'a WorldTierSettings,
    default_tier: &'a str,
    admin_override: Option<&'a str>,
}

impl<'a> WorldTierResolver<'a> {
    pub fn new(
        catalog: &'a TierCatalog,
        settings: &'a WorldTierSettings,
        default_tier: &'a str,
    ) -> Self {
        Self {
            catalog,
            settings,
            default_tier,
            admin_override: None,
        }
    }

    /// An admin override, when valid, wins over every mode.
    pub fn with_admin_override(mut self, tier_id: Option<&'a str>) -> Self {
        self.admin_override = tier_id;
        self
    }

    /// Resolves the world tier from the online players' own tier ids.
    ///
    /// Invalid ids in `online` are ignored. Returns `None` only for an empty catalog.
    pub fn resolve<'s, I>(&self, online: I) -> Option<&'a Tier>
    where
        I: IntoIterator<Item = &'s str>,
    {
        if self.catalog.is_empty() {
            return None;
        }
        if let Some(rank) = self.admin_override.and_then(|id| self.catalog.rank(id)) {
            return self.catalog.at_rank(rank);
        }

        let mut ranks: Vec<usize> = online
            .into_iter()
            .filter_map(|id| self.catalog.rank(id))
            .collect();
        let fallback = self.fallback_rank();

        let rank = match self.settings.mode {
            WorldTierMode::Fixed => fallback,
            WorldTierMode::Highest => ranks.iter().copied().max().unwrap_or(fallback),
            WorldTierMode::Lowest => ranks.iter().copied().min().unwrap_or(fallback),
            WorldTierMode::Scaled => {
                let factor = self.settings.sanitized_factor();
                if ranks.is_empty() {
                    fallback
                } else if self.settings.scaled_use_all_online_players && ranks.len() > 1 {
                    ranks.sort_unstable();
                    distribution_rank(&ranks, factor)
                } else {
                    extremes_rank(&ranks, factor)
                }
            }
        };

        self.catalog.at_rank(rank.min(self.catalog.len() - 1))
    }

    /// Fixed tier, then default tier, then the first declared tier.
    fn fallback_rank(&self) -> usize {
        self.catalog
            .rank(&self.settings.fixed_tier)
            .or_else(|| self.catalog.rank(self.default_tier))
            .unwrap_or(0)
    }
}

/// `round(min + (max - min) * factor)` over the extremes only.
pub fn extremes_rank(ranks: &[usize], factor: f64) -> usize {
    let (Some(&min), Some(&max)) = (ranks.iter().min(), ranks.iter().max()) else {
        return 0;
    };
    let value = min as f64 + (max - min) as f64 * factor;
    value.round().max(0.0) as usize
}

/// Interpolates inside the sorted rank distribution at `factor * (len - 1)`.
///
/// `sorted` must be ascending and non-empty.
pub fn distribution_rank(sorted: &[usize], factor: f64) -> usize {
    let Some(&last) = sorted.last() else {
        return 0;
    };
    if sorted.len() == 1 {
        return last;
    }
    let position = factor * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = (position.ceil() as usize).min(sorted.len() - 1);
    let fraction = position - lower as f64;
    let low = sorted[lower] as f64;
    let high = sorted[upper] as f64;
    (low + (high - low) * fraction).round().max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TierSpec;
    use crate::settings::BaseSettings;

    fn catalog(n: usize) -> TierCatalog {
        TierCatalog::build(
            BaseSettings::default(),
            (0..n).map(|i| TierSpec::new(format!("t{i}"))),
        )
    }

    fn settings(mode: WorldTierMode) -> WorldTierSettings {
        WorldTierSettings {
            enabled: true,
            mode,
            fixed_tier: "t2".into(),
            ..WorldTierSettings::default()
        }
    }

    #[test]
    fn scaled_interpolates_between_extremes() {
        assert_eq!(extremes_rank(&[1, 5], 0.5), 3);
        assert_eq!(extremes_rank(&[5, 1, 3], 0.0), 1);
        assert_eq!(extremes_rank(&[5, 1, 3], 1.0), 5);
    }

    #[test]
    fn scaled_all_players_follows_distribution() {
        assert_eq!(distribution_rank(&[1, 2, 2, 8], 0.5), 2);
        assert_eq!(distribution_rank(&[1, 2, 2, 8], 1.0), 8);
        assert_eq!(distribution_rank(&[0, 10], 0.25), 3);
    }

    #[test]
    fn highest_and_lowest_pick_extremes() {
        let catalog = catalog(6);
        let highest = settings(WorldTierMode::Highest);
        let lowest = settings(WorldTierMode::Lowest);

        let pick = |s| {
            WorldTierResolver::new(&catalog, s, "t0")
                .resolve(["t1", "t4", "T3"])
                .map(Tier::id)
        };
        assert_eq!(pick(&highest), Some("t4"));
        assert_eq!(pick(&lowest), Some("t1"));
    }

    #[test]
    fn empty_online_set_falls_back_to_fixed_then_default_then_first() {
        let catalog = catalog(4);
        let mut s = settings(WorldTierMode::Highest);

        let resolve = |s: &WorldTierSettings, default: &str| {
            WorldTierResolver::new(&catalog, s, default)
                .resolve(std::iter::empty())
                .map(|t| t.id().to_string())
        };
        assert_eq!(resolve(&s, "t1").as_deref(), Some("t2"));
        s.fixed_tier = "missing".into();
        assert_eq!(resolve(&s, "t1").as_deref(), Some("t1"));
        assert_eq!(resolve(&s, "missing").as_deref(), Some("t0"));
    }

    #[test]
    fn admin_override_wins_over_mode() {
        let catalog = catalog(6);
        let s = settings(WorldTierMode::Highest);
        let tier = WorldTierResolver::new(&catalog, &s, "t0")
            .with_admin_override(Some("t1"))
            .resolve(["t5"]);
        assert_eq!(tier.map(Tier::id), Some("t1"));

        let invalid = WorldTierResolver::new(&catalog, &s, "t0")
            .with_admin_override(Some("nope"))
            .resolve(["t5"]);
        assert_eq!(invalid.map(Tier::id), Some("t5"));
    }

    #[test]
    fn scaled_modes_through_the_resolver() {
        let catalog = catalog(10);
        let mut s = settings(WorldTierMode::Scaled);
        s.scaled_factor = 0.5;

        let resolver = WorldTierResolver::new(&catalog, &s, "t0");
        assert_eq!(resolver.resolve(["t1", "t5"]).map(Tier::id), Some("t3"));

        s.scaled_use_all_online_players = true;
        let resolver = WorldTierResolver::new(&catalog, &s, "t0");
        assert_eq!(
            resolver.resolve(["t8", "t2", "t1", "t2"]).map(Tier::id),
            Some("t2")
        );
    }

    #[test]
    fn non_finite_factor_is_sanitized() {
        let s = WorldTierSettings {
            scaled_factor: f64::NAN,
            ..WorldTierSettings::default()
        };
        assert_eq!(s.sanitized_factor(), 0.0);
        let s = WorldTierSettings {
            scaled_factor: 7.0,
            ..WorldTierSettings::default()
        };
        assert_eq!(s.sanitized_factor(), 1.0);
    }

    #[test]
    fn modes_parse_case_insensitively() {
        assert_eq!(WorldTierMode::parse("SCALED"), Ok(WorldTierMode::Scaled));
        assert_eq!(WorldTierMode::parse(" highest "), Ok(WorldTierMode::Highest));
        assert!(WorldTierMode::parse("median").is_err());
        assert_eq!(WorldTierMode::Lowest.as_str(), "lowest");
    }

    #[test]
    fn empty_catalog_resolves_nothing() {
        let catalog = catalog(0);
        let s = settings(WorldTierMode::Fixed);
        assert!(WorldTierResolver::new(&catalog, &s, "t0").resolve(["t1"]).is_none());
    }
}
