//! Ordered tier list with precomputed cascaded settings.
//!
//! The catalog is built once per configuration load and never mutated. Tier
//! `i` resolves every key from its own section when present, otherwise from
//! tier `i - 1`, transitively down to the base section.
use std::collections::HashMap;

use crate::error::{Result, TierError};
use crate::keys::{FlagKey, SettingKey};
use crate::meta::{MetaSpec, TierMeta};
use crate::settings::{BaseSettings, SettingsOverrides, TierSettings};

/// One tier as declared by the configuration, before cascading.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TierSpec {
    pub id: String,
    pub overrides: SettingsOverrides,
    pub meta: Option<MetaSpec>,
}

impl TierSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_meta(mut self, meta: MetaSpec) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// A fully resolved tier.
#[derive(Clone, Debug, PartialEq)]
pub struct Tier {
    id: String,
    rank: usize,
    settings: TierSettings,
    meta: TierMeta,
}

impl Tier {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Position in declaration order; higher is harder.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn settings(&self) -> &TierSettings {
        &self.settings
    }

    pub fn meta(&self) -> &TierMeta {
        &self.meta
    }

    pub fn is_allowed(&self) -> bool {
        self.settings.flag(FlagKey::IsAllowed)
    }

    pub fn is_hidden(&self) -> bool {
        self.settings.flag(FlagKey::IsHidden)
    }

    /// Allowed and visible, i.e. offered to players for selection.
    pub fn is_selectable(&self) -> bool {
        self.is_allowed() && !self.is_hidden()
    }
}

/// Immutable, ordered collection of tiers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TierCatalog {
    base: BaseSettings,
    tiers: Vec<Tier>,
    index: HashMap<String, usize>,
}

impl TierCatalog {
    /// Builds the catalog from specs already in final order.
    ///
    /// Ids are matched case-insensitively; a spec whose id collides with an
    /// earlier one is ignored.
    pub fn build(base: BaseSettings, specs: impl IntoIterator<Item = TierSpec>) -> Self {
        let mut tiers: Vec<Tier> = Vec::new();
        let mut index = HashMap::new();
        let mut previous = base.settings().clone();

        for spec in specs {
            let key = spec.id.to_lowercase();
            if spec.id.trim().is_empty() || index.contains_key(&key) {
                continue;
            }
            let settings = previous.cascade(&spec.overrides);
            let rank = tiers.len();
            index.insert(key, rank);
            tiers.push(Tier {
                meta: TierMeta::resolve(&spec.id, spec.meta.as_ref()),
                id: spec.id,
                rank,
                settings: settings.clone(),
            });
            previous = settings;
        }

        Self { base, tiers, index }
    }

    pub fn base(&self) -> &BaseSettings {
        &self.base
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.tiers.iter().map(Tier::id)
    }

    pub fn first(&self) -> Option<&Tier> {
        self.tiers.first()
    }

    pub fn get(&self, id: &str) -> Option<&Tier> {
        self.rank(id).map(|rank| &self.tiers[rank])
    }

    pub fn at_rank(&self, rank: usize) -> Option<&Tier> {
        self.tiers.get(rank)
    }

    /// Rank of `id`, matched case-insensitively.
    pub fn rank(&self, id: &str) -> Option<usize> {
        self.index.get(&id.trim().to_lowercase()).copied()
    }

    /// Declared spelling of `id`, or `None` when the tier does not exist.
    pub fn canonicalize(&self, id: &str) -> Option<&str> {
        self.get(id).map(Tier::id)
    }

    pub fn require(&self, id: &str) -> Result<&Tier> {
        self.get(id)
            .ok_or_else(|| TierError::UnknownTier(id.to_string()))
    }

    /// Tiers offered to players (allowed and not hidden).
    pub fn selectable(&self) -> impl Iterator<Item = &Tier> + '_ {
        self.tiers.iter().filter(|tier| tier.is_selectable())
    }

    /// Looks up a setting by document key.
    ///
    /// Unrecognized keys are answered from the base section without cascading.
    /// Unknown tiers read base values.
    pub fn resolve(&self, tier_id: &str, key: &str) -> f64 {
        match SettingKey::parse(key) {
            Some(key) => self.value(tier_id, key),
            None => self.base.extra(key),
        }
    }

    pub fn value(&self, tier_id: &str, key: SettingKey) -> f64 {
        self.settings_for(tier_id).get(key)
    }

    pub fn flag(&self, tier_id: &str, key: FlagKey) -> bool {
        self.settings_for(tier_id).flag(key)
    }

    /// Whether `key` was written by the base section or by this tier or an earlier one.
    pub fn is_explicit(&self, tier_id: &str, key: SettingKey) -> bool {
        self.settings_for(tier_id).is_explicit(key)
    }

    pub fn settings_for(&self, tier_id: &str) -> &TierSettings {
        self.get(tier_id)
            .map(Tier::settings)
            .unwrap_or_else(|| self.base.settings())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn abc() -> TierCatalog {
        TierCatalog::build(
            BaseSettings::default(),
            [
                TierSpec::new("A").with_overrides(
                    SettingsOverrides::new().with(SettingKey::HealthMultiplier, 2.0),
                ),
                TierSpec::new("B"),
                TierSpec::new("C").with_overrides(
                    SettingsOverrides::new().with(SettingKey::ArmorMultiplier, 0.5),
                ),
            ],
        )
    }

    #[test]
    fn unset_keys_inherit_from_nearest_earlier_tier() {
        let catalog = abc();

        assert_eq!(catalog.resolve("B", "health_multiplier"), 2.0);
        assert_eq!(catalog.resolve("C", "health_multiplier"), 2.0);
        assert_eq!(catalog.resolve("A", "armor_multiplier"), 1.0);
        assert_eq!(catalog.resolve("C", "armor_multiplier"), 0.5);
    }

    #[test]
    fn unrecognized_keys_read_base_without_cascading() {
        let mut extras = BTreeMap::new();
        extras.insert("loot_luck".to_string(), 4.0);
        let catalog = TierCatalog::build(
            BaseSettings::new(&SettingsOverrides::new(), extras),
            [TierSpec::new("normal")],
        );

        assert_eq!(catalog.resolve("normal", "loot_luck"), 4.0);
        assert_eq!(catalog.resolve("normal", "missing_key"), 1.0);
    }

    #[test]
    fn ids_are_canonicalized_case_insensitively() {
        let catalog = TierCatalog::build(
            BaseSettings::default(),
            [TierSpec::new("Very Easy"), TierSpec::new("Normal")],
        );

        assert_eq!(catalog.canonicalize("very easy"), Some("Very Easy"));
        assert_eq!(catalog.canonicalize(" NORMAL "), Some("Normal"));
        assert_eq!(catalog.rank("normal"), Some(1));
        assert!(catalog.canonicalize("hard").is_none());
        assert!(matches!(catalog.require("hard"), Err(TierError::UnknownTier(_))));
    }

    #[test]
    fn duplicate_ids_keep_first_declaration() {
        let catalog = TierCatalog::build(
            BaseSettings::default(),
            [
                TierSpec::new("hard").with_overrides(
                    SettingsOverrides::new().with(SettingKey::DamageMultiplier, 2.0),
                ),
                TierSpec::new("HARD").with_overrides(
                    SettingsOverrides::new().with(SettingKey::DamageMultiplier, 9.0),
                ),
            ],
        );

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.value("hard", SettingKey::DamageMultiplier), 2.0);
    }

    #[test]
    fn flags_cascade_and_drive_selection() {
        let catalog = TierCatalog::build(
            BaseSettings::default(),
            [
                TierSpec::new("easy"),
                TierSpec::new("secret")
                    .with_overrides(SettingsOverrides::new().with_flag(FlagKey::IsHidden, true)),
                TierSpec::new("after"),
                TierSpec::new("shown")
                    .with_overrides(SettingsOverrides::new().with_flag(FlagKey::IsHidden, false)),
            ],
        );

        assert!(catalog.flag("after", FlagKey::IsHidden));
        let selectable: Vec<_> = catalog.selectable().map(Tier::id).collect();
        assert_eq!(selectable, vec!["easy", "shown"]);
    }

    #[test]
    fn explicit_flags_track_the_whole_chain() {
        let base = BaseSettings::new(
            &SettingsOverrides::new().with(SettingKey::DamageMultiplierFall, 0.5),
            BTreeMap::new(),
        );
        let catalog = TierCatalog::build(
            base,
            [
                TierSpec::new("easy"),
                TierSpec::new("hard").with_overrides(
                    SettingsOverrides::new().with(SettingKey::DamageMultiplierPhysical, 3.0),
                ),
            ],
        );

        assert!(catalog.is_explicit("easy", SettingKey::DamageMultiplierFall));
        assert!(!catalog.is_explicit("easy", SettingKey::DamageMultiplierPhysical));
        assert!(catalog.is_explicit("hard", SettingKey::DamageMultiplierPhysical));
    }

    #[test]
    fn unknown_tier_reads_base_values() {
        let catalog = abc();
        assert_eq!(catalog.value("Z", SettingKey::HealthMultiplier), 1.0);
    }
}
