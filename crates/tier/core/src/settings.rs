//! Dense per-tier setting tables and the sparse overrides they are built from.
use std::collections::BTreeMap;

use strum::{EnumCount, IntoEnumIterator};

use crate::keys::{FlagKey, SettingKey};

/// Sparse set of values explicitly written by one document section.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsOverrides {
    values: BTreeMap<SettingKey, f64>,
    is_allowed: Option<bool>,
    is_hidden: Option<bool>,
}

impl SettingsOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: SettingKey, value: f64) -> &mut Self {
        self.values.insert(key, value);
        self
    }

    pub fn with(mut self, key: SettingKey, value: f64) -> Self {
        self.set(key, value);
        self
    }

    pub fn set_flag(&mut self, key: FlagKey, value: bool) -> &mut Self {
        match key {
            FlagKey::IsAllowed => self.is_allowed = Some(value),
            FlagKey::IsHidden => self.is_hidden = Some(value),
        }
        self
    }

    pub fn with_flag(mut self, key: FlagKey, value: bool) -> Self {
        self.set_flag(key, value);
        self
    }

    pub fn get(&self, key: SettingKey) -> Option<f64> {
        self.values.get(&key).copied()
    }

    pub fn flag(&self, key: FlagKey) -> Option<bool> {
        match key {
            FlagKey::IsAllowed => self.is_allowed,
            FlagKey::IsHidden => self.is_hidden,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SettingKey, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.is_allowed.is_none() && self.is_hidden.is_none()
    }
}

/// Fully resolved values for one tier.
///
/// `explicit[k]` records whether any document section at or before this tier
/// (base included) wrote key `k`; otherwise the value is the built-in default.
#[derive(Clone, Debug, PartialEq)]
pub struct TierSettings {
    values: [f64; SettingKey::COUNT],
    explicit: [bool; SettingKey::COUNT],
    is_allowed: bool,
    is_hidden: bool,
}

impl TierSettings {
    /// Built-in defaults with nothing marked explicit.
    pub fn defaults() -> Self {
        let mut values = [1.0; SettingKey::COUNT];
        for key in SettingKey::iter() {
            values[key.index()] = key.default_value();
        }
        Self {
            values,
            explicit: [false; SettingKey::COUNT],
            is_allowed: FlagKey::IsAllowed.default_value(),
            is_hidden: FlagKey::IsHidden.default_value(),
        }
    }

    /// Returns a copy of `self` with only the keys present in `overrides` replaced.
    pub fn cascade(&self, overrides: &SettingsOverrides) -> Self {
        let mut next = self.clone();
        for (key, value) in overrides.iter() {
            next.values[key.index()] = value;
            next.explicit[key.index()] = true;
        }
        if let Some(allowed) = overrides.flag(FlagKey::IsAllowed) {
            next.is_allowed = allowed;
        }
        if let Some(hidden) = overrides.flag(FlagKey::IsHidden) {
            next.is_hidden = hidden;
        }
        next
    }

    #[inline]
    pub fn get(&self, key: SettingKey) -> f64 {
        self.values[key.index()]
    }

    #[inline]
    pub fn is_explicit(&self, key: SettingKey) -> bool {
        self.explicit[key.index()]
    }

    pub fn flag(&self, key: FlagKey) -> bool {
        match key {
            FlagKey::IsAllowed => self.is_allowed,
            FlagKey::IsHidden => self.is_hidden,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SettingKey, f64)> + '_ {
        SettingKey::iter().map(|key| (key, self.values[key.index()]))
    }
}

impl Default for TierSettings {
    fn default() -> Self {
        Self::defaults()
    }
}

/// The `base` section: cascade root plus fallbacks for unrecognized keys.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseSettings {
    settings: TierSettings,
    extras: BTreeMap<String, f64>,
}

impl BaseSettings {
    pub fn new(overrides: &SettingsOverrides, extras: BTreeMap<String, f64>) -> Self {
        Self {
            settings: TierSettings::defaults().cascade(overrides),
            extras,
        }
    }

    pub fn settings(&self) -> &TierSettings {
        &self.settings
    }

    /// Numeric base value for a key outside the recognized set. Missing keys read as 1.0.
    pub fn extra(&self, key: &str) -> f64 {
        self.extras.get(key).copied().unwrap_or(1.0)
    }

    pub fn extras(&self) -> &BTreeMap<String, f64> {
        &self.extras
    }
}

impl Default for BaseSettings {
    fn default() -> Self {
        Self::new(&SettingsOverrides::default(), BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_replaces_only_present_keys() {
        let base = TierSettings::defaults();
        let next = base.cascade(&SettingsOverrides::new().with(SettingKey::HealthMultiplier, 2.5));

        assert_eq!(next.get(SettingKey::HealthMultiplier), 2.5);
        assert!(next.is_explicit(SettingKey::HealthMultiplier));
        assert_eq!(next.get(SettingKey::ArmorMultiplier), 1.0);
        assert!(!next.is_explicit(SettingKey::ArmorMultiplier));
    }

    #[test]
    fn flags_cascade_independently() {
        let hidden = TierSettings::defaults()
            .cascade(&SettingsOverrides::new().with_flag(FlagKey::IsHidden, true));
        let later = hidden.cascade(&SettingsOverrides::new());

        assert!(later.flag(FlagKey::IsHidden));
        assert!(later.flag(FlagKey::IsAllowed));
    }

    #[test]
    fn elite_chances_default_to_absent() {
        let defaults = TierSettings::defaults();
        assert_eq!(defaults.get(SettingKey::EliteMobsChanceRare), 0.0);
        assert_eq!(defaults.get(SettingKey::EliteMobsChanceMultiplier), 1.0);
    }

    #[test]
    fn unknown_base_keys_fall_back_to_one() {
        let mut extras = BTreeMap::new();
        extras.insert("custom_bonus".to_string(), 3.0);
        let base = BaseSettings::new(&SettingsOverrides::new(), extras);

        assert_eq!(base.extra("custom_bonus"), 3.0);
        assert_eq!(base.extra("missing"), 1.0);
    }
}
