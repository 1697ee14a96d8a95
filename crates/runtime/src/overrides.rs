//! Per-player tier overrides and display preferences.
//!
//! Entries live in an in-memory map read without coordination; every mutation
//! rewrites the whole document under a dedicated write lock so concurrent
//! writers never interleave partial files. Players whose preferences are all
//! back at their defaults are dropped from the map and from disk.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use uuid::Uuid;

use crate::api::{Result, RuntimeError};
use crate::repository::{
    PlayerEntries, PlayerSettingsRecord, PlayerSettingsRepository, StoredPlayerEntry,
};

/// One player's preferences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerPreferences {
    /// Chosen tier id; `None` follows the configured default.
    pub tier: Option<String>,
    pub show_badge: bool,
    pub show_tier_values_as_percent: bool,
}

impl PlayerPreferences {
    pub const DEFAULT_SHOW_BADGE: bool = true;

    /// Preferences of a player who never changed anything.
    pub fn defaults(show_tier_values_as_percent: bool) -> Self {
        Self {
            tier: None,
            show_badge: Self::DEFAULT_SHOW_BADGE,
            show_tier_values_as_percent,
        }
    }

    fn differs_from_defaults(&self, percent_default: bool) -> bool {
        self.tier.is_some()
            || self.show_badge != Self::DEFAULT_SHOW_BADGE
            || self.show_tier_values_as_percent != percent_default
    }

    fn to_record(&self) -> PlayerSettingsRecord {
        PlayerSettingsRecord {
            difficulty: self.tier.clone(),
            show_badge: Some(self.show_badge),
            show_tier_values_as_percent: Some(self.show_tier_values_as_percent),
        }
    }
}

/// Result of reading the repository at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
    /// The legacy document was read and rewritten in the current format.
    pub migrated: bool,
    /// The current document was rewritten to fill missing fields.
    pub rewritten: bool,
}

pub struct PlayerOverrideStore {
    repository: Arc<dyn PlayerSettingsRepository>,
    entries: RwLock<HashMap<Uuid, PlayerPreferences>>,
    write_lock: Mutex<()>,
    percent_default: AtomicBool,
}

impl PlayerOverrideStore {
    /// Loads entries, migrating the legacy document when no current one exists.
    ///
    /// `is_known_tier` filters stored tier ids; unknown ids are discarded.
    pub fn open(
        repository: Arc<dyn PlayerSettingsRepository>,
        percent_default: bool,
        is_known_tier: impl Fn(&str) -> bool,
    ) -> Result<(Self, LoadReport)> {
        let store = Self {
            repository,
            entries: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
            percent_default: AtomicBool::new(percent_default),
        };
        let report = store.load(&is_known_tier)?;
        Ok((store, report))
    }

    fn load(&self, is_known_tier: &dyn Fn(&str) -> bool) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        let (raw, from_legacy) = match self.repository.load()? {
            Some(entries) => (entries, false),
            None => match self.repository.load_legacy()? {
                Some(entries) => (entries, true),
                None => return Ok(report),
            },
        };

        let mut needs_save = false;
        let parsed = self.parse_entries(raw, is_known_tier, &mut report, &mut needs_save);
        *self
            .entries
            .write()
            .map_err(|_| RuntimeError::LockPoisoned)? = parsed;

        if from_legacy {
            self.persist()?;
            report.migrated = true;
            tracing::info!(target: "tier::players", players = report.loaded, "Migrated legacy player overrides");
        } else if needs_save {
            self.persist()?;
            report.rewritten = true;
        }
        Ok(report)
    }

    fn parse_entries(
        &self,
        raw: PlayerEntries,
        is_known_tier: &dyn Fn(&str) -> bool,
        report: &mut LoadReport,
        needs_save: &mut bool,
    ) -> HashMap<Uuid, PlayerPreferences> {
        let percent_default = self.percent_default();
        let known = |tier: Option<String>| tier.filter(|id| is_known_tier(id.as_str()));
        let mut parsed = HashMap::new();

        for (key, entry) in raw {
            let Ok(player) = Uuid::parse_str(key.trim()) else {
                tracing::warn!(target: "tier::players", key = %key, "Skipping player settings with invalid UUID");
                report.skipped += 1;
                continue;
            };

            let prefs = match entry {
                StoredPlayerEntry::Legacy(tier) => {
                    *needs_save = true;
                    let Some(tier) = known(Some(tier)) else {
                        report.skipped += 1;
                        continue;
                    };
                    PlayerPreferences {
                        tier: Some(tier),
                        ..PlayerPreferences::defaults(percent_default)
                    }
                }
                StoredPlayerEntry::Settings(record) => {
                    if record.is_incomplete() {
                        *needs_save = true;
                    }
                    PlayerPreferences {
                        tier: known(record.difficulty),
                        show_badge: record
                            .show_badge
                            .unwrap_or(PlayerPreferences::DEFAULT_SHOW_BADGE),
                        show_tier_values_as_percent: record
                            .show_tier_values_as_percent
                            .unwrap_or(percent_default),
                    }
                }
            };

            if prefs.differs_from_defaults(percent_default) {
                parsed.insert(player, prefs);
                report.loaded += 1;
            }
        }
        parsed
    }

    pub fn percent_default(&self) -> bool {
        self.percent_default.load(Ordering::Relaxed)
    }

    /// Updates the default used for players who never toggled the percent display.
    pub fn set_percent_default(&self, value: bool) {
        self.percent_default.store(value, Ordering::Relaxed);
    }

    /// Preferences for `player`, defaults if none are stored.
    pub fn get(&self, player: Uuid) -> PlayerPreferences {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(&player).cloned())
            .unwrap_or_else(|| PlayerPreferences::defaults(self.percent_default()))
    }

    /// Stored tier id, unvalidated.
    pub fn tier(&self, player: Uuid) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(&player).and_then(|p| p.tier.clone()))
    }

    /// Players with a tier override and the stored id.
    pub fn overrides_snapshot(&self) -> HashMap<Uuid, String> {
        self.entries
            .read()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(player, prefs)| prefs.tier.clone().map(|tier| (*player, tier)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Applies `change` to the player's preferences and persists the document.
    ///
    /// Returns the preferences after the change.
    pub fn update(
        &self,
        player: Uuid,
        change: impl FnOnce(&mut PlayerPreferences),
    ) -> Result<PlayerPreferences> {
        let _write = self
            .write_lock
            .lock()
            .map_err(|_| RuntimeError::LockPoisoned)?;
        let percent_default = self.percent_default();

        let updated = {
            let mut entries = self
                .entries
                .write()
                .map_err(|_| RuntimeError::LockPoisoned)?;
            let mut prefs = entries
                .get(&player)
                .cloned()
                .unwrap_or_else(|| PlayerPreferences::defaults(percent_default));
            change(&mut prefs);
            if prefs.differs_from_defaults(percent_default) {
                entries.insert(player, prefs.clone());
            } else {
                entries.remove(&player);
            }
            prefs
        };

        self.persist()?;
        Ok(updated)
    }

    fn persist(&self) -> Result<()> {
        let percent_default = self.percent_default();
        let records: BTreeMap<Uuid, PlayerSettingsRecord> = self
            .entries
            .read()
            .map_err(|_| RuntimeError::LockPoisoned)?
            .iter()
            .filter(|(_, prefs)| prefs.differs_from_defaults(percent_default))
            .map(|(player, prefs)| (*player, prefs.to_record()))
            .collect();
        self.repository.save(&records)?;
        Ok(())
    }

    /// Number of players with stored preferences.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryPlayerSettingsRepo;

    fn known(id: &str) -> bool {
        matches!(id, "easy" | "normal" | "hard")
    }

    fn open(repo: Arc<InMemoryPlayerSettingsRepo>) -> (PlayerOverrideStore, LoadReport) {
        PlayerOverrideStore::open(repo, true, known).unwrap()
    }

    #[test]
    fn reverting_to_defaults_drops_the_entry() {
        let repo = Arc::new(InMemoryPlayerSettingsRepo::new());
        let (store, _) = open(repo.clone());
        let player = Uuid::new_v4();

        store.update(player, |p| p.tier = Some("hard".into())).unwrap();
        assert_eq!(store.tier(player).as_deref(), Some("hard"));
        assert_eq!(store.len(), 1);

        store.update(player, |p| p.tier = None).unwrap();
        assert!(store.is_empty());
        assert_eq!(repo.load().unwrap(), Some(Vec::new()));
        assert_eq!(repo.saves(), 2);
    }

    #[test]
    fn legacy_document_is_migrated() {
        let player = Uuid::new_v4();
        let repo = Arc::new(InMemoryPlayerSettingsRepo::with_legacy(vec![
            (player.to_string(), StoredPlayerEntry::Legacy("hard".into())),
            ("not-a-uuid".into(), StoredPlayerEntry::Legacy("easy".into())),
            (Uuid::new_v4().to_string(), StoredPlayerEntry::Legacy("gone".into())),
        ]));

        let (store, report) = open(repo.clone());

        assert!(report.migrated);
        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(store.tier(player).as_deref(), Some("hard"));
        let current = repo.load().unwrap().unwrap();
        assert_eq!(current.len(), 1);
        assert!(matches!(current[0].1, StoredPlayerEntry::Settings(_)));
    }

    #[test]
    fn incomplete_records_are_rewritten() {
        let player = Uuid::new_v4();
        let repo = Arc::new(InMemoryPlayerSettingsRepo::with_entries(vec![(
            player.to_string(),
            StoredPlayerEntry::Settings(PlayerSettingsRecord {
                difficulty: Some("easy".into()),
                show_badge: None,
                show_tier_values_as_percent: Some(true),
            }),
        )]));

        let (store, report) = open(repo.clone());

        assert!(report.rewritten);
        assert_eq!(repo.saves(), 1);
        assert!(store.get(player).show_badge);
    }

    #[test]
    fn complete_records_are_not_rewritten() {
        let player = Uuid::new_v4();
        let repo = Arc::new(InMemoryPlayerSettingsRepo::with_entries(vec![(
            player.to_string(),
            StoredPlayerEntry::Settings(PlayerSettingsRecord {
                difficulty: None,
                show_badge: Some(false),
                show_tier_values_as_percent: Some(true),
            }),
        )]));

        let (store, report) = open(repo.clone());

        assert!(!report.rewritten);
        assert_eq!(repo.saves(), 0);
        assert!(!store.get(player).show_badge);
        assert!(store.overrides_snapshot().is_empty());
    }
}
