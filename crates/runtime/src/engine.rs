//! Tier resolution facade.
//!
//! [`TierEngine`] is constructed once at startup and shared (`Arc`) with every
//! collaborator that needs a tier: combat, loot, leveling, spawning and admin
//! tooling. Reads go through the current configuration snapshot and never
//! block on I/O; mutations persist through the repositories before returning.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tier_content::{ConfigStore, LoadedConfig};
use tier_core::scaling::{EntityRef, SpawnOrigin};
use tier_core::{FALLBACK_TIER_ID, WorldTierResolver};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{ChangeGate, Result, RuntimeError, WorldTierSnapshot};
use crate::config::EngineConfig;
use crate::overrides::PlayerOverrideStore;
use crate::repository::{
    FilePlayerSettingsRepository, FileWorldTierRepository, PlayerSettingsRepository,
    WorldTierRecord, WorldTierRepository,
};
use crate::scaling::TierScaler;
use crate::workers::EliteSpawnQueue;

pub struct TierEngine {
    config: Arc<ConfigStore>,
    players: PlayerOverrideStore,
    world_repository: Arc<dyn WorldTierRepository>,
    admin_override: RwLock<Option<String>>,
    online: RwLock<HashSet<Uuid>>,
    last_change: Mutex<HashMap<Uuid, Instant>>,
    elite: EliteSpawnQueue,
    // Serializes reloads and admin override writes.
    admin_lock: Mutex<()>,
}

impl TierEngine {
    pub fn builder() -> TierEngineBuilder {
        TierEngineBuilder::new()
    }

    /// Opens the engine with file repositories under `config`'s root.
    pub fn open(config: EngineConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Current configuration snapshot.
    pub fn snapshot(&self) -> Arc<LoadedConfig> {
        self.config.snapshot()
    }

    /// Formulas bound to the current snapshot.
    pub fn scaler(&self) -> TierScaler {
        TierScaler::new(self.snapshot())
    }

    pub fn elite_queue(&self) -> &EliteSpawnQueue {
        &self.elite
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// The player's own tier; never empty.
    ///
    /// Valid override, else the configured default, else the first declared
    /// tier, else [`FALLBACK_TIER_ID`].
    pub fn player_tier(&self, player: Uuid) -> String {
        let snapshot = self.snapshot();
        self.player_tier_in(&snapshot, player)
    }

    fn player_tier_in(&self, snapshot: &LoadedConfig, player: Uuid) -> String {
        let catalog = &snapshot.catalog;
        self.players
            .tier(player)
            .and_then(|id| catalog.canonicalize(&id).map(str::to_string))
            .unwrap_or_else(|| default_tier(snapshot))
    }

    pub fn player_online(&self, player: Uuid) {
        self.online
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(player);
    }

    pub fn player_offline(&self, player: Uuid) {
        self.online
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&player);
        self.prune_cooldowns(Instant::now());
    }

    pub fn online_players(&self) -> Vec<Uuid> {
        self.online
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    /// Shared world tier for the players currently online.
    pub fn world_tier(&self) -> String {
        let snapshot = self.snapshot();
        self.world_tier_in(&snapshot)
    }

    fn world_tier_in(&self, snapshot: &LoadedConfig) -> String {
        let tiers: Vec<String> = self
            .online_players()
            .into_iter()
            .map(|player| self.player_tier_in(snapshot, player))
            .collect();
        let admin = self.world_tier_admin_override();
        WorldTierResolver::new(
            &snapshot.catalog,
            &snapshot.config.world,
            &snapshot.config.players.default_tier,
        )
        .with_admin_override(admin.as_deref())
        .resolve(tiers.iter().map(String::as_str))
        .map(|tier| tier.id().to_string())
        .unwrap_or_else(|| default_tier(snapshot))
    }

    /// Tier that applies to `player`: the world tier when enabled, else their own.
    pub fn effective_tier(&self, player: Uuid) -> String {
        let snapshot = self.snapshot();
        if snapshot.config.world.enabled {
            self.world_tier_in(&snapshot)
        } else {
            self.player_tier_in(&snapshot, player)
        }
    }

    /// Ids of tiers players may pick, in rank order.
    pub fn selectable_tiers(&self) -> Vec<String> {
        self.snapshot()
            .catalog
            .selectable()
            .map(|tier| tier.id().to_string())
            .collect()
    }

    // ------------------------------------------------------------------------
    // Player mutations
    // ------------------------------------------------------------------------

    /// Sets the player's tier. A blank id clears it.
    ///
    /// `Ok(false)` when changes are disabled or the id is unknown.
    pub fn set_player_tier(&self, player: Uuid, tier: &str) -> Result<bool> {
        if tier.trim().is_empty() {
            return self.clear_player_tier(player);
        }
        let snapshot = self.snapshot();
        if !snapshot.config.players.allow_change {
            return Ok(false);
        }
        let Some(canonical) = snapshot.catalog.canonicalize(tier) else {
            return Ok(false);
        };
        let canonical = canonical.to_string();
        self.players
            .update(player, |prefs| prefs.tier = Some(canonical.clone()))?;
        debug!(target: "tier::players", %player, tier = %canonical, "Player tier set");
        Ok(true)
    }

    /// Removes the player's override. `Ok(false)` if changes are disabled or none was set.
    pub fn clear_player_tier(&self, player: Uuid) -> Result<bool> {
        if !self.snapshot().config.players.allow_change {
            return Ok(false);
        }
        if self.players.tier(player).is_none() {
            return Ok(false);
        }
        self.players.update(player, |prefs| prefs.tier = None)?;
        debug!(target: "tier::players", %player, "Player tier cleared");
        Ok(true)
    }

    /// Flips badge visibility; returns the new value.
    pub fn toggle_badge(&self, player: Uuid) -> Result<bool> {
        let prefs = self
            .players
            .update(player, |prefs| prefs.show_badge = !prefs.show_badge)?;
        Ok(prefs.show_badge)
    }

    pub fn badge_visible(&self, player: Uuid) -> bool {
        self.players.get(player).show_badge
    }

    /// Flips percent display of tier values; returns the new value.
    pub fn toggle_tier_values_as_percent(&self, player: Uuid) -> Result<bool> {
        let prefs = self.players.update(player, |prefs| {
            prefs.show_tier_values_as_percent = !prefs.show_tier_values_as_percent
        })?;
        Ok(prefs.show_tier_values_as_percent)
    }

    pub fn tier_values_as_percent(&self, player: Uuid) -> bool {
        self.players.get(player).show_tier_values_as_percent
    }

    /// Players with a tier override and the stored id.
    pub fn overrides_snapshot(&self) -> HashMap<Uuid, String> {
        self.players.overrides_snapshot()
    }

    /// Whether `player` may switch to `tier` at `now`.
    ///
    /// `last_combat` is when the player last dealt or took damage.
    pub fn can_change_tier(
        &self,
        player: Uuid,
        tier: &str,
        last_combat: Option<Instant>,
        now: Instant,
    ) -> ChangeGate {
        let snapshot = self.snapshot();
        let rules = &snapshot.config.players;
        if !rules.allow_change {
            return ChangeGate::Disabled;
        }
        let Some(target) = snapshot
            .catalog
            .canonicalize(tier)
            .and_then(|id| snapshot.catalog.get(id))
        else {
            return ChangeGate::UnknownTier;
        };
        if !target.is_allowed() {
            return ChangeGate::TierNotAllowed;
        }
        if !rules.allow_change_in_combat
            && let Some(fought) = last_combat
            && now.saturating_duration_since(fought) < rules.combat_timeout
        {
            return ChangeGate::InCombat;
        }
        if rules.change_cooldown > Duration::ZERO
            && let Some(changed) = self.last_change(player)
        {
            let elapsed = now.saturating_duration_since(changed);
            if elapsed < rules.change_cooldown {
                return ChangeGate::Cooldown {
                    remaining: rules.change_cooldown - elapsed,
                };
            }
        }
        ChangeGate::Allowed
    }

    /// Applies a player-initiated change when the gate allows it and starts the cooldown.
    pub fn request_tier_change(
        &self,
        player: Uuid,
        tier: &str,
        last_combat: Option<Instant>,
        now: Instant,
    ) -> Result<ChangeGate> {
        let gate = self.can_change_tier(player, tier, last_combat, now);
        if gate.is_allowed() && self.set_player_tier(player, tier)? {
            self.prune_cooldowns(now);
            self.last_change
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(player, now);
        }
        Ok(gate)
    }

    /// Players whose change cooldown is still tracked.
    pub fn cooldowns_tracked(&self) -> usize {
        self.last_change
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Forgets change times whose cooldown has run out by `now`.
    fn prune_cooldowns(&self, now: Instant) {
        let cooldown = self.snapshot().config.players.change_cooldown;
        self.last_change
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, changed| now.saturating_duration_since(*changed) < cooldown);
    }

    fn last_change(&self, player: Uuid) -> Option<Instant> {
        self.last_change
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&player)
            .copied()
    }

    // ------------------------------------------------------------------------
    // World tier admin
    // ------------------------------------------------------------------------

    pub fn world_tier_admin_override(&self) -> Option<String> {
        self.admin_override
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Pins the world tier. `Ok(false)` for an unknown id.
    pub fn set_world_tier_admin_override(&self, tier: &str) -> Result<bool> {
        let snapshot = self.snapshot();
        let Some(canonical) = snapshot.catalog.canonicalize(tier) else {
            return Ok(false);
        };
        self.store_admin_override(Some(canonical.to_string()))?;
        info!(target: "tier::world", tier = canonical, "World tier admin override set");
        Ok(true)
    }

    /// Removes the pin. `Ok(false)` if none was set.
    pub fn clear_world_tier_admin_override(&self) -> Result<bool> {
        if self.world_tier_admin_override().is_none() {
            return Ok(false);
        }
        self.store_admin_override(None)?;
        info!(target: "tier::world", "World tier admin override cleared");
        Ok(true)
    }

    fn store_admin_override(&self, tier: Option<String>) -> Result<()> {
        let _admin = self
            .admin_lock
            .lock()
            .map_err(|_| RuntimeError::LockPoisoned)?;
        self.world_repository.save(&WorldTierRecord {
            admin_override_tier: tier.clone(),
        })?;
        *self
            .admin_override
            .write()
            .unwrap_or_else(PoisonError::into_inner) = tier;
        Ok(())
    }

    pub fn world_tier_snapshot(&self) -> WorldTierSnapshot {
        let snapshot = self.snapshot();
        let world = &snapshot.config.world;
        WorldTierSnapshot {
            enabled: world.enabled,
            mode: world.mode,
            resolved_tier: self.world_tier_in(&snapshot),
            fixed_tier: world.fixed_tier.clone(),
            admin_override: self.world_tier_admin_override(),
            scaled_factor: world.sanitized_factor(),
            use_all_online_players: world.scaled_use_all_online_players,
        }
    }

    // ------------------------------------------------------------------------
    // Elite spawns
    // ------------------------------------------------------------------------

    /// Queues an elite roll for a spawn in `world` under `tier`, if it qualifies.
    pub fn on_entity_spawn(
        &self,
        world: &str,
        tier: &str,
        entity: EntityRef,
        origin: SpawnOrigin,
        is_player: bool,
    ) -> bool {
        match self
            .scaler()
            .elite_task(tier, entity, origin, is_player, Instant::now())
        {
            Some(task) => {
                self.elite.enqueue(world, task);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Reload
    // ------------------------------------------------------------------------

    /// Re-reads configuration from disk and swaps it in.
    ///
    /// On error the previous snapshot stays active.
    pub fn reload(&self) -> Result<Arc<LoadedConfig>> {
        let _admin = self
            .admin_lock
            .lock()
            .map_err(|_| RuntimeError::LockPoisoned)?;
        let loaded = self.config.reload()?;
        self.players
            .set_percent_default(loaded.config.players.tier_values_as_percent);
        self.elite.set_config(loaded.config.elite.queue);

        // The override is kept; the resolver skips ids the catalog no longer has.
        if let Some(id) = self.world_tier_admin_override()
            && loaded.catalog.canonicalize(&id).is_none()
        {
            warn!(target: "tier::world", tier = %id, "World tier admin override no longer matches a tier");
        }
        Ok(loaded)
    }

    /// Runs [`TierEngine::reload`] on a blocking worker.
    pub async fn reload_in_background(self: &Arc<Self>) -> Result<Arc<LoadedConfig>> {
        let engine = Arc::clone(self);
        tokio::task::spawn_blocking(move || engine.reload())
            .await
            .map_err(RuntimeError::WorkerJoin)?
    }
}

/// Configured default tier, else the first declared, else [`FALLBACK_TIER_ID`].
fn default_tier(snapshot: &LoadedConfig) -> String {
    let catalog = &snapshot.catalog;
    catalog
        .canonicalize(&snapshot.config.players.default_tier)
        .or_else(|| catalog.first().map(|tier| tier.id()))
        .unwrap_or(FALLBACK_TIER_ID)
        .to_string()
}

/// Builder for [`TierEngine`].
///
/// Components left unset default to the file-backed ones under the
/// configuration root.
#[derive(Default)]
pub struct TierEngineBuilder {
    config: Option<EngineConfig>,
    config_store: Option<Arc<ConfigStore>>,
    player_repository: Option<Arc<dyn PlayerSettingsRepository>>,
    world_repository: Option<Arc<dyn WorldTierRepository>>,
}

impl TierEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses an already loaded store instead of loading from `config`.
    pub fn config_store(mut self, store: Arc<ConfigStore>) -> Self {
        self.config_store = Some(store);
        self
    }

    pub fn player_repository(mut self, repository: Arc<dyn PlayerSettingsRepository>) -> Self {
        self.player_repository = Some(repository);
        self
    }

    pub fn world_repository(mut self, repository: Arc<dyn WorldTierRepository>) -> Self {
        self.world_repository = Some(repository);
        self
    }

    pub fn build(self) -> Result<TierEngine> {
        let config = match self.config_store {
            Some(store) => store,
            None => {
                let engine_config = self.config.unwrap_or_default();
                Arc::new(ConfigStore::load_or_create(engine_config.paths)?)
            }
        };
        let paths = config.paths().clone();

        let player_repository = self.player_repository.unwrap_or_else(|| {
            Arc::new(FilePlayerSettingsRepository::new(
                &paths.player_settings,
                &paths.legacy_player_overrides,
            ))
        });
        let world_repository = self
            .world_repository
            .unwrap_or_else(|| Arc::new(FileWorldTierRepository::new(&paths.world_tier)));

        let snapshot = config.snapshot();
        let (players, report) = PlayerOverrideStore::open(
            player_repository,
            snapshot.config.players.tier_values_as_percent,
            |id| snapshot.catalog.canonicalize(id).is_some(),
        )?;
        info!(
            target: "tier::players",
            loaded = report.loaded,
            skipped = report.skipped,
            migrated = report.migrated,
            "Loaded player tier preferences"
        );

        let admin_override = world_repository
            .load()?
            .and_then(|record| record.admin_override_tier)
            .and_then(|id| {
                let canonical = snapshot.catalog.canonicalize(&id).map(str::to_string);
                if canonical.is_none() {
                    warn!(target: "tier::world", tier = %id, "Ignoring unknown world tier admin override");
                }
                canonical
            });

        Ok(TierEngine {
            elite: EliteSpawnQueue::new(snapshot.config.elite.queue),
            config,
            players,
            world_repository,
            admin_override: RwLock::new(admin_override),
            online: RwLock::new(HashSet::new()),
            last_change: Mutex::new(HashMap::new()),
            admin_lock: Mutex::new(()),
        })
    }
}
