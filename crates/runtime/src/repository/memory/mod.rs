//! In-memory repository implementations for testing and development.

mod player_settings;
mod world_tier;

pub use player_settings::InMemoryPlayerSettingsRepo;
pub use world_tier::InMemoryWorldTierRepo;
