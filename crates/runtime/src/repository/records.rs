//! Persisted record shapes.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One player's entry in the player-settings document.
///
/// Every field is optional on disk; a missing preference means the document
/// predates it and is rewritten with the field filled in. Each field is read on
/// its own, so a wrongly typed value reads as missing and the rest survive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSettingsRecord {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub difficulty: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub show_badge: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub show_tier_values_as_percent: Option<bool>,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Value::deserialize(deserializer)?
        .as_str()
        .map(str::to_owned))
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(value) => Some(value),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

impl PlayerSettingsRecord {
    /// Whether any preference field was absent.
    pub fn is_incomplete(&self) -> bool {
        self.show_badge.is_none() || self.show_tier_values_as_percent.is_none()
    }
}

/// Player entry as read from disk, before the key is validated.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StoredPlayerEntry {
    /// Pre-migration shape: the value is the tier id alone.
    Legacy(String),
    Settings(PlayerSettingsRecord),
}

/// Raw `(key, entry)` pairs in document order.
pub type PlayerEntries = Vec<(String, StoredPlayerEntry)>;

/// The world-tier document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldTierRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_override_tier: Option<String>,
}
