//! Outcome of a tier change request.

use std::time::Duration;

/// Whether a player may switch tiers right now, and if not, why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeGate {
    Allowed,
    /// Tier changes are switched off globally.
    Disabled,
    /// The requested tier does not exist.
    UnknownTier,
    /// The requested tier exists but is marked `is_allowed = false`.
    TierNotAllowed,
    /// The player fought within the combat timeout.
    InCombat,
    /// The player changed tier too recently.
    Cooldown { remaining: Duration },
}

impl ChangeGate {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ChangeGate::Allowed)
    }

    /// Remaining cooldown rounded up to whole seconds, at least one.
    pub fn remaining_secs(&self) -> Option<u64> {
        match self {
            ChangeGate::Cooldown { remaining } => {
                Some(remaining.as_millis().div_ceil(1000).max(1) as u64)
            }
            _ => None,
        }
    }
}
