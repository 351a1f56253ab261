//! Player stats and snapshot diffing.

use serde::{Deserialize, Serialize};

/// Default starting health, mirroring the contract's DEFAULT_PLAYER_HEALTH.
pub const MAX_PLAYER_HEALTH: u16 = 100;

/// Client-observed player stats.
///
/// Mutated only by applying results of finalized transactions or an indexer
/// refresh; never computed speculatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub health: u16,
    pub attack_points: u16,
    pub damage_points: u16,
    pub has_free_attack: bool,
    pub has_free_flee: bool,
}

impl PlayerState {
    /// Fresh-session stats before any encounter.
    pub fn starting() -> Self {
        Self {
            health: MAX_PLAYER_HEALTH,
            attack_points: 0,
            damage_points: 0,
            has_free_attack: false,
            has_free_flee: false,
        }
    }

    /// Health zero is the terminal loss condition.
    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Field-wise diff from `self` (the older snapshot) to `newer`.
    ///
    /// Used after a background stat refresh to synthesize user-facing
    /// notifications; gift encounters silently mutate stats on-chain, so the
    /// diff is the only way the client learns what happened.
    pub fn diff(&self, newer: &PlayerState) -> StatDelta {
        StatDelta {
            health: i32::from(newer.health) - i32::from(self.health),
            attack_points: i32::from(newer.attack_points) - i32::from(self.attack_points),
            damage_points: i32::from(newer.damage_points) - i32::from(self.damage_points),
            gained_free_attack: !self.has_free_attack && newer.has_free_attack,
            gained_free_flee: !self.has_free_flee && newer.has_free_flee,
        }
    }
}

/// Signed stat changes between two player snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatDelta {
    pub health: i32,
    pub attack_points: i32,
    pub damage_points: i32,
    pub gained_free_attack: bool,
    pub gained_free_flee: bool,
}

impl StatDelta {
    pub fn is_empty(&self) -> bool {
        *self == StatDelta::default()
    }
}
