//! Encounter model: kinds, beast stats, and the two-phase resolution state.

use serde::{Deserialize, Serialize};
use strum::FromRepr;

/// Encounter kinds as emitted by the contract (wire codes 1..=8).
///
/// Werewolf and Vampire are forced encounters that block further movement
/// until resolved with fight or flee; the rest are passive gifts resolved by
/// acknowledgement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr, strum::Display,
)]
#[repr(u8)]
pub enum EncounterKind {
    Werewolf = 1,
    Vampire = 2,
    FreeHealth = 3,
    AttackPoints = 4,
    ReducedDamage = 5,
    FreeAttack = 6,
    FreeFlee = 7,
    FreeRoam = 8,
}

impl EncounterKind {
    /// Decodes a wire code; anything outside 1..=8 is not an encounter.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::from_repr(code)
    }

    /// Beast encounters must be fought or fled before the player may move.
    pub fn is_beast(&self) -> bool {
        matches!(self, EncounterKind::Werewolf | EncounterKind::Vampire)
    }

    /// The beast kind this encounter is expected to produce in the indexer.
    pub fn beast_kind(&self) -> Option<BeastKind> {
        match self {
            EncounterKind::Werewolf => Some(BeastKind::Werewolf),
            EncounterKind::Vampire => Some(BeastKind::Vampire),
            _ => None,
        }
    }
}

/// Beast variants (wire codes 1..=2; 0 is the not-yet-propagated sentinel).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr, strum::Display,
)]
#[repr(u8)]
pub enum BeastKind {
    Werewolf = 1,
    Vampire = 2,
}

impl BeastKind {
    pub fn from_code(code: u8) -> Option<Self> {
        Self::from_repr(code)
    }
}

/// Combat parameters for a beast encounter, fetched asynchronously from the
/// indexer after the encounter is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeastStats {
    pub kind: BeastKind,
    pub attack_points: u16,
    pub damage_points: u16,
}

/// Resolution phase of the active encounter.
///
/// `Resolving` marks the interval between submitting a fight/flee
/// transaction and learning its outcome. The speculative "clear" is
/// represented as an explicit state so a revert can restore `Engaged`
/// instead of silently losing the encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterPhase {
    Engaged,
    Resolving,
}

/// The active encounter, if any.
///
/// `beast` is legitimately `None` for an interval after creation while the
/// indexer catches up; the encounter is displayed immediately and enriched
/// asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterState {
    pub kind: EncounterKind,
    pub beast: Option<BeastStats>,
    pub phase: EncounterPhase,
}

impl EncounterState {
    pub fn new(kind: EncounterKind) -> Self {
        Self {
            kind,
            beast: None,
            phase: EncounterPhase::Engaged,
        }
    }

    /// Whether this encounter blocks movement until fought or fled.
    pub fn requires_resolution(&self) -> bool {
        self.kind.is_beast()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_outside_range_are_rejected() {
        assert_eq!(EncounterKind::from_code(0), None);
        assert_eq!(EncounterKind::from_code(9), None);
        assert_eq!(EncounterKind::from_code(1), Some(EncounterKind::Werewolf));
        assert_eq!(EncounterKind::from_code(8), Some(EncounterKind::FreeRoam));
    }

    #[test]
    fn only_beasts_require_resolution() {
        assert!(EncounterState::new(EncounterKind::Werewolf).requires_resolution());
        assert!(EncounterState::new(EncounterKind::Vampire).requires_resolution());
        assert!(!EncounterState::new(EncounterKind::FreeHealth).requires_resolution());
        assert!(!EncounterState::new(EncounterKind::FreeRoam).requires_resolution());
    }

    #[test]
    fn beast_kind_matches_encounter_kind() {
        assert_eq!(
            EncounterKind::Vampire.beast_kind(),
            Some(BeastKind::Vampire)
        );
        assert_eq!(EncounterKind::FreeFlee.beast_kind(), None);
        assert_eq!(BeastKind::from_code(0), None);
    }

    #[test]
    fn new_encounter_starts_engaged_without_stats() {
        let encounter = EncounterState::new(EncounterKind::Werewolf);
        assert_eq!(encounter.phase, EncounterPhase::Engaged);
        assert!(encounter.beast.is_none());
    }
}
