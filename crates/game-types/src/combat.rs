//! Client-side combat outcome prediction.
//!
//! Advisory previews for the confirmation UI under the one-hit-kill beast
//! model: fighting always defeats the beast, fleeing always escapes, and the
//! player takes the beast's damage unless the matching free ability is held.
//! Predictions are never written to the store; authoritative outcomes come
//! from the chain.

use crate::encounter::BeastStats;
use crate::player::{MAX_PLAYER_HEALTH, PlayerState};

/// Predicted result of fighting the active beast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FightOutcome {
    pub damage_taken: u16,
    pub health_after: u16,
    pub died: bool,
    pub uses_free_attack: bool,
}

/// Predicted result of fleeing the active beast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleeOutcome {
    pub damage_taken: u16,
    pub health_after: u16,
    pub died: bool,
    pub uses_free_flee: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatPrediction {
    pub fight: FightOutcome,
    pub flee: FleeOutcome,
}

/// Predicts both resolution outcomes for the given player and beast.
///
/// Free abilities are consumed automatically by the contract when held, so
/// the prediction assumes they will be used.
pub fn predict_combat(player: &PlayerState, beast: &BeastStats) -> CombatPrediction {
    let fight_damage = if player.has_free_attack {
        0
    } else {
        beast.damage_points
    };
    let flee_damage = if player.has_free_flee {
        0
    } else {
        beast.damage_points
    };

    let fight_health = player.health.saturating_sub(fight_damage);
    let flee_health = player.health.saturating_sub(flee_damage);

    CombatPrediction {
        fight: FightOutcome {
            damage_taken: fight_damage,
            health_after: fight_health,
            died: fight_health == 0,
            uses_free_attack: player.has_free_attack,
        },
        flee: FleeOutcome {
            damage_taken: flee_damage,
            health_after: flee_health,
            died: flee_health == 0,
            uses_free_flee: player.has_free_flee,
        },
    }
}

/// Whether a health value is in the critical range (below 25% of max).
pub fn is_critical_health(health: u16) -> bool {
    health < MAX_PLAYER_HEALTH / 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::BeastKind;

    fn beast(damage: u16) -> BeastStats {
        BeastStats {
            kind: BeastKind::Werewolf,
            attack_points: 5,
            damage_points: damage,
        }
    }

    #[test]
    fn free_attack_prevents_fight_damage() {
        let player = PlayerState {
            health: 50,
            attack_points: 0,
            damage_points: 0,
            has_free_attack: true,
            has_free_flee: false,
        };

        let prediction = predict_combat(&player, &beast(30));
        assert_eq!(prediction.fight.damage_taken, 0);
        assert_eq!(prediction.fight.health_after, 50);
        assert!(prediction.fight.uses_free_attack);
        // Fleeing still takes full damage.
        assert_eq!(prediction.flee.damage_taken, 30);
        assert_eq!(prediction.flee.health_after, 20);
    }

    #[test]
    fn lethal_damage_saturates_at_zero() {
        let player = PlayerState {
            health: 10,
            attack_points: 0,
            damage_points: 0,
            has_free_attack: false,
            has_free_flee: false,
        };

        let prediction = predict_combat(&player, &beast(40));
        assert_eq!(prediction.fight.health_after, 0);
        assert!(prediction.fight.died);
        assert!(prediction.flee.died);
    }

    #[test]
    fn critical_health_threshold() {
        assert!(is_critical_health(0));
        assert!(is_critical_health(24));
        assert!(!is_critical_health(25));
        assert!(!is_critical_health(MAX_PLAYER_HEALTH));
    }
}
