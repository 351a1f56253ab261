//! User-facing notification synthesis.
//!
//! The chain reports most outcomes indirectly (stat deltas, encounter
//! codes); these helpers turn them into the toast messages the UI shows.

use serde::{Deserialize, Serialize};

use game_types::{EncounterKind, StatDelta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Toast for a gift (non-beast) encounter generated by a move.
pub fn gift_encounter(kind: EncounterKind) -> Notification {
    match kind {
        EncounterKind::FreeHealth => Notification::success("💚 Health restored!"),
        EncounterKind::AttackPoints => Notification::success("⚔️ Attack power increased!"),
        EncounterKind::ReducedDamage => Notification::success("🛡️ Damage reduction gained!"),
        EncounterKind::FreeAttack => Notification::success("🎯 Free Attack ability gained!"),
        EncounterKind::FreeFlee => Notification::success("🏃 Free Flee ability gained!"),
        EncounterKind::FreeRoam => Notification::info("🌿 Peaceful path - no encounter!"),
        EncounterKind::Werewolf | EncounterKind::Vampire => {
            Notification::info("🎁 Gift encounter!")
        }
    }
}

/// How a beast encounter actually ended, learned from the stat refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatResult {
    Victory,
    Fled,
    Died,
}

/// Toast for a resolved fight or flee.
pub fn combat_result(result: CombatResult, damage_taken: u16, used_free_ability: bool) -> Notification {
    match result {
        CombatResult::Victory => {
            if used_free_ability {
                Notification::success("⚔️ Victory! Beast defeated! (Free Attack - no damage!)")
            } else if damage_taken == 0 {
                Notification::success("⚔️ Victory! Beast defeated!")
            } else {
                Notification::warning(format!(
                    "⚔️ Victory! Beast defeated! Took {damage_taken} damage."
                ))
            }
        }
        CombatResult::Fled => {
            if used_free_ability {
                Notification::success("🏃 Escaped! (Free Flee - no damage!)")
            } else if damage_taken == 0 {
                Notification::success("🏃 Escaped successfully!")
            } else {
                Notification::warning(format!("🏃 Escaped! Took {damage_taken} damage."))
            }
        }
        CombatResult::Died => Notification::error("💀 You died! Game over."),
    }
}

/// Toasts for the stat changes observed by a background refresh.
///
/// Best-effort: an empty delta produces no notifications at all.
pub fn stat_changes(delta: &StatDelta) -> Vec<Notification> {
    let mut notifications = Vec::new();

    if delta.health > 0 {
        notifications.push(Notification::success(format!("❤️ +{} Health!", delta.health)));
    } else if delta.health < 0 {
        notifications.push(Notification::warning(format!("❤️ {} Health", delta.health)));
    }

    if delta.attack_points > 0 {
        notifications.push(Notification::success(format!(
            "⚔️ +{} Attack!",
            delta.attack_points
        )));
    } else if delta.attack_points < 0 {
        notifications.push(Notification::warning(format!(
            "⚔️ {} Attack",
            delta.attack_points
        )));
    }

    if delta.damage_points > 0 {
        notifications.push(Notification::success(format!(
            "🛡️ +{} Damage reduction!",
            delta.damage_points
        )));
    } else if delta.damage_points < 0 {
        notifications.push(Notification::warning(format!(
            "🛡️ {} Damage reduction",
            delta.damage_points
        )));
    }

    if delta.gained_free_attack {
        notifications.push(Notification::success(
            "✨ Free Attack ability gained! Next fight will take no damage!",
        ));
    }
    if delta.gained_free_flee {
        notifications.push(Notification::success(
            "✨ Free Flee ability gained! Next flee will take no damage!",
        ));
    }

    notifications
}
