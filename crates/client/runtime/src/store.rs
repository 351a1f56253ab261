//! The single source of truth for client-observed game state.
//!
//! [`GameStateStore`] is owned exclusively by the session worker; serialized
//! command handling is what enforces the single-writer-per-field discipline.
//! Setters are the only mutation path, and every setter that touches
//! position or status runs the shared win-coherence correction so the
//! displayed status can never drift from the authoritative position.

use serde::{Deserialize, Serialize};

use chain_core::{CompleteGameState, GameEventRow};
use game_types::{
    BeastStats, EncounterPhase, EncounterState, GameId, GameStatus, GridPos, PlayerState,
};

/// Session bootstrap lifecycle.
///
/// One explicit state machine; re-entry guards read this instead of ad hoc
/// boolean flags, so overlapping initialization attempts for the same
/// identity are structurally impossible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BootstrapState {
    #[default]
    Idle,
    Initializing,
    Ready,
    Error(String),
}

/// Immutable view of the store published to subscribers after every
/// mutation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub game_id: Option<GameId>,
    pub bootstrap: BootstrapState,
    pub status: GameStatus,
    pub position: Option<GridPos>,
    pub player: Option<PlayerState>,
    pub encounter: Option<EncounterState>,
    pub event_log: Vec<GameEventRow>,
    pub is_loading: bool,
}

/// Full state gathered during session restore, committed to the store in a
/// single pass so the UI never observes a half-updated frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredState {
    pub player: PlayerState,
    pub position: GridPos,
    pub status: GameStatus,
    pub encounter: Option<EncounterState>,
}

impl RestoredState {
    /// Builds restore data from the contract's complete state view.
    ///
    /// Beast stats attach only to beast encounters; a populated beast slot
    /// alongside a gift encounter is stale contract storage and is dropped.
    pub fn from_complete(state: CompleteGameState) -> Self {
        let encounter = state.current_encounter.map(|kind| EncounterState {
            kind,
            beast: if kind.is_beast() { state.beast } else { None },
            phase: EncounterPhase::Engaged,
        });

        Self {
            player: state.player,
            position: state.position,
            status: state.status,
            encounter,
        }
    }
}

/// Central mutable state container for one browser/process session.
#[derive(Debug, Default)]
pub struct GameStateStore {
    game_id: Option<GameId>,
    bootstrap_state: BootstrapState,
    status: GameStatus,
    position: Option<GridPos>,
    player: Option<PlayerState>,
    encounter: Option<EncounterState>,
    event_log: Vec<GameEventRow>,
    is_loading: bool,
}

impl GameStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn game_id(&self) -> Option<GameId> {
        self.game_id
    }

    pub fn bootstrap(&self) -> &BootstrapState {
        &self.bootstrap_state
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn position(&self) -> Option<GridPos> {
        self.position
    }

    pub fn player(&self) -> Option<PlayerState> {
        self.player
    }

    pub fn encounter(&self) -> Option<EncounterState> {
        self.encounter
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            game_id: self.game_id,
            bootstrap: self.bootstrap_state.clone(),
            status: self.status,
            position: self.position,
            player: self.player,
            encounter: self.encounter,
            event_log: self.event_log.clone(),
            is_loading: self.is_loading,
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    pub fn set_game_id(&mut self, game_id: Option<GameId>) {
        self.game_id = game_id;
    }

    pub fn set_bootstrap(&mut self, state: BootstrapState) {
        self.bootstrap_state = state;
    }

    pub fn set_status(&mut self, status: GameStatus) {
        self.status = status;
        self.sync_win_status();
    }

    pub fn set_position(&mut self, position: GridPos) {
        self.position = Some(position);
        self.sync_win_status();
    }

    pub fn set_player(&mut self, player: PlayerState) {
        self.player = Some(player);
    }

    pub fn set_encounter(&mut self, encounter: Option<EncounterState>) {
        self.encounter = encounter;
    }

    pub fn clear_encounter(&mut self) {
        self.encounter = None;
    }

    pub fn set_encounter_phase(&mut self, phase: EncounterPhase) {
        if let Some(encounter) = self.encounter.as_mut() {
            encounter.phase = phase;
        }
    }

    /// Attaches enrichment stats to the active encounter.
    ///
    /// Returns `false` when no beast encounter is active any more (it
    /// resolved while the enrichment query was in flight), in which case
    /// the stats are dropped rather than resurrecting cleared state.
    pub fn set_beast_stats(&mut self, stats: BeastStats) -> bool {
        match self.encounter.as_mut() {
            Some(encounter) if encounter.kind.is_beast() => {
                encounter.beast = Some(stats);
                true
            }
            _ => {
                tracing::debug!(kind = %stats.kind, "no active beast encounter for enrichment result");
                false
            }
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn set_event_log(&mut self, rows: Vec<GameEventRow>) {
        self.event_log = rows;
    }

    /// Commits restore data atomically, then reconciles status with
    /// position.
    pub fn restore(&mut self, restored: RestoredState) {
        self.player = Some(restored.player);
        self.position = Some(restored.position);
        self.status = restored.status;
        self.encounter = restored.encounter;
        self.sync_win_status();
    }

    /// Clears everything back to the disconnected baseline.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Win-coherence correction shared by restore-time and live-play
    /// synchronization.
    ///
    /// The position is treated as the more trustworthy evidence: standing
    /// on the winning cell with an `InProgress` status is a detected
    /// inconsistency, corrected here and logged. A win also suppresses any
    /// encounter.
    pub fn sync_win_status(&mut self) {
        let on_winning_cell = self.position.map(|p| p.is_winning()).unwrap_or(false);
        if on_winning_cell && self.status == GameStatus::InProgress {
            tracing::warn!(
                position = ?self.position,
                "position is the winning cell but status is InProgress; correcting to Won"
            );
            self.status = GameStatus::Won;
            self.encounter = None;
        }
    }
}
