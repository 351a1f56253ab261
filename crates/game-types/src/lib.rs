//! Canonical domain types for the SCARD grid-exploration game client.
//!
//! `game-types` defines the pure data model shared across the chain
//! integration and the session runtime: session identity, grid geometry,
//! player stats, encounters, and combat outcome prediction. Everything here
//! is synchronous and side-effect free; all I/O lives in the `chain-*` and
//! `client-*` crates that depend on these types.
pub mod combat;
pub mod encounter;
pub mod grid;
pub mod player;
pub mod session;
pub mod status;

pub use combat::{CombatPrediction, FightOutcome, FleeOutcome, is_critical_health, predict_combat};
pub use encounter::{BeastKind, BeastStats, EncounterKind, EncounterPhase, EncounterState};
pub use grid::{Direction, GRID_SIZE, GridPos, WIN_X, WIN_Y};
pub use player::{MAX_PLAYER_HEALTH, PlayerState, StatDelta};
pub use session::GameId;
pub use status::GameStatus;
