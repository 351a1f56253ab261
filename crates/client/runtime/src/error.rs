//! Errors surfaced by the session runtime API.

use thiserror::Error;

use chain_core::GatewayError;
use game_types::EncounterKind;

pub type Result<T> = std::result::Result<T, ActionError>;

/// Failures of session commands.
///
/// Precondition violations are raised synchronously before any transaction
/// is submitted; gateway failures carry the revert/timeout distinction from
/// the write path.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("no wallet session is connected")]
    NotConnected,

    #[error("another action is already in flight")]
    Busy,

    #[error("game is already won; start a new game")]
    AlreadyWon,

    #[error("game is over")]
    GameOver,

    #[error("a {0} blocks the path; fight or flee first")]
    UnresolvedEncounter(EncounterKind),

    #[error("no active beast encounter to resolve")]
    NoActiveEncounter,

    #[error("the encounter was already resolved on-chain; local state has been cleared")]
    EncounterOutOfSync,

    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("session worker is no longer running")]
    ChannelClosed,
}
