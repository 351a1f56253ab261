//! Session-level game status.

use serde::{Deserialize, Serialize};

/// Overall outcome of a session.
///
/// `Lost` is entered when health reaches zero (usually detected via an
/// indexer refresh rather than the transaction that caused it). Once a
/// terminal status is reached, the orchestrator accepts no further action
/// transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum GameStatus {
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    /// Decodes the contract's status field (0 = InProgress, 1 = Won,
    /// 2 = Lost). Unknown codes fall back to `InProgress`, matching the
    /// lenient read path.
    pub fn from_code(code: u64) -> Self {
        match code {
            1 => GameStatus::Won,
            2 => GameStatus::Lost,
            _ => GameStatus::InProgress,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Won | GameStatus::Lost)
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        GameStatus::InProgress
    }
}
