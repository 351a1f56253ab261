//! Chain capability traits.
//!
//! This module defines the seams between the client and the network:
//! - Layer 0: `ActionSubmitter`, `ReceiptSource` (write path infrastructure)
//! - Layer 1: `StateReader`, `IndexerGateway` (read paths)
//!
//! The wallet integration provides the `ActionSubmitter`; `chain-starknet`
//! provides HTTP implementations of the rest; `mock::MockChain` implements
//! all four for tests.

use async_trait::async_trait;

use game_types::GameId;

use crate::types::{
    ActionCall, BeastRecord, CompleteGameState, CurrentEncounterRecord, GameEventRow,
    PlayerRecord, ReceiptStatus, TxHash,
};

// ============================================================================
// Error Types
// ============================================================================

/// Write-path transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Read-path errors (direct calls and indexer queries).
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

// ============================================================================
// Layer 0: Write-path infrastructure
// ============================================================================

/// Submits signed action transactions.
///
/// Implemented by the wallet/session capability; this layer performs no
/// local state mutation and no deduplication of double-submission (the
/// orchestrator's precondition checks own that responsibility).
#[async_trait]
pub trait ActionSubmitter: Send + Sync {
    async fn submit(&self, call: &ActionCall) -> Result<TxHash, TransportError>;
}

/// Polls a submitted transaction for finality.
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    /// Returns `Pending` while the transaction is unknown or in flight, and
    /// the full receipt once the execution outcome is confirmed.
    async fn receipt(&self, tx: &TxHash) -> Result<ReceiptStatus, TransportError>;
}

// ============================================================================
// Layer 1: Read paths
// ============================================================================

/// Direct contract view calls (strongly consistent).
#[async_trait]
pub trait StateReader: Send + Sync {
    /// Fetches the complete session state in a single call.
    ///
    /// Returns `Ok(None)` when no usable state exists for the id (missing
    /// session or an undecodable response, which is logged at this layer).
    async fn game_state(&self, game_id: GameId) -> Result<Option<CompleteGameState>, QueryError>;

    /// Whether a session has been initialized for this id.
    async fn game_exists(&self, game_id: GameId) -> Result<bool, QueryError>;
}

/// Entity queries against the secondary, eventually-consistent indexer.
///
/// A single attempt each; propagation-lag retry policy is layered on top by
/// [`crate::fetcher::StateFetcher`]. `Ok(None)` means "no record known to
/// the indexer right now", which callers must treat as unknown, never as
/// confirmed absent.
#[async_trait]
pub trait IndexerGateway: Send + Sync {
    async fn player(&self, game_id: GameId) -> Result<Option<PlayerRecord>, QueryError>;

    async fn beast_encounter(&self, game_id: GameId) -> Result<Option<BeastRecord>, QueryError>;

    async fn current_encounter(
        &self,
        game_id: GameId,
    ) -> Result<Option<CurrentEncounterRecord>, QueryError>;

    /// Historical event rows for the session, newest first (bounded by the
    /// indexer to the most recent 1000). Best-effort; used for the event
    /// log only.
    async fn game_events(&self, game_id: GameId) -> Result<Vec<GameEventRow>, QueryError>;
}
