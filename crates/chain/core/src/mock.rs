//! Scriptable in-memory chain for testing without a network.
//!
//! Implements every capability trait. Tests script receipt outcomes and
//! indexer responses up front, then assert on the calls the client made.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use game_types::GameId;

use crate::traits::{
    ActionSubmitter, IndexerGateway, QueryError, ReceiptSource, StateReader, TransportError,
};
use crate::types::{
    ActionCall, BeastRecord, CompleteGameState, ContractAddress, CurrentEncounterRecord,
    EmittedEvent, ExecutionStatus, GameEventRow, PlayerRecord, ReceiptStatus, TxHash, TxReceipt,
};

/// Scripted outcome for one submitted transaction.
///
/// Consumed in submission order; a transaction with no script finalizes
/// immediately with an empty success receipt.
#[derive(Debug, Clone)]
pub struct ReceiptScript {
    pending_polls: u32,
    outcome: ScriptedOutcome,
}

#[derive(Debug, Clone)]
enum ScriptedOutcome {
    Success { events: Vec<EmittedEvent> },
    Reverted { reason: String },
    NeverFound,
}

impl ReceiptScript {
    pub fn success(events: Vec<EmittedEvent>) -> Self {
        Self {
            pending_polls: 0,
            outcome: ScriptedOutcome::Success { events },
        }
    }

    pub fn reverted(reason: impl Into<String>) -> Self {
        Self {
            pending_polls: 0,
            outcome: ScriptedOutcome::Reverted {
                reason: reason.into(),
            },
        }
    }

    /// The receipt never materializes; finality polling will time out.
    pub fn never_found() -> Self {
        Self {
            pending_polls: 0,
            outcome: ScriptedOutcome::NeverFound,
        }
    }

    /// Report `Pending` for the first `polls` receipt queries.
    pub fn pending_polls(mut self, polls: u32) -> Self {
        self.pending_polls = polls;
        self
    }
}

#[derive(Default)]
struct MockState {
    tx_counter: u64,
    submitted: Vec<ActionCall>,
    receipt_scripts: VecDeque<ReceiptScript>,
    receipts: HashMap<TxHash, ReceiptScript>,
    receipt_polls: u32,

    game_exists: bool,
    game_state: Option<CompleteGameState>,
    game_state_after_create: Option<CompleteGameState>,

    player_queue: VecDeque<Option<PlayerRecord>>,
    player_queries: u32,
    beast_queue: VecDeque<Option<BeastRecord>>,
    beast_queries: u32,
    current_queue: VecDeque<Option<CurrentEncounterRecord>>,
    current_queries: u32,
    event_rows: Vec<GameEventRow>,
}

/// In-memory mock implementing all chain capabilities.
#[derive(Clone, Default)]
pub struct MockChain {
    inner: Arc<Mutex<MockState>>,
}

impl MockChain {
    /// World contract address used in synthesized events.
    pub const WORLD: &'static str = "0x0110";

    /// Game-systems contract address used in synthesized events.
    pub const GAME_SYSTEMS: &'static str = "0x0220";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn world_address() -> ContractAddress {
        ContractAddress::new(Self::WORLD)
    }

    pub fn game_systems_address() -> ContractAddress {
        ContractAddress::new(Self::GAME_SYSTEMS)
    }

    // ------------------------------------------------------------------
    // Scripting
    // ------------------------------------------------------------------

    pub fn script_receipt(&self, script: ReceiptScript) {
        self.inner.lock().unwrap().receipt_scripts.push_back(script);
    }

    pub fn set_game_exists(&self, exists: bool) {
        self.inner.lock().unwrap().game_exists = exists;
    }

    pub fn set_game_state(&self, state: Option<CompleteGameState>) {
        self.inner.lock().unwrap().game_state = state;
    }

    /// State served once a `create_game` transaction has been submitted;
    /// lets tests model "session appears after creation".
    pub fn set_game_state_after_create(&self, state: CompleteGameState) {
        self.inner.lock().unwrap().game_state_after_create = Some(state);
    }

    pub fn queue_player(&self, record: Option<PlayerRecord>) {
        self.inner.lock().unwrap().player_queue.push_back(record);
    }

    pub fn queue_beast(&self, record: Option<BeastRecord>) {
        self.inner.lock().unwrap().beast_queue.push_back(record);
    }

    pub fn queue_current_encounter(&self, record: Option<CurrentEncounterRecord>) {
        self.inner.lock().unwrap().current_queue.push_back(record);
    }

    pub fn set_event_rows(&self, rows: Vec<GameEventRow>) {
        self.inner.lock().unwrap().event_rows = rows;
    }

    // ------------------------------------------------------------------
    // Event synthesis helpers
    // ------------------------------------------------------------------

    /// A world-emitted movement event carrying the new position at the
    /// fixed offsets.
    pub fn position_event(x: u8, y: u8) -> EmittedEvent {
        EmittedEvent {
            from_address: Self::world_address(),
            keys: vec!["0x1".into(), "0x2".into(), Self::GAME_SYSTEMS.into()],
            data: vec![
                "0x0".into(),
                "0x2a".into(),
                "0x0".into(),
                "0x0".into(),
                format!("{x:#x}"),
                format!("{y:#x}"),
            ],
        }
    }

    /// A world-emitted encounter-generated event with the code as the last
    /// of exactly four data fields.
    pub fn encounter_event(code: u8) -> EmittedEvent {
        EmittedEvent {
            from_address: Self::world_address(),
            keys: vec!["0x1".into(), "0x2".into(), Self::GAME_SYSTEMS.into()],
            data: vec![
                "0x0".into(),
                "0x2a".into(),
                "0x0".into(),
                format!("{code:#x}"),
            ],
        }
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn submitted(&self) -> Vec<ActionCall> {
        self.inner.lock().unwrap().submitted.clone()
    }

    pub fn receipt_polls(&self) -> u32 {
        self.inner.lock().unwrap().receipt_polls
    }

    pub fn player_queries(&self) -> u32 {
        self.inner.lock().unwrap().player_queries
    }

    pub fn beast_queries(&self) -> u32 {
        self.inner.lock().unwrap().beast_queries
    }

    pub fn current_encounter_queries(&self) -> u32 {
        self.inner.lock().unwrap().current_queries
    }
}

#[async_trait]
impl ActionSubmitter for MockChain {
    async fn submit(&self, call: &ActionCall) -> Result<TxHash, TransportError> {
        let mut state = self.inner.lock().unwrap();
        state.tx_counter += 1;
        let hash = TxHash(format!("{:#x}", state.tx_counter));

        state.submitted.push(*call);

        // Creation makes the session visible to subsequent reads.
        if matches!(call, ActionCall::CreateGame { .. }) {
            state.game_exists = true;
            if let Some(created) = state.game_state_after_create.take() {
                state.game_state = Some(created);
            }
        }

        let script = state
            .receipt_scripts
            .pop_front()
            .unwrap_or_else(|| ReceiptScript::success(vec![]));
        state.receipts.insert(hash.clone(), script);

        Ok(hash)
    }
}

#[async_trait]
impl ReceiptSource for MockChain {
    async fn receipt(&self, tx: &TxHash) -> Result<ReceiptStatus, TransportError> {
        let mut state = self.inner.lock().unwrap();
        state.receipt_polls += 1;

        let Some(script) = state.receipts.get_mut(tx) else {
            return Ok(ReceiptStatus::Pending);
        };

        if script.pending_polls > 0 {
            script.pending_polls -= 1;
            return Ok(ReceiptStatus::Pending);
        }

        match &script.outcome {
            ScriptedOutcome::NeverFound => Ok(ReceiptStatus::Pending),
            ScriptedOutcome::Success { events } => Ok(ReceiptStatus::Final(TxReceipt {
                tx_hash: tx.clone(),
                execution_status: ExecutionStatus::Succeeded,
                events: events.clone(),
            })),
            ScriptedOutcome::Reverted { reason } => Ok(ReceiptStatus::Final(TxReceipt {
                tx_hash: tx.clone(),
                execution_status: ExecutionStatus::Reverted {
                    reason: reason.clone(),
                },
                events: vec![],
            })),
        }
    }
}

#[async_trait]
impl StateReader for MockChain {
    async fn game_state(&self, _game_id: GameId) -> Result<Option<CompleteGameState>, QueryError> {
        Ok(self.inner.lock().unwrap().game_state.clone())
    }

    async fn game_exists(&self, _game_id: GameId) -> Result<bool, QueryError> {
        Ok(self.inner.lock().unwrap().game_exists)
    }
}

#[async_trait]
impl IndexerGateway for MockChain {
    async fn player(&self, _game_id: GameId) -> Result<Option<PlayerRecord>, QueryError> {
        let mut state = self.inner.lock().unwrap();
        state.player_queries += 1;
        Ok(state.player_queue.pop_front().flatten())
    }

    async fn beast_encounter(&self, _game_id: GameId) -> Result<Option<BeastRecord>, QueryError> {
        let mut state = self.inner.lock().unwrap();
        state.beast_queries += 1;
        Ok(state.beast_queue.pop_front().flatten())
    }

    async fn current_encounter(
        &self,
        _game_id: GameId,
    ) -> Result<Option<CurrentEncounterRecord>, QueryError> {
        let mut state = self.inner.lock().unwrap();
        state.current_queries += 1;
        Ok(state.current_queue.pop_front().flatten())
    }

    async fn game_events(&self, _game_id: GameId) -> Result<Vec<GameEventRow>, QueryError> {
        Ok(self.inner.lock().unwrap().event_rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_types::Direction;

    #[tokio::test]
    async fn unscripted_transactions_succeed_immediately() {
        let chain = MockChain::new();
        let call = ActionCall::Move {
            game_id: GameId::new(1),
            direction: Direction::Up,
        };

        let hash = chain.submit(&call).await.unwrap();
        let status = chain.receipt(&hash).await.unwrap();
        assert!(matches!(
            status,
            ReceiptStatus::Final(TxReceipt {
                execution_status: ExecutionStatus::Succeeded,
                ..
            })
        ));
        assert_eq!(chain.submitted(), vec![call]);
    }

    #[tokio::test]
    async fn creation_makes_the_session_visible() {
        let chain = MockChain::new();
        assert!(!chain.game_exists(GameId::new(1)).await.unwrap());

        chain
            .submit(&ActionCall::CreateGame {
                game_id: GameId::new(1),
            })
            .await
            .unwrap();
        assert!(chain.game_exists(GameId::new(1)).await.unwrap());
    }

    #[tokio::test]
    async fn synthesized_events_decode_at_the_pinned_offsets() {
        use crate::events::EventLayout;

        let receipt = TxReceipt {
            tx_hash: TxHash("0x1".into()),
            execution_status: ExecutionStatus::Succeeded,
            events: vec![MockChain::position_event(3, 4), MockChain::encounter_event(2)],
        };

        let parsed = EventLayout::V1.decode(
            &receipt,
            &MockChain::game_systems_address(),
            &MockChain::world_address(),
        );
        assert_eq!(parsed.position, Some(game_types::GridPos::new(3, 4)));
        assert_eq!(parsed.encounter_code, Some(2));
    }
}
