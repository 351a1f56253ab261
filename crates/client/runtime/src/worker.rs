//! Session worker: the actor that owns the store and drives all flows.
//!
//! Commands arrive over an mpsc channel and are handled synchronously, so
//! the worker is the only writer the store ever sees. Network flows (the
//! bootstrap, move, and fight/flee transactions, plus background
//! enrichment and stat refresh) run in spawned tasks and re-enter through
//! an internal completion channel. Every completion carries the session
//! epoch captured at spawn time; results from a superseded identity are
//! dropped instead of resurrecting cleared state.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use chain_core::{
    ActionCall, ContractAddress, EventLayout, GameEventRow, ParsedGameEvents, StateFetcher,
    StateReader, TransactionGateway,
};
use game_types::{
    BeastKind, BeastStats, Direction, EncounterKind, EncounterPhase, EncounterState, GameId,
    GameStatus, PlayerState,
};

use crate::error::ActionError;
use crate::events::{Event, EventBus};
use crate::notify::{self, CombatResult};
use crate::store::{BootstrapState, GameSnapshot, GameStateStore, RestoredState};

pub(crate) type Reply<T> = oneshot::Sender<Result<T, ActionError>>;

/// Chain capabilities and deployment facts the worker's flows need.
#[derive(Clone)]
pub struct ChainServices {
    pub gateway: TransactionGateway,
    pub reader: Arc<dyn StateReader>,
    pub fetcher: StateFetcher,
    pub world: ContractAddress,
    pub game_systems: ContractAddress,
    pub layout: EventLayout,
}

impl ChainServices {
    fn decode_receipt(&self, receipt: &chain_core::TxReceipt) -> ParsedGameEvents {
        self.layout.decode(receipt, &self.game_systems, &self.world)
    }
}

/// Commands accepted from [`crate::SessionHandle`].
pub(crate) enum Command {
    Connect {
        address: String,
        reply: Reply<GameSnapshot>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    MovePlayer {
        direction: Direction,
        reply: Reply<GameSnapshot>,
    },
    Fight {
        reply: Reply<GameSnapshot>,
    },
    Flee {
        reply: Reply<GameSnapshot>,
    },
    AcknowledgeEncounter {
        reply: Reply<GameSnapshot>,
    },
    Snapshot {
        reply: oneshot::Sender<GameSnapshot>,
    },
}

/// Which resolution transaction a flow submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolveAction {
    Fight,
    Flee,
}

impl ResolveAction {
    fn call(&self, game_id: GameId) -> ActionCall {
        match self {
            ResolveAction::Fight => ActionCall::Fight { game_id },
            ResolveAction::Flee => ActionCall::Flee { game_id },
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ResolveAction::Fight => "fight",
            ResolveAction::Flee => "flee",
        }
    }
}

/// Result of a fight/flee flow.
pub(crate) enum ResolveOutcome {
    /// Transaction finalized successfully; the encounter is resolved.
    Resolved,
    /// The indexer disagreed with the local encounter before submission.
    OutOfSync,
    /// Submission or finality failed (revert, timeout, transport).
    Failed(ActionError),
}

/// What a background stat refresh was reconciling.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RefreshContext {
    AfterMove,
    AfterResolve(ResolveAction),
}

/// Completions delivered by spawned network flows.
pub(crate) enum Completion {
    Bootstrap {
        epoch: u64,
        game_id: GameId,
        outcome: Result<RestoredState, String>,
        reply: Reply<GameSnapshot>,
    },
    Move {
        epoch: u64,
        outcome: Result<ParsedGameEvents, ActionError>,
        reply: Reply<GameSnapshot>,
    },
    Resolve {
        epoch: u64,
        action: ResolveAction,
        outcome: ResolveOutcome,
        reply: Reply<GameSnapshot>,
    },
    BeastStats {
        epoch: u64,
        stats: BeastStats,
    },
    PlayerRefresh {
        epoch: u64,
        context: RefreshContext,
        player: PlayerState,
    },
    EventLog {
        epoch: u64,
        rows: Vec<GameEventRow>,
    },
}

/// Background task that owns the [`GameStateStore`].
pub(crate) struct SessionWorker {
    store: GameStateStore,
    chain: ChainServices,
    bus: EventBus,
    command_rx: mpsc::Receiver<Command>,
    completion_tx: mpsc::Sender<Completion>,
    completion_rx: mpsc::Receiver<Completion>,
    /// Bumped on every identity change; stale async completions are
    /// dropped by comparing against the epoch they captured.
    epoch: u64,
    /// Marker preventing redundant re-initialization for an identity that
    /// already completed bootstrap.
    last_initialized: Option<GameId>,
}

impl SessionWorker {
    pub(crate) fn new(
        chain: ChainServices,
        bus: EventBus,
        command_rx: mpsc::Receiver<Command>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(32);
        Self {
            store: GameStateStore::new(),
            chain,
            bus,
            command_rx,
            completion_tx,
            completion_rx,
            epoch: 0,
            last_initialized: None,
        }
    }

    /// Main worker loop. Exits when every handle is dropped.
    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion);
                }
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect { address, reply } => self.handle_connect(address, reply),
            Command::Disconnect { reply } => {
                self.handle_disconnect();
                let _ = reply.send(());
            }
            Command::MovePlayer { direction, reply } => self.handle_move(direction, reply),
            Command::Fight { reply } => self.handle_resolve(ResolveAction::Fight, reply),
            Command::Flee { reply } => self.handle_resolve(ResolveAction::Flee, reply),
            Command::AcknowledgeEncounter { reply } => self.handle_acknowledge(reply),
            Command::Snapshot { reply } => {
                let _ = reply.send(self.store.snapshot());
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Bootstrap {
                epoch,
                game_id,
                outcome,
                reply,
            } => self.finish_bootstrap(epoch, game_id, outcome, reply),
            Completion::Move {
                epoch,
                outcome,
                reply,
            } => self.finish_move(epoch, outcome, reply),
            Completion::Resolve {
                epoch,
                action,
                outcome,
                reply,
            } => self.finish_resolve(epoch, action, outcome, reply),
            Completion::BeastStats { epoch, stats } => self.apply_beast_stats(epoch, stats),
            Completion::PlayerRefresh {
                epoch,
                context,
                player,
            } => self.apply_player_refresh(epoch, context, player),
            Completion::EventLog { epoch, rows } => {
                if self.is_current(epoch) {
                    self.store.set_event_log(rows);
                    self.publish_state();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Session bootstrap
    // ------------------------------------------------------------------

    fn handle_connect(&mut self, address: String, reply: Reply<GameSnapshot>) {
        let game_id = GameId::from_address(&address);
        if game_id.is_zero() {
            let _ = reply.send(Err(ActionError::Initialization(
                "wallet address did not yield a session id".into(),
            )));
            return;
        }

        if self.store.game_id() == Some(game_id) {
            match self.store.bootstrap() {
                BootstrapState::Ready if self.last_initialized == Some(game_id) => {
                    tracing::debug!(%game_id, "session already initialized, skipping");
                    let _ = reply.send(Ok(self.store.snapshot()));
                    return;
                }
                BootstrapState::Initializing => {
                    tracing::debug!(%game_id, "initialization already in flight");
                    let _ = reply.send(Err(ActionError::Busy));
                    return;
                }
                // Idle after a failed attempt, or Error: retry below.
                _ => {}
            }
        } else {
            // Identity change: invalidate in-flight async work and clear
            // the previous session's state.
            self.epoch += 1;
            self.last_initialized = None;
            self.store.reset();
            self.store.set_game_id(Some(game_id));
        }

        tracing::info!(%game_id, "initializing session");
        self.store.set_bootstrap(BootstrapState::Initializing);
        self.publish_state();

        let chain = self.chain.clone();
        let completion_tx = self.completion_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let outcome = bootstrap_session(&chain, game_id).await;
            let _ = completion_tx
                .send(Completion::Bootstrap {
                    epoch,
                    game_id,
                    outcome,
                    reply,
                })
                .await;
        });
    }

    fn handle_disconnect(&mut self) {
        tracing::info!("wallet disconnected, clearing session state");
        self.epoch += 1;
        self.last_initialized = None;
        self.store.reset();
        self.publish_state();
    }

    fn finish_bootstrap(
        &mut self,
        epoch: u64,
        game_id: GameId,
        outcome: Result<RestoredState, String>,
        reply: Reply<GameSnapshot>,
    ) {
        if !self.is_current(epoch) {
            return;
        }

        match outcome {
            Ok(restored) => {
                // Commit everything in one pass; the win-coherence
                // correction runs inside restore.
                self.store.restore(restored);
                self.store.set_bootstrap(BootstrapState::Ready);
                self.last_initialized = Some(game_id);
                tracing::info!(%game_id, "session ready");

                self.spawn_event_log_fetch(game_id);
                let _ = reply.send(Ok(self.store.snapshot()));
            }
            Err(message) => {
                tracing::error!(%game_id, %message, "session initialization failed");
                self.store.set_bootstrap(BootstrapState::Error(message.clone()));
                let _ = reply.send(Err(ActionError::Initialization(message)));
            }
        }
        self.publish_state();
    }

    // ------------------------------------------------------------------
    // Action preconditions
    // ------------------------------------------------------------------

    /// Checks the preconditions common to every action transaction.
    ///
    /// All violations are raised here, synchronously, before any network
    /// call is made.
    fn begin_action(&self) -> Result<GameId, ActionError> {
        let Some(game_id) = self.store.game_id() else {
            return Err(ActionError::NotConnected);
        };
        if !matches!(self.store.bootstrap(), BootstrapState::Ready) {
            return Err(ActionError::NotConnected);
        }
        // One in-flight write transaction per session.
        if self.store.is_loading() {
            return Err(ActionError::Busy);
        }
        Ok(game_id)
    }

    // ------------------------------------------------------------------
    // Move flow
    // ------------------------------------------------------------------

    fn handle_move(&mut self, direction: Direction, reply: Reply<GameSnapshot>) {
        let game_id = match self.begin_action() {
            Ok(game_id) => game_id,
            Err(error) => {
                let _ = reply.send(Err(error));
                return;
            }
        };

        match self.store.status() {
            GameStatus::Won => {
                let _ = reply.send(Err(ActionError::AlreadyWon));
                return;
            }
            GameStatus::Lost => {
                let _ = reply.send(Err(ActionError::GameOver));
                return;
            }
            GameStatus::InProgress => {}
        }

        if let Some(encounter) = self.store.encounter() {
            if encounter.requires_resolution() {
                let _ = reply.send(Err(ActionError::UnresolvedEncounter(encounter.kind)));
                return;
            }
            // Gift encounters do not block movement; walking away
            // dismisses them optimistically.
            self.store.clear_encounter();
        }

        self.store.set_loading(true);
        self.publish_state();

        let chain = self.chain.clone();
        let completion_tx = self.completion_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let outcome = drive_move(&chain, game_id, direction).await;
            let _ = completion_tx
                .send(Completion::Move {
                    epoch,
                    outcome,
                    reply,
                })
                .await;
        });
    }

    fn finish_move(
        &mut self,
        epoch: u64,
        outcome: Result<ParsedGameEvents, ActionError>,
        reply: Reply<GameSnapshot>,
    ) {
        if !self.is_current(epoch) {
            return;
        }
        self.store.set_loading(false);

        let parsed = match outcome {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::warn!(%error, "move failed");
                let _ = reply.send(Err(error));
                self.publish_state();
                return;
            }
        };

        match parsed.position {
            Some(position) => {
                self.store.set_position(position);

                if position.is_winning() {
                    // Reaching the exit wins immediately; any encounter
                    // code in the same receipt is suppressed.
                    self.store.set_status(GameStatus::Won);
                    self.store.clear_encounter();
                    tracing::info!(?position, "winning cell reached");
                } else if let Some(code) = parsed.encounter_code
                    && let Some(kind) = EncounterKind::from_code(code)
                {
                    // Show the encounter right away; beast stats follow
                    // asynchronously once the indexer catches up.
                    self.store.set_encounter(Some(EncounterState::new(kind)));
                    tracing::info!(%kind, "encounter generated");

                    if let Some(expected) = kind.beast_kind() {
                        self.spawn_beast_enrichment(expected);
                    } else {
                        self.bus
                            .publish(Event::Notification(notify::gift_encounter(kind)));
                    }
                }
            }
            None => {
                tracing::warn!("receipt carried no position; reconciling against current state");
                self.store.sync_win_status();
            }
        }

        // Gift encounters mutate stats silently on-chain; refresh in the
        // background and diff for notifications. Failure never rolls the
        // move back.
        self.spawn_player_refresh(RefreshContext::AfterMove);

        let _ = reply.send(Ok(self.store.snapshot()));
        self.publish_state();
    }

    // ------------------------------------------------------------------
    // Fight / flee flow
    // ------------------------------------------------------------------

    fn handle_resolve(&mut self, action: ResolveAction, reply: Reply<GameSnapshot>) {
        let game_id = match self.begin_action() {
            Ok(game_id) => game_id,
            Err(error) => {
                let _ = reply.send(Err(error));
                return;
            }
        };

        let Some(encounter) = self.store.encounter() else {
            let _ = reply.send(Err(ActionError::NoActiveEncounter));
            return;
        };
        if !encounter.requires_resolution() {
            let _ = reply.send(Err(ActionError::NoActiveEncounter));
            return;
        }

        // Two-phase resolution: the speculative clear is visible as the
        // Resolving phase and can be rolled back on failure.
        self.store.set_loading(true);
        self.store.set_encounter_phase(EncounterPhase::Resolving);
        self.publish_state();

        let chain = self.chain.clone();
        let completion_tx = self.completion_tx.clone();
        let epoch = self.epoch;
        let local_kind = encounter.kind;
        tokio::spawn(async move {
            let outcome = drive_resolution(&chain, game_id, action, local_kind).await;
            let _ = completion_tx
                .send(Completion::Resolve {
                    epoch,
                    action,
                    outcome,
                    reply,
                })
                .await;
        });
    }

    fn finish_resolve(
        &mut self,
        epoch: u64,
        action: ResolveAction,
        outcome: ResolveOutcome,
        reply: Reply<GameSnapshot>,
    ) {
        if !self.is_current(epoch) {
            return;
        }
        self.store.set_loading(false);

        match outcome {
            ResolveOutcome::Resolved => {
                // Resolved the moment the transaction is accepted; the
                // health outcome arrives with the stat refresh.
                self.store.clear_encounter();
                self.spawn_player_refresh(RefreshContext::AfterResolve(action));
                let _ = reply.send(Ok(self.store.snapshot()));
            }
            ResolveOutcome::OutOfSync => {
                tracing::warn!(
                    action = action.label(),
                    "indexer disagrees with local encounter; clearing without submitting"
                );
                self.store.clear_encounter();
                let _ = reply.send(Err(ActionError::EncounterOutOfSync));
            }
            ResolveOutcome::Failed(error) => {
                // Revert or timeout: as far as we know the encounter is
                // still unresolved on-chain, so put it back in play. The
                // next attempt re-validates against the indexer anyway.
                tracing::warn!(action = action.label(), %error, "resolution failed");
                self.store.set_encounter_phase(EncounterPhase::Engaged);
                let _ = reply.send(Err(error));
            }
        }
        self.publish_state();
    }

    fn handle_acknowledge(&mut self, reply: Reply<GameSnapshot>) {
        match self.store.encounter() {
            Some(encounter) if encounter.requires_resolution() => {
                let _ = reply.send(Err(ActionError::UnresolvedEncounter(encounter.kind)));
            }
            _ => {
                self.store.clear_encounter();
                let _ = reply.send(Ok(self.store.snapshot()));
                self.publish_state();
            }
        }
    }

    // ------------------------------------------------------------------
    // Background enrichment
    // ------------------------------------------------------------------

    fn spawn_beast_enrichment(&self, expected: BeastKind) {
        let Some(game_id) = self.store.game_id() else {
            return;
        };
        let chain = self.chain.clone();
        let completion_tx = self.completion_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            // Exhausted retries leave the encounter displayed without
            // stats; it is never revoked for missing enrichment.
            if let Some(stats) = chain
                .fetcher
                .fetch_beast_encounter(game_id, Some(expected))
                .await
            {
                let _ = completion_tx
                    .send(Completion::BeastStats { epoch, stats })
                    .await;
            }
        });
    }

    fn spawn_player_refresh(&self, context: RefreshContext) {
        let Some(game_id) = self.store.game_id() else {
            return;
        };
        let chain = self.chain.clone();
        let completion_tx = self.completion_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            if let Some(player) = chain.fetcher.fetch_player(game_id).await {
                let _ = completion_tx
                    .send(Completion::PlayerRefresh {
                        epoch,
                        context,
                        player,
                    })
                    .await;
            }
        });
    }

    fn spawn_event_log_fetch(&self, game_id: GameId) {
        let chain = self.chain.clone();
        let completion_tx = self.completion_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let rows = chain.fetcher.fetch_event_log(game_id).await;
            if !rows.is_empty() {
                let _ = completion_tx.send(Completion::EventLog { epoch, rows }).await;
            }
        });
    }

    fn apply_beast_stats(&mut self, epoch: u64, stats: BeastStats) {
        if !self.is_current(epoch) {
            return;
        }
        if self.store.set_beast_stats(stats) {
            self.publish_state();
        }
    }

    fn apply_player_refresh(&mut self, epoch: u64, context: RefreshContext, player: PlayerState) {
        if !self.is_current(epoch) {
            return;
        }

        let previous = self.store.player();
        self.store.set_player(player);

        match context {
            RefreshContext::AfterMove => {
                if let Some(previous) = previous {
                    let delta = previous.diff(&player);
                    for notification in notify::stat_changes(&delta) {
                        self.bus.publish(Event::Notification(notification));
                    }
                }
            }
            RefreshContext::AfterResolve(action) => {
                let (damage_taken, used_free_ability) = previous
                    .map(|prev| {
                        let damage = prev.health.saturating_sub(player.health);
                        let used_free = match action {
                            ResolveAction::Fight => {
                                prev.has_free_attack && !player.has_free_attack
                            }
                            ResolveAction::Flee => prev.has_free_flee && !player.has_free_flee,
                        };
                        (damage, used_free)
                    })
                    .unwrap_or((0, false));

                let result = if player.is_dead() {
                    CombatResult::Died
                } else {
                    match action {
                        ResolveAction::Fight => CombatResult::Victory,
                        ResolveAction::Flee => CombatResult::Fled,
                    }
                };
                self.bus.publish(Event::Notification(notify::combat_result(
                    result,
                    damage_taken,
                    used_free_ability,
                )));
            }
        }

        // Health zero is the terminal loss, whichever refresh observed it.
        if player.is_dead() && self.store.status() == GameStatus::InProgress {
            tracing::info!("player health reached zero; marking session lost");
            self.store.set_status(GameStatus::Lost);
        }

        self.publish_state();
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn is_current(&self, epoch: u64) -> bool {
        if epoch != self.epoch {
            tracing::debug!(
                stale = epoch,
                current = self.epoch,
                "dropping async result from a superseded session"
            );
            return false;
        }
        true
    }

    fn publish_state(&self) {
        self.bus.publish(Event::State(self.store.snapshot()));
    }
}

// ============================================================================
// Network flows (run in spawned tasks)
// ============================================================================

/// Determines whether a session exists for the id, creates one if not, and
/// gathers the full restore state. Any failure aborts the whole bootstrap;
/// nothing is committed from here.
async fn bootstrap_session(
    chain: &ChainServices,
    game_id: GameId,
) -> Result<RestoredState, String> {
    let exists = chain
        .reader
        .game_exists(game_id)
        .await
        .map_err(|error| format!("failed to check for an existing session: {error}"))?;

    if exists {
        tracing::info!(%game_id, "existing session found, restoring");
    } else {
        tracing::info!(%game_id, "no session on-chain, creating one");
        chain
            .gateway
            .execute(ActionCall::CreateGame { game_id })
            .await
            .map_err(|error| format!("failed to create the session: {error}"))?;
    }

    let state = chain
        .reader
        .game_state(game_id)
        .await
        .map_err(|error| format!("failed to fetch session state: {error}"))?
        .ok_or_else(|| "session state unavailable".to_string())?;

    Ok(RestoredState::from_complete(state))
}

async fn drive_move(
    chain: &ChainServices,
    game_id: GameId,
    direction: Direction,
) -> Result<ParsedGameEvents, ActionError> {
    let receipt = chain
        .gateway
        .execute(ActionCall::Move { game_id, direction })
        .await?;
    Ok(chain.decode_receipt(&receipt))
}

async fn drive_resolution(
    chain: &ChainServices,
    game_id: GameId,
    action: ResolveAction,
    local_kind: EncounterKind,
) -> ResolveOutcome {
    // Re-validate against the indexer before submitting: a transaction the
    // contract would reject is cheaper to refuse locally. A missing record
    // is "unknown", not disagreement, and does not block the attempt.
    if let Some(record) = chain.fetcher.fetch_current_encounter(game_id).await {
        match record.kind() {
            None => return ResolveOutcome::OutOfSync,
            Some(kind) if kind != local_kind => {
                tracing::warn!(
                    local = %local_kind,
                    indexed = %kind,
                    "encounter kind mismatch against indexer"
                );
                return ResolveOutcome::OutOfSync;
            }
            Some(_) => {}
        }
    }

    match chain.gateway.execute(action.call(game_id)).await {
        Ok(_receipt) => ResolveOutcome::Resolved,
        Err(error) => ResolveOutcome::Failed(error.into()),
    }
}
