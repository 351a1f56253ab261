//! End-to-end session scenarios against the in-memory mock chain.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use chain_core::{
    BeastRecord, CompleteGameState, CurrentEncounterRecord, FinalityPolicy, MockChain,
    PlayerRecord, QueryPolicy, ReceiptScript,
};
use client_runtime::{
    ActionError, BootstrapState, Event, GameSnapshot, SessionRuntime, Severity, Topic,
};
use game_types::{
    BeastKind, Direction, EncounterKind, EncounterPhase, GameStatus, GridPos, PlayerState,
};

/// Wallet whose first sixteen hex digits decode to game id 12345.
const ADDRESS: &str = "0x0000000000003039cafef00dcafef00d";
const OTHER_ADDRESS: &str = "0x00000000000000ffcafef00dcafef00d";

fn runtime_with(chain: &Arc<MockChain>) -> SessionRuntime {
    SessionRuntime::builder()
        .chain(chain.clone())
        .addresses(MockChain::world_address(), MockChain::game_systems_address())
        .finality_policy(FinalityPolicy::no_delay(9))
        .query_policy(QueryPolicy::no_delay(5))
        .build()
        .expect("runtime should build")
}

fn state_at(x: u8, y: u8) -> CompleteGameState {
    CompleteGameState {
        player: PlayerState::starting(),
        position: GridPos::new(x, y),
        status: GameStatus::InProgress,
        current_encounter: None,
        beast: None,
    }
}

fn state_with_beast(x: u8, y: u8, kind: EncounterKind) -> CompleteGameState {
    CompleteGameState {
        current_encounter: Some(kind),
        ..state_at(x, y)
    }
}

fn live_player(health: u16) -> PlayerRecord {
    PlayerRecord {
        health,
        attack_points: 2,
        damage_points: 1,
        has_free_attack: false,
        has_free_flee: false,
    }
}

/// Waits until a state snapshot satisfying the predicate is published.
async fn wait_for_state(
    rx: &mut broadcast::Receiver<Event>,
    predicate: impl Fn(&GameSnapshot) -> bool,
) -> GameSnapshot {
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            match rx.recv().await {
                Ok(Event::State(snapshot)) if predicate(&snapshot) => return snapshot,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("expected state was never published")
}

/// Waits for the next notification.
async fn wait_for_notification(
    rx: &mut broadcast::Receiver<Event>,
) -> client_runtime::Notification {
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            match rx.recv().await {
                Ok(Event::Notification(notification)) => return notification,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("expected notification was never published")
}

// ============================================================================
// Bootstrap
// ============================================================================

#[tokio::test]
async fn fresh_wallet_creates_and_restores_a_session() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(false);
    chain.set_game_state_after_create(state_at(0, 0));

    let runtime = runtime_with(&chain);
    let snapshot = runtime.handle().connect(ADDRESS).await.unwrap();

    assert_eq!(snapshot.game_id.unwrap().to_string(), "12345");
    assert_eq!(snapshot.bootstrap, BootstrapState::Ready);
    assert_eq!(snapshot.position, Some(GridPos::new(0, 0)));
    assert_eq!(snapshot.player.unwrap().health, 100);
    assert_eq!(snapshot.status, GameStatus::InProgress);

    let submitted = chain.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].entrypoint(), "create_game");
}

#[tokio::test]
async fn existing_session_restores_without_creation() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_at(2, 1)));

    let runtime = runtime_with(&chain);
    let snapshot = runtime.handle().connect(ADDRESS).await.unwrap();

    assert_eq!(snapshot.position, Some(GridPos::new(2, 1)));
    assert!(chain.submitted().is_empty());
}

#[tokio::test]
async fn reconnecting_the_same_identity_does_not_reinitialize() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(false);
    chain.set_game_state_after_create(state_at(0, 0));

    let runtime = runtime_with(&chain);
    let handle = runtime.handle();

    handle.connect(ADDRESS).await.unwrap();
    let snapshot = handle.connect(ADDRESS).await.unwrap();

    assert_eq!(snapshot.bootstrap, BootstrapState::Ready);
    // Only the original creation transaction; no double-submit.
    assert_eq!(chain.submitted().len(), 1);
}

#[tokio::test]
async fn restore_corrects_a_stale_in_progress_status_on_the_winning_cell() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_at(4, 4)));

    let runtime = runtime_with(&chain);
    let snapshot = runtime.handle().connect(ADDRESS).await.unwrap();

    assert_eq!(snapshot.status, GameStatus::Won);
}

#[tokio::test]
async fn restore_rebuilds_the_active_beast_encounter() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_with_beast(1, 1, EncounterKind::Vampire)));

    let runtime = runtime_with(&chain);
    let snapshot = runtime.handle().connect(ADDRESS).await.unwrap();

    let encounter = snapshot.encounter.unwrap();
    assert_eq!(encounter.kind, EncounterKind::Vampire);
    assert_eq!(encounter.phase, EncounterPhase::Engaged);
}

#[tokio::test]
async fn bootstrap_failure_surfaces_as_an_error_state() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(None); // restore finds nothing

    let runtime = runtime_with(&chain);
    let error = runtime.handle().connect(ADDRESS).await.unwrap_err();
    assert!(matches!(error, ActionError::Initialization(_)));

    let snapshot = runtime.handle().snapshot().await.unwrap();
    assert!(matches!(snapshot.bootstrap, BootstrapState::Error(_)));
    // No partial state was committed.
    assert!(snapshot.player.is_none());
    assert!(snapshot.position.is_none());
}

// ============================================================================
// Move flow
// ============================================================================

#[tokio::test]
async fn moving_onto_the_winning_cell_wins_and_suppresses_the_encounter() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_at(3, 4)));
    // Receipt carries both the new position and an encounter code; the win
    // must take precedence.
    chain.script_receipt(ReceiptScript::success(vec![
        MockChain::position_event(4, 4),
        MockChain::encounter_event(1),
    ]));

    let runtime = runtime_with(&chain);
    let handle = runtime.handle();
    handle.connect(ADDRESS).await.unwrap();

    let snapshot = handle.move_player(Direction::Right).await.unwrap();
    assert_eq!(snapshot.position, Some(GridPos::new(4, 4)));
    assert_eq!(snapshot.status, GameStatus::Won);
    assert!(snapshot.encounter.is_none());

    // Terminal state: further moves are refused locally.
    let error = handle.move_player(Direction::Left).await.unwrap_err();
    assert!(matches!(error, ActionError::AlreadyWon));
}

#[tokio::test]
async fn encounter_shows_immediately_and_enriches_asynchronously() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_at(0, 0)));
    chain.script_receipt(ReceiptScript::success(vec![
        MockChain::position_event(1, 0),
        MockChain::encounter_event(1),
    ]));
    chain.queue_beast(Some(BeastRecord {
        beast_type: 1,
        attack_points: 4,
        damage_points: 15,
    }));

    let runtime = runtime_with(&chain);
    let handle = runtime.handle();
    handle.connect(ADDRESS).await.unwrap();

    let mut states = handle.subscribe(Topic::State);
    let snapshot = handle.move_player(Direction::Right).await.unwrap();

    // The encounter is visible before the indexer answered.
    let encounter = snapshot.encounter.unwrap();
    assert_eq!(encounter.kind, EncounterKind::Werewolf);
    assert!(encounter.beast.is_none());

    // Enrichment lands in the background.
    let enriched = wait_for_state(&mut states, |s| {
        s.encounter.map(|e| e.beast.is_some()).unwrap_or(false)
    })
    .await;
    let beast = enriched.encounter.unwrap().beast.unwrap();
    assert_eq!(beast.kind, BeastKind::Werewolf);
    assert_eq!(beast.damage_points, 15);
}

#[tokio::test]
async fn movement_is_blocked_while_a_beast_is_unresolved() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_with_beast(1, 1, EncounterKind::Werewolf)));

    let runtime = runtime_with(&chain);
    let handle = runtime.handle();
    handle.connect(ADDRESS).await.unwrap();

    for direction in [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ] {
        let error = handle.move_player(direction).await.unwrap_err();
        assert!(matches!(
            error,
            ActionError::UnresolvedEncounter(EncounterKind::Werewolf)
        ));
    }
    // Precondition failures never reach the chain.
    assert!(chain.submitted().is_empty());
}

#[tokio::test]
async fn gift_encounter_notifies_and_is_dismissed_by_moving_on() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_at(0, 0)));
    chain.script_receipt(ReceiptScript::success(vec![
        MockChain::position_event(1, 0),
        MockChain::encounter_event(3), // FreeHealth
    ]));

    let runtime = runtime_with(&chain);
    let handle = runtime.handle();
    handle.connect(ADDRESS).await.unwrap();

    let mut notifications = handle.subscribe(Topic::Notification);
    let snapshot = handle.move_player(Direction::Right).await.unwrap();
    assert_eq!(
        snapshot.encounter.unwrap().kind,
        EncounterKind::FreeHealth
    );

    let toast = wait_for_notification(&mut notifications).await;
    assert_eq!(toast.severity, Severity::Success);
    assert!(toast.message.contains("Health restored"));

    // A gift does not block movement; the next move dismisses it.
    chain.script_receipt(ReceiptScript::success(vec![MockChain::position_event(
        2, 0,
    )]));
    let snapshot = handle.move_player(Direction::Right).await.unwrap();
    assert!(snapshot.encounter.is_none());
}

#[tokio::test]
async fn stat_refresh_after_a_move_synthesizes_delta_notifications() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_at(0, 0)));
    chain.script_receipt(ReceiptScript::success(vec![
        MockChain::position_event(1, 0),
        MockChain::encounter_event(3), // FreeHealth (gift toast arrives first)
    ]));
    // The refreshed player gained attack points on-chain.
    chain.queue_player(Some(PlayerRecord {
        health: 100,
        attack_points: 5,
        damage_points: 0,
        has_free_attack: false,
        has_free_flee: false,
    }));

    let runtime = runtime_with(&chain);
    let handle = runtime.handle();
    handle.connect(ADDRESS).await.unwrap();

    let mut notifications = handle.subscribe(Topic::Notification);
    let mut states = handle.subscribe(Topic::State);
    handle.move_player(Direction::Right).await.unwrap();

    // First the gift toast, then the stat delta from the refresh.
    let gift = wait_for_notification(&mut notifications).await;
    assert!(gift.message.contains("Health restored"));
    let delta = wait_for_notification(&mut notifications).await;
    assert!(delta.message.contains("+5 Attack"));

    let refreshed = wait_for_state(&mut states, |s| {
        s.player.map(|p| p.attack_points == 5).unwrap_or(false)
    })
    .await;
    assert_eq!(refreshed.player.unwrap().attack_points, 5);
}

// ============================================================================
// Fight / flee flow
// ============================================================================

#[tokio::test]
async fn fight_victory_clears_the_encounter_and_reports_the_outcome() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_with_beast(1, 1, EncounterKind::Werewolf)));
    // Indexer agrees the encounter is live.
    chain.queue_current_encounter(Some(CurrentEncounterRecord { encounter_type: 1 }));
    // Post-fight refresh: took 15 damage.
    chain.queue_player(Some(live_player(85)));

    let runtime = runtime_with(&chain);
    let handle = runtime.handle();
    handle.connect(ADDRESS).await.unwrap();

    let mut notifications = handle.subscribe(Topic::Notification);
    let snapshot = handle.fight().await.unwrap();
    assert!(snapshot.encounter.is_none());

    let toast = wait_for_notification(&mut notifications).await;
    assert!(toast.message.contains("Victory"));
    assert!(toast.message.contains("15 damage"));

    let submitted = chain.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].entrypoint(), "fight");
}

#[tokio::test]
async fn reverted_fight_mutates_nothing_and_keeps_the_encounter() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_with_beast(2, 2, EncounterKind::Werewolf)));
    chain.queue_current_encounter(Some(CurrentEncounterRecord { encounter_type: 1 }));
    chain.script_receipt(ReceiptScript::reverted("combat rejected"));

    let runtime = runtime_with(&chain);
    let handle = runtime.handle();
    let before = handle.connect(ADDRESS).await.unwrap();

    let error = handle.fight().await.unwrap_err();
    assert!(matches!(
        error,
        ActionError::Gateway(chain_core::GatewayError::Reverted { .. })
    ));

    let after = handle.snapshot().await.unwrap();
    // Neither stats nor position moved; only a later successful indexer
    // refresh may change them.
    assert_eq!(after.player, before.player);
    assert_eq!(after.position, before.position);
    // The speculative clear was rolled back to an engaged encounter.
    let encounter = after.encounter.unwrap();
    assert_eq!(encounter.kind, EncounterKind::Werewolf);
    assert_eq!(encounter.phase, EncounterPhase::Engaged);
}

#[tokio::test]
async fn fight_is_rejected_when_the_indexer_says_the_encounter_is_gone() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_with_beast(2, 2, EncounterKind::Werewolf)));
    // Indexer reports the encounter slot already empty.
    chain.queue_current_encounter(Some(CurrentEncounterRecord { encounter_type: 0 }));

    let runtime = runtime_with(&chain);
    let handle = runtime.handle();
    handle.connect(ADDRESS).await.unwrap();

    let error = handle.fight().await.unwrap_err();
    assert!(matches!(error, ActionError::EncounterOutOfSync));

    // Local encounter cleared, and no transaction was submitted.
    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.encounter.is_none());
    assert!(chain.submitted().is_empty());
}

#[tokio::test]
async fn flee_without_an_encounter_is_a_local_precondition_error() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_at(1, 1)));

    let runtime = runtime_with(&chain);
    let handle = runtime.handle();
    handle.connect(ADDRESS).await.unwrap();

    let error = handle.flee().await.unwrap_err();
    assert!(matches!(error, ActionError::NoActiveEncounter));
    assert!(chain.submitted().is_empty());
}

#[tokio::test]
async fn dying_in_combat_marks_the_session_lost() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_with_beast(1, 1, EncounterKind::Vampire)));
    chain.queue_current_encounter(Some(CurrentEncounterRecord { encounter_type: 2 }));
    // Post-fight refresh: health reached zero.
    chain.queue_player(Some(PlayerRecord {
        health: 0,
        attack_points: 2,
        damage_points: 1,
        has_free_attack: false,
        has_free_flee: false,
    }));

    let runtime = runtime_with(&chain);
    let handle = runtime.handle();
    handle.connect(ADDRESS).await.unwrap();

    let mut notifications = handle.subscribe(Topic::Notification);
    let mut states = handle.subscribe(Topic::State);
    handle.fight().await.unwrap();

    let toast = wait_for_notification(&mut notifications).await;
    assert_eq!(toast.severity, Severity::Error);
    assert!(toast.message.contains("died"));

    let lost = wait_for_state(&mut states, |s| s.status == GameStatus::Lost).await;
    assert_eq!(lost.status, GameStatus::Lost);

    // Terminal state: no further actions are accepted.
    let error = handle.move_player(Direction::Up).await.unwrap_err();
    assert!(matches!(error, ActionError::GameOver));
}

// ============================================================================
// Concurrency guards
// ============================================================================

#[tokio::test]
async fn a_second_action_is_refused_while_one_is_in_flight() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_at(0, 0)));
    // Keep the first move in flight long enough to observe the overlap.
    chain.script_receipt(
        ReceiptScript::success(vec![MockChain::position_event(1, 0)]).pending_polls(4),
    );

    let runtime = SessionRuntime::builder()
        .chain(chain.clone())
        .addresses(MockChain::world_address(), MockChain::game_systems_address())
        .finality_policy(FinalityPolicy {
            max_attempts: 9,
            poll_interval: Duration::from_millis(50),
            retry_delay: Duration::ZERO,
        })
        .query_policy(QueryPolicy::no_delay(5))
        .build()
        .unwrap();
    let handle = runtime.handle();
    handle.connect(ADDRESS).await.unwrap();

    let racing = handle.clone();
    let first = tokio::spawn(async move { racing.move_player(Direction::Right).await });

    // Give the first command time to be accepted.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let error = handle.move_player(Direction::Down).await.unwrap_err();
    assert!(matches!(error, ActionError::Busy));

    let first = first.await.unwrap().unwrap();
    assert_eq!(first.position, Some(GridPos::new(1, 0)));
}

#[tokio::test]
async fn stale_enrichment_from_a_previous_session_is_dropped() {
    let chain = Arc::new(MockChain::new());
    chain.set_game_exists(true);
    chain.set_game_state(Some(state_at(0, 0)));
    chain.script_receipt(ReceiptScript::success(vec![
        MockChain::position_event(1, 0),
        MockChain::encounter_event(1),
    ]));

    // Enrichment waits on the linear backoff, so it is still in flight
    // when the identity changes underneath it.
    let runtime = SessionRuntime::builder()
        .chain(chain.clone())
        .addresses(MockChain::world_address(), MockChain::game_systems_address())
        .finality_policy(FinalityPolicy::no_delay(9))
        .query_policy(QueryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
        })
        .build()
        .unwrap();
    let handle = runtime.handle();

    handle.connect(ADDRESS).await.unwrap();
    let snapshot = handle.move_player(Direction::Right).await.unwrap();
    assert!(snapshot.encounter.unwrap().beast.is_none());

    // Switch identity while the enrichment query is still sleeping, and
    // restore a session that also has a stat-less Werewolf encounter.
    handle.disconnect().await.unwrap();
    chain.set_game_state(Some(state_with_beast(1, 1, EncounterKind::Werewolf)));
    chain.queue_beast(Some(BeastRecord {
        beast_type: 1,
        attack_points: 4,
        damage_points: 15,
    }));
    handle.connect(OTHER_ADDRESS).await.unwrap();

    // Let the stale enrichment complete; its epoch no longer matches, so
    // it must not attach stats to the new session's encounter.
    tokio::time::sleep(Duration::from_millis(700)).await;
    let snapshot = handle.snapshot().await.unwrap();
    let encounter = snapshot.encounter.unwrap();
    assert_eq!(encounter.kind, EncounterKind::Werewolf);
    assert!(encounter.beast.is_none());
}
