//! Wire types shared between the chain abstraction and its clients.

use serde::{Deserialize, Serialize};

use game_types::{
    BeastKind, BeastStats, Direction, EncounterKind, GameId, GameStatus, GridPos, PlayerState,
};

// ============================================================================
// Identifiers
// ============================================================================

/// Contract address, normalized for comparison.
///
/// Receipt events carry addresses in whatever hex formatting the node chose
/// (casing, leading zeros), so equality works on a canonical form: lowercase
/// hex without the `0x` prefix or leading zeros.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractAddress(String);

impl ContractAddress {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let hex_part = raw.as_ref().trim().trim_start_matches("0x");
        let canonical = hex_part.trim_start_matches('0').to_ascii_lowercase();
        Self(canonical)
    }

    pub fn as_canonical(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Transaction hash as returned by the submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Write path
// ============================================================================

/// A player action encoded as a contract call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCall {
    CreateGame { game_id: GameId },
    Move { game_id: GameId, direction: Direction },
    Fight { game_id: GameId },
    Flee { game_id: GameId },
}

impl ActionCall {
    pub fn game_id(&self) -> GameId {
        match self {
            ActionCall::CreateGame { game_id }
            | ActionCall::Move { game_id, .. }
            | ActionCall::Fight { game_id }
            | ActionCall::Flee { game_id } => *game_id,
        }
    }

    /// Entry point name on the game-logic contract.
    pub fn entrypoint(&self) -> &'static str {
        match self {
            ActionCall::CreateGame { .. } => "create_game",
            ActionCall::Move { .. } => "move",
            ActionCall::Fight { .. } => "fight",
            ActionCall::Flee { .. } => "flee",
        }
    }

    /// Calldata felts in call order.
    pub fn calldata(&self) -> Vec<u64> {
        match self {
            ActionCall::CreateGame { game_id }
            | ActionCall::Fight { game_id }
            | ActionCall::Flee { game_id } => vec![game_id.as_u64()],
            ActionCall::Move { game_id, direction } => {
                vec![game_id.as_u64(), direction.wire_index()]
            }
        }
    }
}

/// Execution outcome recorded in a finalized receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Succeeded,
    Reverted { reason: String },
}

/// One event emitted during transaction execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedEvent {
    pub from_address: ContractAddress,
    pub keys: Vec<String>,
    pub data: Vec<String>,
}

/// A finalized transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub execution_status: ExecutionStatus,
    pub events: Vec<EmittedEvent>,
}

/// Poll result for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// Not yet final (unknown hash or still in flight).
    Pending,
    Final(TxReceipt),
}

// ============================================================================
// Indexer records
// ============================================================================

/// Player entity as mirrored by the indexer.
///
/// The indexer may return a stale placeholder before the real data has
/// propagated; `is_placeholder` detects the all-zero sentinel that must
/// never be accepted as valid stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub health: u16,
    pub attack_points: u16,
    pub damage_points: u16,
    pub has_free_attack: bool,
    pub has_free_flee: bool,
}

impl PlayerRecord {
    pub fn is_placeholder(&self) -> bool {
        self.health == 0 && self.attack_points == 0 && self.damage_points == 0
    }
}

impl From<PlayerRecord> for PlayerState {
    fn from(record: PlayerRecord) -> Self {
        PlayerState {
            health: record.health,
            attack_points: record.attack_points,
            damage_points: record.damage_points,
            has_free_attack: record.has_free_attack,
            has_free_flee: record.has_free_flee,
        }
    }
}

/// Beast entity as mirrored by the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeastRecord {
    pub beast_type: u8,
    pub attack_points: u16,
    pub damage_points: u16,
}

impl BeastRecord {
    /// `beast_type == 0` or all-zero stats mean the record has not
    /// propagated yet.
    pub fn is_placeholder(&self) -> bool {
        self.beast_type == 0 || (self.attack_points == 0 && self.damage_points == 0)
    }

    pub fn to_stats(&self) -> Option<BeastStats> {
        Some(BeastStats {
            kind: BeastKind::from_code(self.beast_type)?,
            attack_points: self.attack_points,
            damage_points: self.damage_points,
        })
    }
}

/// Current-encounter entity as mirrored by the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentEncounterRecord {
    pub encounter_type: u8,
}

impl CurrentEncounterRecord {
    /// `None` means the encounter slot is empty (type 0), i.e. already
    /// resolved on-chain.
    pub fn kind(&self) -> Option<EncounterKind> {
        EncounterKind::from_code(self.encounter_type)
    }
}

/// One row of the historical event query (decoded data felts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEventRow {
    pub data: Vec<String>,
}

// ============================================================================
// Direct-call state view
// ============================================================================

/// Errors decoding the flat `get_game_state` response.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("expected at least {expected} felts, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("felt at index {index} is not valid hex: {value:?}")]
    BadFelt { index: usize, value: String },
}

/// Parses a hex-encoded felt (with or without `0x` prefix).
pub fn parse_felt(value: &str) -> Option<u64> {
    let hex_part = value.trim().trim_start_matches("0x");
    if hex_part.is_empty() {
        return None;
    }
    u64::from_str_radix(hex_part, 16).ok()
}

/// Complete session state as returned by the contract's `get_game_state`
/// view function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteGameState {
    pub player: PlayerState,
    pub position: GridPos,
    pub status: GameStatus,
    pub current_encounter: Option<EncounterKind>,
    pub beast: Option<BeastStats>,
}

/// Number of felts in the serialized `CompleteGameState` struct.
///
/// player(6) + position(3) + status(2) + current_encounter(2) +
/// beast_encounter(4) + has_beast(1). Each nested struct leads with its own
/// game_id field, which is skipped during decode. Treat the layout as a
/// versioned wire fact pinned by the tests below.
pub const GAME_STATE_FELTS: usize = 18;

impl CompleteGameState {
    pub fn from_felts(felts: &[String]) -> Result<Self, DecodeError> {
        if felts.len() < GAME_STATE_FELTS {
            return Err(DecodeError::TooShort {
                expected: GAME_STATE_FELTS,
                actual: felts.len(),
            });
        }

        let felt = |index: usize| -> Result<u64, DecodeError> {
            parse_felt(&felts[index]).ok_or_else(|| DecodeError::BadFelt {
                index,
                value: felts[index].clone(),
            })
        };

        // player: game_id, health, damage_points, attack_points,
        //         has_free_flee, has_free_attack
        let health = felt(1)? as u16;
        let damage_points = felt(2)? as u16;
        let attack_points = felt(3)? as u16;
        let has_free_flee = felt(4)? == 1;
        let has_free_attack = felt(5)? == 1;

        // position: game_id, x, y
        let x = felt(7)? as u8;
        let y = felt(8)? as u8;

        // game_state: game_id, status
        let status = GameStatus::from_code(felt(10)?);

        // current_encounter: game_id, encounter_type
        let current_encounter = EncounterKind::from_code(felt(12)? as u8);

        // beast_encounter: game_id, beast_type, attack_points, damage_points
        let beast_type = felt(14)? as u8;
        let beast_attack = felt(15)? as u16;
        let beast_damage = felt(16)? as u16;

        // has_beast
        let has_beast = felt(17)? == 1;

        let beast = if has_beast {
            BeastKind::from_code(beast_type).map(|kind| BeastStats {
                kind,
                attack_points: beast_attack,
                damage_points: beast_damage,
            })
        } else {
            None
        };

        Ok(CompleteGameState {
            player: PlayerState {
                health,
                attack_points,
                damage_points,
                has_free_attack,
                has_free_flee,
            },
            position: GridPos::new(x, y),
            status,
            current_encounter,
            beast,
        })
    }
}
