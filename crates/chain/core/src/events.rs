//! Receipt event decoding.
//!
//! Domain events are emitted by the world contract with the game-logic
//! contract encoded in a key slot; position and encounter facts sit at fixed
//! data offsets. The offsets were inferred empirically from observed
//! receipts, so they live behind a versioned [`EventLayout`] pinned by unit
//! tests rather than being scattered through the parsing code.

use game_types::{EncounterKind, GridPos};

use crate::types::{ContractAddress, TxReceipt, parse_felt};

/// Domain facts extracted from a finalized receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParsedGameEvents {
    /// New player position, when the receipt carried a movement event.
    pub position: Option<GridPos>,

    /// Encounter code in 1..=8, when the receipt carried an
    /// encounter-generated event. Codes outside the valid range are
    /// discarded as noise, not reported.
    pub encounter_code: Option<u8>,
}

/// Versioned field-offset convention for world-emitted game events.
#[derive(Debug, Clone, Copy)]
pub struct EventLayout {
    /// Key slot holding the emitting system's contract address.
    pub system_key_slot: usize,

    /// Minimum data length for an event to carry a position.
    pub min_position_fields: usize,

    /// Offsets of the coordinates within the data array.
    pub position_x: usize,
    pub position_y: usize,

    /// Exact data length of an encounter-generated event; the code is the
    /// last field.
    pub encounter_fields: usize,
}

impl EventLayout {
    /// Layout observed against the current world emitter.
    pub const V1: EventLayout = EventLayout {
        system_key_slot: 2,
        min_position_fields: 6,
        position_x: 4,
        position_y: 5,
        encounter_fields: 4,
    };

    /// Extracts position and encounter facts from the receipt's event log.
    ///
    /// Only events originating from `world` whose system key slot matches
    /// `game_systems` are considered; everything else in the receipt is
    /// incidental framework traffic. Pure and deterministic; malformed
    /// felts are skipped.
    pub fn decode(
        &self,
        receipt: &TxReceipt,
        game_systems: &ContractAddress,
        world: &ContractAddress,
    ) -> ParsedGameEvents {
        let mut parsed = ParsedGameEvents::default();

        let game_events = receipt.events.iter().filter(|event| {
            let from_world = event.from_address == *world;
            let has_system_key = event
                .keys
                .get(self.system_key_slot)
                .map(|key| ContractAddress::new(key) == *game_systems)
                .unwrap_or(false);
            from_world && has_system_key
        });

        for event in game_events {
            if event.data.len() >= self.min_position_fields {
                let x = parse_felt(&event.data[self.position_x]);
                let y = parse_felt(&event.data[self.position_y]);
                if let (Some(x), Some(y)) = (x, y)
                    && let (Ok(x), Ok(y)) = (u8::try_from(x), u8::try_from(y))
                {
                    parsed.position = Some(GridPos::new(x, y));
                }
            }

            if event.data.len() == self.encounter_fields {
                let code = event
                    .data
                    .last()
                    .and_then(|felt| parse_felt(felt))
                    .and_then(|code| u8::try_from(code).ok());
                if let Some(code) = code
                    && EncounterKind::from_code(code).is_some()
                {
                    parsed.encounter_code = Some(code);
                }
            }
        }

        parsed
    }
}
