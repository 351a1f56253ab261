//! Torii indexer client over the SQL HTTP endpoint.
//!
//! Torii mirrors on-chain models into per-model SQL tables named
//! `"{namespace}-{Model}"` and exposes a read-only `/sql` endpoint. One-row
//! keyed lookups serve the entity queries; the historical table serves the
//! event log. Rows lag the chain, so callers wrap these reads in
//! [`chain_core::StateFetcher`]'s retry policy.

use async_trait::async_trait;
use serde_json::Value;

use chain_core::{
    BeastRecord, CurrentEncounterRecord, GameEventRow, IndexerGateway, PlayerRecord, QueryError,
};
use game_types::GameId;

use crate::config::StarknetConfig;

/// Read client for the Torii indexer.
pub struct ToriiClient {
    http: reqwest::Client,
    torii_url: String,
    namespace: String,
}

impl ToriiClient {
    pub fn new(config: &StarknetConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            torii_url: config.torii_url.clone(),
            namespace: config.namespace.clone(),
        }
    }

    async fn sql(&self, query: String) -> Result<Vec<Value>, QueryError> {
        let url = format!("{}/sql", self.torii_url);

        let response = self
            .http
            .get(&url)
            .query(&[("query", query.as_str())])
            .send()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::Network(format!(
                "indexer returned status {status}"
            )));
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| QueryError::InvalidResponse(e.to_string()))
    }

    /// Fetches the newest row of a model table for the given session.
    async fn entity_row(&self, model: &str, game_id: GameId) -> Result<Option<Value>, QueryError> {
        let query = format!(
            "SELECT * FROM \"{ns}-{model}\" WHERE game_id = '{id:#x}' LIMIT 1",
            ns = self.namespace,
            id = game_id.as_u64(),
        );

        let mut rows = self.sql(query).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.swap_remove(0)))
    }
}

#[async_trait]
impl IndexerGateway for ToriiClient {
    async fn player(&self, game_id: GameId) -> Result<Option<PlayerRecord>, QueryError> {
        let Some(row) = self.entity_row("Player", game_id).await? else {
            return Ok(None);
        };
        Ok(player_from_row(&row))
    }

    async fn beast_encounter(&self, game_id: GameId) -> Result<Option<BeastRecord>, QueryError> {
        let Some(row) = self.entity_row("BeastEncounter", game_id).await? else {
            return Ok(None);
        };
        Ok(beast_from_row(&row))
    }

    async fn current_encounter(
        &self,
        game_id: GameId,
    ) -> Result<Option<CurrentEncounterRecord>, QueryError> {
        let Some(row) = self.entity_row("CurrentEncounter", game_id).await? else {
            return Ok(None);
        };
        Ok(current_encounter_from_row(&row))
    }

    async fn game_events(&self, game_id: GameId) -> Result<Vec<GameEventRow>, QueryError> {
        let query = format!(
            "SELECT data FROM \"event_messages_historical\" \
             WHERE keys = '{id:#x}/' ORDER BY executed_at DESC LIMIT 1000",
            id = game_id.as_u64(),
        );

        let rows = self.sql(query).await?;
        let events = rows
            .iter()
            .filter_map(event_row_from_value)
            .collect::<Vec<_>>();

        tracing::debug!(%game_id, count = events.len(), "fetched historical event rows");
        Ok(events)
    }
}

// ============================================================================
// Row parsing
// ============================================================================
// Torii serializes felts as either JSON numbers or hex/decimal strings
// depending on width, so every numeric read goes through `row_u64`.

fn row_u64(row: &Value, key: &str) -> Option<u64> {
    let value = row.get(key)?;

    if let Some(number) = value.as_u64() {
        return Some(number);
    }

    let text = value.as_str()?.trim();
    if let Some(hex_part) = text.strip_prefix("0x") {
        return u64::from_str_radix(hex_part, 16).ok();
    }
    text.parse().ok()
}

fn row_bool(row: &Value, key: &str) -> bool {
    match row.get(key) {
        Some(Value::Bool(flag)) => *flag,
        _ => row_u64(row, key) == Some(1),
    }
}

fn player_from_row(row: &Value) -> Option<PlayerRecord> {
    Some(PlayerRecord {
        health: row_u64(row, "health")? as u16,
        attack_points: row_u64(row, "attack_points")? as u16,
        damage_points: row_u64(row, "damage_points")? as u16,
        has_free_attack: row_bool(row, "has_free_attack"),
        has_free_flee: row_bool(row, "has_free_flee"),
    })
}

fn beast_from_row(row: &Value) -> Option<BeastRecord> {
    Some(BeastRecord {
        beast_type: row_u64(row, "beast_type")? as u8,
        attack_points: row_u64(row, "attack_points")? as u16,
        damage_points: row_u64(row, "damage_points")? as u16,
    })
}

fn current_encounter_from_row(row: &Value) -> Option<CurrentEncounterRecord> {
    Some(CurrentEncounterRecord {
        encounter_type: row_u64(row, "encounter_type")? as u8,
    })
}

/// Historical rows store the event's data felts as a JSON-encoded array in
/// the `data` column.
fn event_row_from_value(row: &Value) -> Option<GameEventRow> {
    let raw = row.get("data")?.as_str()?;
    let data: Vec<String> = serde_json::from_str(raw).ok()?;
    Some(GameEventRow { data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_fields_accept_numbers_and_strings() {
        let row = json!({
            "health": 80,
            "attack_points": "0x5",
            "damage_points": "3",
            "has_free_attack": 1,
            "has_free_flee": false,
        });

        let record = player_from_row(&row).unwrap();
        assert_eq!(record.health, 80);
        assert_eq!(record.attack_points, 5);
        assert_eq!(record.damage_points, 3);
        assert!(record.has_free_attack);
        assert!(!record.has_free_flee);
    }

    #[test]
    fn missing_fields_reject_the_row() {
        let row = json!({ "health": 80 });
        assert!(player_from_row(&row).is_none());
    }

    #[test]
    fn beast_row_parses_wire_types() {
        let row = json!({
            "beast_type": "0x2",
            "attack_points": 4,
            "damage_points": 9,
        });

        let record = beast_from_row(&row).unwrap();
        assert_eq!(record.beast_type, 2);
        assert!(!record.is_placeholder());
    }

    #[test]
    fn event_rows_decode_their_data_column() {
        let row = json!({ "data": "[\"0x1\", \"0x2\"]" });
        let event = event_row_from_value(&row).unwrap();
        assert_eq!(event.data, vec!["0x1".to_string(), "0x2".to_string()]);

        let bad = json!({ "data": "not json" });
        assert!(event_row_from_value(&bad).is_none());
    }
}
