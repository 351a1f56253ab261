//! Starknet JSON-RPC client: direct view calls and receipt polling.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use chain_core::{
    CompleteGameState, ContractAddress, EmittedEvent, ExecutionStatus, QueryError, ReceiptSource,
    ReceiptStatus, StateReader, TransportError, TxHash, TxReceipt,
};
use game_types::GameId;

use crate::config::StarknetConfig;

/// JSON-RPC error code for an unknown transaction hash, which means the
/// transaction has not reached the node yet and polling should continue.
const TXN_HASH_NOT_FOUND: i64 = 29;

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

/// Read-path client against a Starknet JSON-RPC node.
///
/// Implements [`StateReader`] (contract view calls) and [`ReceiptSource`]
/// (finality polling). All failures are logged here; decode problems on the
/// state path degrade to `None` per the read-path error policy.
pub struct JsonRpcClient {
    http: reqwest::Client,
    rpc_url: String,
    game_systems: ContractAddress,
    get_game_state_selector: String,
    game_exists_selector: String,
}

impl JsonRpcClient {
    pub fn new(config: &StarknetConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: config.rpc_url.clone(),
            game_systems: config.game_systems_address.clone(),
            get_game_state_selector: config.entry_points.get_game_state.clone(),
            game_exists_selector: config.entry_points.game_exists.clone(),
        }
    }

    async fn post(&self, method: &str, params: Value) -> Result<JsonRpcResponse, QueryError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 0,
        });

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::Network(format!(
                "rpc endpoint returned status {status}"
            )));
        }

        response
            .json::<JsonRpcResponse>()
            .await
            .map_err(|e| QueryError::InvalidResponse(e.to_string()))
    }

    /// Executes a `starknet_call` against the game-systems contract.
    async fn call(&self, selector: &str, calldata: Vec<String>) -> Result<Vec<String>, QueryError> {
        let params = json!([
            {
                "contract_address": format!("0x{}", self.game_systems.as_canonical()),
                "entry_point_selector": selector,
                "calldata": calldata,
            },
            "latest",
        ]);

        let response = self.post("starknet_call", params).await?;

        if let Some(error) = response.error {
            return Err(QueryError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        let result = response
            .result
            .ok_or_else(|| QueryError::InvalidResponse("missing result".into()))?;

        serde_json::from_value(result)
            .map_err(|e| QueryError::InvalidResponse(format!("call result is not a felt array: {e}")))
    }
}

#[async_trait]
impl StateReader for JsonRpcClient {
    async fn game_state(&self, game_id: GameId) -> Result<Option<CompleteGameState>, QueryError> {
        let calldata = vec![format!("{:#x}", game_id.as_u64())];

        let felts = match self.call(&self.get_game_state_selector, calldata).await {
            Ok(felts) => felts,
            // The node answered but the call itself failed (typically an
            // uninitialized session); surface as "no state", not an error.
            Err(QueryError::Rpc { code, message }) => {
                tracing::debug!(%game_id, code, message, "get_game_state call rejected");
                return Ok(None);
            }
            Err(error) => return Err(error),
        };

        match CompleteGameState::from_felts(&felts) {
            Ok(state) => {
                tracing::debug!(%game_id, position = ?state.position, status = %state.status, "fetched game state");
                Ok(Some(state))
            }
            Err(error) => {
                tracing::warn!(%game_id, %error, "game state response did not decode");
                Ok(None)
            }
        }
    }

    async fn game_exists(&self, game_id: GameId) -> Result<bool, QueryError> {
        let calldata = vec![format!("{:#x}", game_id.as_u64())];

        match self.call(&self.game_exists_selector, calldata).await {
            Ok(felts) => {
                let exists = felts.first().map(|felt| felt == "0x1").unwrap_or(false);
                tracing::debug!(%game_id, exists, "checked game existence");
                Ok(exists)
            }
            Err(QueryError::Rpc { code, message }) => {
                tracing::warn!(%game_id, code, message, "game_exists call rejected, assuming absent");
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }
}

#[async_trait]
impl ReceiptSource for JsonRpcClient {
    async fn receipt(&self, tx: &TxHash) -> Result<ReceiptStatus, TransportError> {
        let response = self
            .post("starknet_getTransactionReceipt", json!([tx.as_str()]))
            .await
            .map_err(query_to_transport)?;

        if let Some(error) = response.error {
            if error.code == TXN_HASH_NOT_FOUND {
                return Ok(ReceiptStatus::Pending);
            }
            return Err(TransportError::Network(format!(
                "rpc error {}: {}",
                error.code, error.message
            )));
        }

        let result = response
            .result
            .ok_or_else(|| TransportError::InvalidResponse("missing result".into()))?;

        Ok(receipt_from_value(tx, &result))
    }
}

fn query_to_transport(error: QueryError) -> TransportError {
    match error {
        QueryError::Network(message) => TransportError::Network(message),
        QueryError::Rpc { code, message } => {
            TransportError::Network(format!("rpc error {code}: {message}"))
        }
        QueryError::InvalidResponse(message) => TransportError::InvalidResponse(message),
    }
}

/// Maps a `starknet_getTransactionReceipt` result into a [`ReceiptStatus`].
///
/// A receipt without an `execution_status` field is still in flight.
fn receipt_from_value(tx: &TxHash, value: &Value) -> ReceiptStatus {
    let Some(execution_status) = value.get("execution_status").and_then(Value::as_str) else {
        return ReceiptStatus::Pending;
    };

    let events = value
        .get("events")
        .and_then(Value::as_array)
        .map(|events| events.iter().filter_map(event_from_value).collect())
        .unwrap_or_default();

    let execution_status = if execution_status == "REVERTED" {
        let reason = value
            .get("revert_reason")
            .and_then(Value::as_str)
            .unwrap_or("transaction reverted")
            .to_string();
        ExecutionStatus::Reverted { reason }
    } else {
        ExecutionStatus::Succeeded
    };

    ReceiptStatus::Final(TxReceipt {
        tx_hash: tx.clone(),
        execution_status,
        events,
    })
}

fn event_from_value(value: &Value) -> Option<EmittedEvent> {
    let from_address = value.get("from_address").and_then(Value::as_str)?;

    let string_array = |key: &str| -> Vec<String> {
        value
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    };

    Some(EmittedEvent {
        from_address: ContractAddress::new(from_address),
        keys: string_array("keys"),
        data: string_array("data"),
    })
}
