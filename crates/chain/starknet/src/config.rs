//! Deployment configuration for the Starknet clients.
//!
//! Deployment facts are read from environment variables (a `.env` file is
//! honored by the bootstrap crate):
//! - `SCARD_RPC_URL` - Starknet JSON-RPC endpoint
//! - `SCARD_TORII_URL` - Torii indexer endpoint
//! - `SCARD_WORLD_ADDRESS` - world contract address (event origin)
//! - `SCARD_GAME_SYSTEMS_ADDRESS` - game-logic contract address
//! - `SCARD_NAMESPACE` - model namespace (default: "scard")
//! - `SCARD_GET_GAME_STATE_SELECTOR` - entry point selector for `get_game_state`
//! - `SCARD_GAME_EXISTS_SELECTOR` - entry point selector for `game_exists`

use std::env;

use chain_core::ContractAddress;

const DEFAULT_RPC_URL: &str = "https://api.cartridge.gg/x/starknet/sepolia";
const DEFAULT_TORII_URL: &str = "https://api.cartridge.gg/x/scard/torii";
const DEFAULT_NAMESPACE: &str = "scard";

/// Entry point selectors of the game-logic contract's view functions.
///
/// Selectors are `starknet_keccak(function_name)` values computed at
/// deployment time and shipped with the manifest; they are configuration,
/// not something this client derives.
#[derive(Debug, Clone, Default)]
pub struct EntryPoints {
    pub get_game_state: String,
    pub game_exists: String,
}

/// Configuration for [`crate::JsonRpcClient`] and [`crate::ToriiClient`].
#[derive(Debug, Clone)]
pub struct StarknetConfig {
    pub rpc_url: String,
    pub torii_url: String,
    pub world_address: ContractAddress,
    pub game_systems_address: ContractAddress,
    pub namespace: String,
    pub entry_points: EntryPoints,
}

impl StarknetConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            rpc_url: env::var("SCARD_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()),
            torii_url: env::var("SCARD_TORII_URL")
                .unwrap_or_else(|_| DEFAULT_TORII_URL.to_string()),
            world_address: ContractAddress::new(
                env::var("SCARD_WORLD_ADDRESS").unwrap_or_default(),
            ),
            game_systems_address: ContractAddress::new(
                env::var("SCARD_GAME_SYSTEMS_ADDRESS").unwrap_or_default(),
            ),
            namespace: env::var("SCARD_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
            entry_points: EntryPoints {
                get_game_state: env::var("SCARD_GET_GAME_STATE_SELECTOR").unwrap_or_default(),
                game_exists: env::var("SCARD_GAME_EXISTS_SELECTOR").unwrap_or_default(),
            },
        }
    }

    /// Validate that every deployment fact required at runtime is present.
    pub fn validate(&self) -> Result<(), String> {
        if self.rpc_url.is_empty() {
            return Err("rpc_url must not be empty".to_string());
        }
        if self.torii_url.is_empty() {
            return Err("torii_url must not be empty".to_string());
        }
        if self.world_address.is_empty() {
            return Err("world_address is not configured (SCARD_WORLD_ADDRESS)".to_string());
        }
        if self.game_systems_address.is_empty() {
            return Err(
                "game_systems_address is not configured (SCARD_GAME_SYSTEMS_ADDRESS)".to_string(),
            );
        }
        if self.entry_points.get_game_state.is_empty() || self.entry_points.game_exists.is_empty() {
            return Err("entry point selectors are not configured".to_string());
        }
        Ok(())
    }
}
