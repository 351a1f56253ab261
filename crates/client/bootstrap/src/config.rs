//! Client runtime configuration loaded from the process environment.

use std::env;
use std::time::Duration;

use chain_core::{FinalityPolicy, QueryPolicy};
use chain_starknet::StarknetConfig;
use client_runtime::SessionRuntimeConfig;

/// Everything needed to assemble a session runtime.
///
/// Environment variables (all optional unless noted by
/// [`StarknetConfig::validate`]):
/// - `SCARD_RPC_URL`, `SCARD_TORII_URL`, `SCARD_WORLD_ADDRESS`,
///   `SCARD_GAME_SYSTEMS_ADDRESS`, `SCARD_NAMESPACE`, and the entry point
///   selectors - see [`StarknetConfig`]
/// - `SCARD_TX_MAX_RETRIES` - finality poll attempts (default: 9)
/// - `SCARD_TX_RETRY_INTERVAL_MS` - poll interval (default: 350)
/// - `SCARD_TX_RETRY_DELAY_MS` - pause after a failed poll (default: 500)
/// - `SCARD_QUERY_MAX_RETRIES` - indexer query attempts (default: 5)
/// - `SCARD_QUERY_BASE_DELAY_MS` - linear backoff unit (default: 300)
/// - `SCARD_COMMAND_BUFFER` - command queue size (default: 32)
/// - `SCARD_EVENT_CAPACITY` - event bus capacity per topic (default: 100)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub starknet: StarknetConfig,
    pub finality: FinalityPolicy,
    pub query: QueryPolicy,
    pub runtime: SessionRuntimeConfig,
}

impl ClientConfig {
    /// Construct configuration from environment variables, honoring a
    /// `.env` file in the working directory.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut finality = FinalityPolicy::default();
        if let Some(attempts) = read_env::<u32>("SCARD_TX_MAX_RETRIES") {
            finality.max_attempts = attempts.max(1);
        }
        if let Some(interval) = read_env::<u64>("SCARD_TX_RETRY_INTERVAL_MS") {
            finality.poll_interval = Duration::from_millis(interval);
        }
        if let Some(delay) = read_env::<u64>("SCARD_TX_RETRY_DELAY_MS") {
            finality.retry_delay = Duration::from_millis(delay);
        }

        let mut query = QueryPolicy::default();
        if let Some(attempts) = read_env::<u32>("SCARD_QUERY_MAX_RETRIES") {
            query.max_attempts = attempts.max(1);
        }
        if let Some(delay) = read_env::<u64>("SCARD_QUERY_BASE_DELAY_MS") {
            query.base_delay = Duration::from_millis(delay);
        }

        let mut runtime = SessionRuntimeConfig::default();
        if let Some(buffer) = read_env::<usize>("SCARD_COMMAND_BUFFER") {
            runtime.command_buffer = buffer.max(1);
        }
        if let Some(capacity) = read_env::<usize>("SCARD_EVENT_CAPACITY") {
            runtime.event_capacity = capacity.max(1);
        }

        Self {
            starknet: StarknetConfig::from_env(),
            finality,
            query,
            runtime,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
