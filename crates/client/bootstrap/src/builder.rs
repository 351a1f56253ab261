//! Builds the session runtime and HTTP clients used by front-ends.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

use chain_core::ActionSubmitter;
use chain_starknet::{JsonRpcClient, ToriiClient};
use client_runtime::SessionRuntime;

use crate::config::ClientConfig;

/// Builder that assembles the session runtime from configuration plus the
/// wallet capability.
pub struct SessionBuilder {
    config: ClientConfig,
    submitter: Option<Arc<dyn ActionSubmitter>>,
}

impl SessionBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            submitter: None,
        }
    }

    /// Provide the wallet capability used to submit signed action
    /// transactions.
    pub fn submitter(mut self, submitter: impl ActionSubmitter + 'static) -> Self {
        self.submitter = Some(Arc::new(submitter));
        self
    }

    /// Assemble the runtime. Must be called from within a tokio runtime,
    /// since the session worker is spawned immediately.
    pub fn build(self) -> Result<SessionSetup> {
        self.config
            .starknet
            .validate()
            .map_err(|message| anyhow!("invalid chain configuration: {message}"))?;

        let submitter = self
            .submitter
            .context("a wallet action submitter is required")?;

        let rpc = Arc::new(JsonRpcClient::new(&self.config.starknet));
        let torii = Arc::new(ToriiClient::new(&self.config.starknet));

        let runtime = SessionRuntime::builder()
            .config(self.config.runtime)
            .submitter(submitter)
            .receipts(rpc.clone())
            .reader(rpc)
            .indexer(torii)
            .addresses(
                self.config.starknet.world_address.clone(),
                self.config.starknet.game_systems_address.clone(),
            )
            .finality_policy(self.config.finality)
            .query_policy(self.config.query)
            .build()
            .context("failed to build the session runtime")?;

        tracing::info!(
            rpc = %self.config.starknet.rpc_url,
            torii = %self.config.starknet.torii_url,
            "session runtime assembled"
        );

        Ok(SessionSetup {
            config: self.config,
            runtime,
        })
    }
}

/// Assembled runtime bundle handed to front-ends.
pub struct SessionSetup {
    pub config: ClientConfig,
    pub runtime: SessionRuntime,
}
