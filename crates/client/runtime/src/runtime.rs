//! Session runtime orchestrator and builder.
//!
//! [`SessionRuntime`] owns the worker task and hands out cloneable
//! [`SessionHandle`]s. Capabilities are injected through the builder so the
//! same runtime drives the real HTTP clients and the in-memory mock alike.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use chain_core::{
    ActionSubmitter, ContractAddress, EventLayout, FinalityPolicy, IndexerGateway, QueryPolicy,
    ReceiptSource, StateFetcher, StateReader, TransactionGateway,
};

use crate::events::EventBus;
use crate::handle::SessionHandle;
use crate::worker::{ChainServices, Command, SessionWorker};

/// Channel sizing for the runtime.
#[derive(Debug, Clone, Copy)]
pub struct SessionRuntimeConfig {
    pub command_buffer: usize,
    pub event_capacity: usize,
}

impl Default for SessionRuntimeConfig {
    fn default() -> Self {
        Self {
            command_buffer: 32,
            event_capacity: 100,
        }
    }
}

/// Errors building or shutting down the runtime.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("runtime requires {0} to be configured before building")]
    MissingCapability(&'static str),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

/// Owns the session worker and its channels.
pub struct SessionRuntime {
    handle: SessionHandle,
    worker_handle: JoinHandle<()>,
}

impl SessionRuntime {
    pub fn builder() -> SessionRuntimeBuilder {
        SessionRuntimeBuilder::new()
    }

    /// Cloneable handle for clients and async tasks.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Shuts down gracefully. The worker exits once every handle clone has
    /// been dropped.
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        drop(self.handle);
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder wiring capabilities, deployment addresses, and retry policies.
pub struct SessionRuntimeBuilder {
    config: SessionRuntimeConfig,
    submitter: Option<Arc<dyn ActionSubmitter>>,
    receipts: Option<Arc<dyn ReceiptSource>>,
    reader: Option<Arc<dyn StateReader>>,
    indexer: Option<Arc<dyn IndexerGateway>>,
    world: Option<ContractAddress>,
    game_systems: Option<ContractAddress>,
    finality_policy: FinalityPolicy,
    query_policy: QueryPolicy,
}

impl SessionRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: SessionRuntimeConfig::default(),
            submitter: None,
            receipts: None,
            reader: None,
            indexer: None,
            world: None,
            game_systems: None,
            finality_policy: FinalityPolicy::default(),
            query_policy: QueryPolicy::default(),
        }
    }

    pub fn config(mut self, config: SessionRuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn submitter(mut self, submitter: Arc<dyn ActionSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn receipts(mut self, receipts: Arc<dyn ReceiptSource>) -> Self {
        self.receipts = Some(receipts);
        self
    }

    pub fn reader(mut self, reader: Arc<dyn StateReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn indexer(mut self, indexer: Arc<dyn IndexerGateway>) -> Self {
        self.indexer = Some(indexer);
        self
    }

    /// Sets all four capabilities from a single backend (e.g. the mock
    /// chain in tests).
    pub fn chain<C>(mut self, chain: Arc<C>) -> Self
    where
        C: ActionSubmitter + ReceiptSource + StateReader + IndexerGateway + 'static,
    {
        self.submitter = Some(chain.clone());
        self.receipts = Some(chain.clone());
        self.reader = Some(chain.clone());
        self.indexer = Some(chain);
        self
    }

    /// World and game-systems contract addresses used to filter receipt
    /// events.
    pub fn addresses(mut self, world: ContractAddress, game_systems: ContractAddress) -> Self {
        self.world = Some(world);
        self.game_systems = Some(game_systems);
        self
    }

    pub fn finality_policy(mut self, policy: FinalityPolicy) -> Self {
        self.finality_policy = policy;
        self
    }

    pub fn query_policy(mut self, policy: QueryPolicy) -> Self {
        self.query_policy = policy;
        self
    }

    pub fn build(self) -> Result<SessionRuntime, RuntimeError> {
        let submitter = self
            .submitter
            .ok_or(RuntimeError::MissingCapability("an action submitter"))?;
        let receipts = self
            .receipts
            .ok_or(RuntimeError::MissingCapability("a receipt source"))?;
        let reader = self
            .reader
            .ok_or(RuntimeError::MissingCapability("a state reader"))?;
        let indexer = self
            .indexer
            .ok_or(RuntimeError::MissingCapability("an indexer gateway"))?;
        let world = self
            .world
            .ok_or(RuntimeError::MissingCapability("the world address"))?;
        let game_systems = self
            .game_systems
            .ok_or(RuntimeError::MissingCapability("the game-systems address"))?;

        let chain = ChainServices {
            gateway: TransactionGateway::new(submitter, receipts)
                .with_policy(self.finality_policy),
            reader,
            fetcher: StateFetcher::new(indexer).with_policy(self.query_policy),
            world,
            game_systems,
            layout: EventLayout::V1,
        };

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer);
        let bus = EventBus::with_capacity(self.config.event_capacity);

        let worker = SessionWorker::new(chain, bus.clone(), command_rx);
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(SessionRuntime {
            handle: SessionHandle::new(command_tx, bus),
            worker_handle,
        })
    }
}
