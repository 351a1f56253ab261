//! Blockchain abstraction layer for the SCARD client.
//!
//! This crate defines a layered chain abstraction:
//! - Layer 0: transport capabilities ([`ActionSubmitter`], [`ReceiptSource`])
//! - Layer 1: read paths ([`StateReader`] for direct contract calls,
//!   [`IndexerGateway`] for the eventually-consistent indexer)
//! - Layer 2: client-side orchestration over those capabilities
//!   ([`TransactionGateway`] for the write path, [`StateFetcher`] for
//!   lag-absorbing indexer reads, [`EventLayout`] for receipt decoding)
//!
//! Concrete network clients live in `chain-starknet`; [`MockChain`] provides
//! a scriptable in-memory backend for tests.
pub mod events;
pub mod fetcher;
pub mod gateway;
pub mod mock;
pub mod retry;
pub mod traits;
pub mod types;

pub use events::{EventLayout, ParsedGameEvents};
pub use fetcher::StateFetcher;
pub use gateway::{GatewayError, PendingTx, TransactionGateway};
pub use mock::{MockChain, ReceiptScript};
pub use retry::{FinalityPolicy, QueryPolicy};
pub use traits::{
    ActionSubmitter, IndexerGateway, QueryError, ReceiptSource, StateReader, TransportError,
};
pub use types::{
    ActionCall, BeastRecord, CompleteGameState, ContractAddress, CurrentEncounterRecord,
    DecodeError, EmittedEvent, ExecutionStatus, GameEventRow, PlayerRecord, ReceiptStatus, TxHash,
    TxReceipt,
};
