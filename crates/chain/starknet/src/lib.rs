//! Starknet HTTP clients for the SCARD chain abstraction.
//!
//! Two concrete read-path implementations over plain HTTP:
//! - [`JsonRpcClient`] — direct contract view calls and transaction receipt
//!   polling via the node's JSON-RPC endpoint
//! - [`ToriiClient`] — entity and historical-event queries against the Torii
//!   indexer's SQL endpoint
//!
//! The write-path [`chain_core::ActionSubmitter`] is deliberately not
//! implemented here: submitting requires the wallet's signing session, which
//! the embedding application provides as a capability.
pub mod config;
pub mod rpc;
pub mod torii;

pub use config::{EntryPoints, StarknetConfig};
pub use rpc::JsonRpcClient;
pub use torii::ToriiClient;
