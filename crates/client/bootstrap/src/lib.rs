//! Assembly of a ready-to-use session runtime from environment
//! configuration.
//!
//! The embedding application supplies the wallet capability (an
//! [`chain_core::ActionSubmitter`]); everything else - HTTP clients, retry
//! policies, channel sizing - is wired here from [`ClientConfig`].
pub mod builder;
pub mod config;
pub mod logging;

pub use builder::{SessionBuilder, SessionSetup};
pub use config::ClientConfig;
pub use logging::init_tracing;
