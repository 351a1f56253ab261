//! Session runtime for the SCARD client.
//!
//! This crate wires the chain capabilities into the game-state
//! synchronization layer: a worker task owns the [`GameStateStore`] and
//! serializes every mutation, while network flows (bootstrap, moves,
//! fight/flee, background enrichment) run concurrently and re-enter the
//! worker through epoch-guarded completions. Consumers hold a
//! [`SessionHandle`] to drive actions and subscribe to state snapshots and
//! notifications.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`handle`] exposes the client-facing command façade
//! - [`store`] is the single source of truth for observed game state
//! - [`worker`] keeps the session actor internal to the crate
//! - [`events`] provides the topic-based bus
//! - [`notify`] synthesizes user-facing notifications
pub mod error;
pub mod events;
pub mod handle;
pub mod notify;
pub mod runtime;
pub mod store;

mod worker;

pub use error::{ActionError, Result};
pub use events::{Event, EventBus, Topic};
pub use handle::SessionHandle;
pub use notify::{CombatResult, Notification, Severity};
pub use runtime::{RuntimeError, SessionRuntime, SessionRuntimeBuilder, SessionRuntimeConfig};
pub use store::{BootstrapState, GameSnapshot, GameStateStore, RestoredState};
pub use worker::ChainServices;
