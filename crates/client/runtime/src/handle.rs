//! Cloneable façade for issuing commands to the session worker.
//!
//! Hides the channel plumbing and offers async helpers that resolve once
//! the corresponding flow has fully completed and the store has been
//! updated.

use tokio::sync::{broadcast, mpsc, oneshot};

use game_types::Direction;

use crate::error::{ActionError, Result};
use crate::events::{Event, EventBus, Topic};
use crate::store::GameSnapshot;
use crate::worker::Command;

/// Client-facing handle to the session runtime.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    bus: EventBus,
}

impl SessionHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, bus: EventBus) -> Self {
        Self { command_tx, bus }
    }

    /// Connects a wallet and initializes (or restores) its session.
    ///
    /// Resolves once bootstrap completes; reconnecting the same address
    /// after a successful bootstrap is a cheap no-op.
    pub async fn connect(&self, address: impl Into<String>) -> Result<GameSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Connect {
            address: address.into(),
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| ActionError::ChannelClosed)?
    }

    /// Clears all session state on wallet disconnect.
    pub async fn disconnect(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Disconnect { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| ActionError::ChannelClosed)
    }

    /// Submits a move and resolves with the post-move snapshot.
    pub async fn move_player(&self, direction: Direction) -> Result<GameSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::MovePlayer {
            direction,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| ActionError::ChannelClosed)?
    }

    /// Fights the active beast encounter.
    pub async fn fight(&self) -> Result<GameSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Fight { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| ActionError::ChannelClosed)?
    }

    /// Flees from the active beast encounter.
    pub async fn flee(&self) -> Result<GameSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Flee { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| ActionError::ChannelClosed)?
    }

    /// Dismisses a gift/FreeRoam encounter. Beast encounters must be
    /// fought or fled instead.
    pub async fn acknowledge_encounter(&self) -> Result<GameSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::AcknowledgeEncounter { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| ActionError::ChannelClosed)?
    }

    /// Reads the current store snapshot.
    pub async fn snapshot(&self) -> Result<GameSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Snapshot { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| ActionError::ChannelClosed)
    }

    /// Subscribes to a topic on the event bus.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.bus.subscribe(topic)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| ActionError::ChannelClosed)
    }
}
