//! Topic-based event bus for state and notification fan-out.

use std::collections::HashMap;

use tokio::sync::broadcast;

use crate::notify::Notification;
use crate::store::GameSnapshot;

/// Topics for event routing.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Topic {
    /// Store snapshots after every mutation pass.
    State,
    /// User-facing notifications (gifts, combat results, stat changes).
    Notification,
}

/// Event wrapper carrying the topic payload.
#[derive(Debug, Clone)]
pub enum Event {
    State(GameSnapshot),
    Notification(Notification),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::State(_) => Topic::State,
            Event::Notification(_) => Topic::Notification,
        }
    }
}

/// Broadcast bus with one channel per topic, so consumers only receive the
/// events they care about.
#[derive(Clone)]
pub struct EventBus {
    channels: HashMap<Topic, broadcast::Sender<Event>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut channels = HashMap::new();
        channels.insert(Topic::State, broadcast::channel(capacity).0);
        channels.insert(Topic::Notification, broadcast::channel(capacity).0);
        Self { channels }
    }

    /// Publish an event to its topic. Best-effort: having no subscribers is
    /// normal, not an error.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            tracing::trace!(?topic, "no subscribers for topic");
        }
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels
            .get(&topic)
            .expect("topic channel not initialized")
            .subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Severity;

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::new();
        let mut notifications = bus.subscribe(Topic::Notification);

        bus.publish(Event::Notification(Notification::info("peaceful path")));

        let event = notifications.recv().await.unwrap();
        let Event::Notification(notification) = event else {
            panic!("expected a notification event");
        };
        assert_eq!(notification.severity, Severity::Info);
        assert!(notifications.try_recv().is_err());
    }
}
