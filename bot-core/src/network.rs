//! Network boundary: connection lifecycle, outbound sends and the ordered stream of inbound events.
//!
//! [`Network`] is transport-agnostic; adapters for a concrete chat platform implement it.
//! [`event_queue`] provides the single ordered queue most adapters feed their events into.

use crate::error::Result;
use crate::types::{InboundEvent, User};
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

/// Abstraction over a chat network. Implementations map to a transport (e.g. a chat platform or the console).
#[async_trait]
pub trait Network: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;
    /// Connects to the conversation.
    async fn join(&self) -> Result<()>;
    /// Disconnects from the conversation.
    async fn leave(&self) -> Result<()>;
    /// Sends a message to everyone in the conversation.
    async fn send_message(&self, text: &str) -> Result<()>;
    /// Sends a message to one user only.
    async fn send_private_message(&self, user: &User, text: &str) -> Result<()>;
    /// Waits for the next inbound event; `None` once the stream has ended.
    ///
    /// Must be cancel-safe: the dispatch loop drops this future whenever another signal wins the race,
    /// and no event may be lost when that happens.
    async fn next_event(&self) -> Option<InboundEvent>;
}

/// Creates a connected sender/queue pair. Events come out of the queue in the order they were sent.
pub fn event_queue() -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        EventSender { tx },
        EventQueue {
            rx: Mutex::new(rx),
        },
    )
}

/// Producer side of the event queue; cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<InboundEvent>,
}

impl EventSender {
    /// Enqueues an event. Returns false once the queue has been dropped.
    pub fn send(&self, event: InboundEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn user_joined(&self, user: User) -> bool {
        self.send(InboundEvent::UserJoined(user))
    }

    pub fn user_left(&self, user: User) -> bool {
        self.send(InboundEvent::UserLeft(user))
    }

    pub fn public_message(&self, sender: User, text: impl Into<String>) -> bool {
        self.send(InboundEvent::public(sender, text))
    }

    pub fn private_message(&self, sender: User, text: impl Into<String>) -> bool {
        self.send(InboundEvent::private(sender, text))
    }
}

/// Consumer side of the event queue.
#[derive(Debug)]
pub struct EventQueue {
    rx: Mutex<mpsc::UnboundedReceiver<InboundEvent>>,
}

impl EventQueue {
    /// Next event in arrival order; `None` when every sender is gone and the queue is drained. Cancel-safe.
    pub async fn next(&self) -> Option<InboundEvent> {
        self.rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_come_out_in_order() {
        let (sender, queue) = event_queue();
        let alice = User::new("1", "alice");
        assert!(sender.user_joined(alice.clone()));
        assert!(sender.public_message(alice.clone(), "one"));
        assert!(sender.private_message(alice.clone(), "two"));

        assert_eq!(queue.next().await, Some(InboundEvent::UserJoined(alice.clone())));
        let first = queue.next().await.unwrap().into_message().unwrap();
        assert_eq!(first.text, "one");
        let second = queue.next().await.unwrap().into_message().unwrap();
        assert_eq!(second.text, "two");
    }

    #[tokio::test]
    async fn test_queue_ends_when_senders_dropped() {
        let (sender, queue) = event_queue();
        sender.user_left(User::new("1", "alice"));
        drop(sender);
        assert!(queue.next().await.is_some());
        assert!(queue.next().await.is_none());
    }

    #[tokio::test]
    async fn test_send_fails_after_queue_dropped() {
        let (sender, queue) = event_queue();
        drop(queue);
        assert!(!sender.public_message(User::new("1", "alice"), "lost"));
    }
}
