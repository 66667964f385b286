//! Core types: user identity, message kinds, inbound events and messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identity. `id` is stable; `name` may change between messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Whether a message was sent to everyone or only to the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Public,
    Private,
}

/// One unit of input from the network, consumed once by the dispatch loop in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundEvent {
    UserJoined(User),
    UserLeft(User),
    PublicMessage {
        sender: User,
        text: String,
        received_at: DateTime<Utc>,
    },
    PrivateMessage {
        sender: User,
        text: String,
        received_at: DateTime<Utc>,
    },
}

impl InboundEvent {
    pub fn public(sender: User, text: impl Into<String>) -> Self {
        InboundEvent::PublicMessage {
            sender,
            text: text.into(),
            received_at: Utc::now(),
        }
    }

    pub fn private(sender: User, text: impl Into<String>) -> Self {
        InboundEvent::PrivateMessage {
            sender,
            text: text.into(),
            received_at: Utc::now(),
        }
    }

    /// Converts message events into a [`Message`] with trimmed text; join/leave events yield `None`.
    pub fn into_message(self) -> Option<Message> {
        let (sender, text, received_at, kind) = match self {
            InboundEvent::PublicMessage {
                sender,
                text,
                received_at,
            } => (sender, text, received_at, MessageKind::Public),
            InboundEvent::PrivateMessage {
                sender,
                text,
                received_at,
            } => (sender, text, received_at, MessageKind::Private),
            InboundEvent::UserJoined(_) | InboundEvent::UserLeft(_) => return None,
        };
        Some(Message {
            sender,
            text: text.trim().to_string(),
            kind,
            received_at,
        })
    }
}

/// A public or private message forwarded to the active state's message handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: User,
    pub text: String,
    pub kind: MessageKind,
    pub received_at: DateTime<Utc>,
}

impl Message {
    pub fn is_public(&self) -> bool {
        self.kind == MessageKind::Public
    }
}
