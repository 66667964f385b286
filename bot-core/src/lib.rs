//! # bot-core
//!
//! Core types and boundaries for state-driven chat bots: [`InboundEvent`], [`Message`], [`Command`],
//! the [`Network`], [`Scheduler`] and [`Resources`] traits, the error taxonomy and tracing initialization.
//! Transport-agnostic; used by bot-engine and by every concrete bot and adapter.

pub mod command;
pub mod error;
pub mod logger;
pub mod network;
pub mod resources;
pub mod scheduler;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use command::{Command, BUILTIN_COMMANDS, COMMAND_MARKER};
pub use error::{BotError, ConfigError, Result};
pub use logger::init_tracing;
pub use network::{event_queue, EventQueue, EventSender, Network};
pub use resources::{DefaultResources, Resources};
pub use scheduler::{Scheduler, TokioScheduler};
pub use types::{InboundEvent, Message, MessageKind, User};
