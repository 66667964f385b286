//! Command classification: a message whose trimmed text starts with [`COMMAND_MARKER`].

use crate::types::{Message, MessageKind, User};

/// Leading character that turns a message into a command.
pub const COMMAND_MARKER: char = '!';

/// Built-in commands answered by the bot itself in every state.
pub const BUILTIN_COMMANDS: [&str; 2] = ["help", "info"];

/// An instruction parsed from a message, e.g. `!start fast 3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub sender: User,
    pub action: String,
    pub args: Vec<String>,
    pub is_public: bool,
}

impl Command {
    /// Parses `message` as a command; `None` when the text does not start with the marker.
    ///
    /// A bare marker yields an empty action, which no handler can match.
    pub fn parse(message: &Message) -> Option<Self> {
        let rest = message.text.trim_start().strip_prefix(COMMAND_MARKER)?;
        let mut tokens = rest.split_whitespace();
        // The action is the token glued to the marker; "! start" has an empty action.
        let action = if rest.starts_with(char::is_whitespace) {
            String::new()
        } else {
            tokens.next().unwrap_or_default().to_string()
        };
        Some(Self {
            sender: message.sender.clone(),
            action,
            args: tokens.map(str::to_string).collect(),
            is_public: message.kind == MessageKind::Public,
        })
    }

    pub fn is_builtin(&self) -> bool {
        BUILTIN_COMMANDS.contains(&self.action.as_str())
    }
}
