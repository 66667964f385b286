//! State descriptors: a name for diagnostics, optional hooks and a command table.
//!
//! States are declared on the [`BotBuilder`](crate::BotBuilder), which hands out a [`StateId`] per state so
//! hooks can refer to each other before every state is configured. Once the bot is built, states are
//! immutable; mutable data lives in the session object reachable through [`StateContext::session`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use bot_core::{Command, ConfigError, Message, Result, BUILTIN_COMMANDS};
use futures::future::{BoxFuture, FutureExt};

use crate::context::StateContext;

pub(crate) type ActionFn<C> =
    Arc<dyn Fn(StateContext<C>) -> BoxFuture<'static, Result<()>> + Send + Sync>;
pub(crate) type MessageFn<C> =
    Arc<dyn Fn(StateContext<C>, Message) -> BoxFuture<'static, Result<()>> + Send + Sync>;
pub(crate) type CommandFn<C> =
    Arc<dyn Fn(StateContext<C>, Command) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Handle to a state declared on a builder. States are always referenced through it, never by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub(crate) usize);

/// Command handlers keyed by action name, unique per table.
pub(crate) struct CommandTable<C> {
    scope: String,
    handlers: HashMap<String, CommandFn<C>>,
}

impl<C> CommandTable<C> {
    pub(crate) fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            handlers: HashMap::new(),
        }
    }

    pub(crate) fn insert(
        &mut self,
        name: &str,
        handler: CommandFn<C>,
    ) -> std::result::Result<(), ConfigError> {
        if BUILTIN_COMMANDS.contains(&name) {
            return Err(ConfigError::ReservedCommand(name.to_string()));
        }
        if self.handlers.contains_key(name) {
            return Err(ConfigError::DuplicateCommand {
                scope: self.scope.clone(),
                command: name.to_string(),
            });
        }
        self.handlers.insert(name.to_string(), handler);
        Ok(())
    }

    pub(crate) fn get(&self, action: &str) -> Option<&CommandFn<C>> {
        self.handlers.get(action)
    }
}

/// A named bundle of behavior active for a span of the conversation.
pub struct State<C> {
    name: String,
    pub(crate) initializer: Option<ActionFn<C>>,
    pub(crate) background: Option<ActionFn<C>>,
    pub(crate) message_handler: Option<MessageFn<C>>,
    pub(crate) commands: CommandTable<C>,
}

impl<C> State<C> {
    pub(crate) fn new(name: String) -> Self {
        Self {
            commands: CommandTable::new(format!("state {}", name)),
            name,
            initializer: None,
            background: None,
            message_handler: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn command(&self, action: &str) -> Option<&CommandFn<C>> {
        self.commands.get(action)
    }
}

impl<C> std::fmt::Debug for State<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("initializer", &self.initializer.is_some())
            .field("background", &self.background.is_some())
            .field("message_handler", &self.message_handler.is_some())
            .finish()
    }
}

pub(crate) fn action_fn<C, F, Fut>(f: F) -> ActionFn<C>
where
    F: Fn(StateContext<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

pub(crate) fn command_fn<C, F, Fut>(f: F) -> CommandFn<C>
where
    F: Fn(StateContext<C>, Command) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |ctx, command| f(ctx, command).boxed())
}

fn message_fn<C, F, Fut>(f: F) -> MessageFn<C>
where
    F: Fn(StateContext<C>, Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |ctx, message| f(ctx, message).boxed())
}

/// Configures one declared state. Configuration errors are collected and reported by `build()`.
pub struct StateBuilder<'a, C> {
    state: Option<&'a mut State<C>>,
    errors: &'a mut Vec<ConfigError>,
}

impl<'a, C: Send + Sync + 'static> StateBuilder<'a, C> {
    pub(crate) fn new(state: Option<&'a mut State<C>>, errors: &'a mut Vec<ConfigError>) -> Self {
        Self { state, errors }
    }

    fn set_hook<T>(
        slot: &mut Option<T>,
        value: T,
        state: &str,
        hook: &'static str,
        errors: &mut Vec<ConfigError>,
    ) {
        if slot.is_some() {
            errors.push(ConfigError::DuplicateHook {
                state: state.to_string(),
                hook,
            });
            return;
        }
        *slot = Some(value);
    }

    /// Run-once setup executed on entry, before the state becomes current.
    /// It may request another switch or a stop, in which case this state is never activated.
    pub fn initializer<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(StateContext<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if let Some(state) = self.state.as_deref_mut() {
            Self::set_hook(
                &mut state.initializer,
                action_fn(f),
                &state.name,
                "initializer",
                self.errors,
            );
        }
        self
    }

    /// Long-running work started once the state is current. It must check for cancellation after
    /// every wait; [`StateContext::delay`] does this and returns [`BotError::Cancelled`](bot_core::BotError::Cancelled).
    pub fn background_action<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(StateContext<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if let Some(state) = self.state.as_deref_mut() {
            Self::set_hook(
                &mut state.background,
                action_fn(f),
                &state.name,
                "background action",
                self.errors,
            );
        }
        self
    }

    /// Receives every non-command message while the state is current.
    pub fn message_handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(StateContext<C>, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if let Some(state) = self.state.as_deref_mut() {
            Self::set_hook(
                &mut state.message_handler,
                message_fn(f),
                &state.name,
                "message handler",
                self.errors,
            );
        }
        self
    }

    /// Handles `!name` while the state is current, unless a global handler with that name exists.
    pub fn command<F, Fut>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(StateContext<C>, Command) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if let Some(state) = self.state.as_deref_mut() {
            if let Err(e) = state.commands.insert(name, command_fn(f)) {
                self.errors.push(e);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_command<C: Send + Sync + 'static>() -> CommandFn<C> {
        command_fn(|_ctx: StateContext<C>, _command| async { Ok(()) })
    }

    #[test]
    fn test_command_table_rejects_duplicates() {
        let mut table: CommandTable<()> = CommandTable::new("global commands");
        table.insert("scores", noop_command()).unwrap();
        let err = table.insert("scores", noop_command()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateCommand {
                scope: "global commands".to_string(),
                command: "scores".to_string(),
            }
        );
        assert!(table.get("scores").is_some());
        assert!(table.get("start").is_none());
    }

    #[test]
    fn test_command_table_rejects_builtins() {
        let mut table: CommandTable<()> = CommandTable::new("state Waiting");
        assert_eq!(
            table.insert("help", noop_command()).unwrap_err(),
            ConfigError::ReservedCommand("help".to_string())
        );
        assert_eq!(
            table.insert("info", noop_command()).unwrap_err(),
            ConfigError::ReservedCommand("info".to_string())
        );
    }

    #[test]
    fn test_state_builder_collects_duplicate_hooks() {
        let mut state: State<()> = State::new("Question".to_string());
        let mut errors = Vec::new();
        StateBuilder::new(Some(&mut state), &mut errors)
            .initializer(|_ctx| async { Ok(()) })
            .initializer(|_ctx| async { Ok(()) })
            .command("stop", |_ctx, _command| async { Ok(()) });

        assert_eq!(
            errors,
            vec![ConfigError::DuplicateHook {
                state: "Question".to_string(),
                hook: "initializer",
            }]
        );
        assert!(state.initializer.is_some());
        assert!(state.background.is_none());
        assert!(state.command("stop").is_some());
        assert_eq!(state.name(), "Question");
    }
}
