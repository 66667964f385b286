use std::future::Future;
use std::sync::Arc;

use bot_core::{
    BotError, Command, ConfigError, DefaultResources, Network, Resources, Result, Scheduler,
    TokioScheduler,
};

use crate::bot::{Bot, Runtime};
use crate::context::StateContext;
use crate::machine::StateMachine;
use crate::state::{command_fn, CommandTable, State, StateBuilder, StateId};

/// Declares the states, global commands and collaborators of a bot.
///
/// ```ignore
/// let mut builder = BotBuilder::new(network, Session::default());
/// let waiting = builder.add_state("Waiting");
/// let playing = builder.add_state("Playing");
/// builder
///     .state(waiting)
///     .command("start", move |ctx, _command| async move { ctx.request_switch(playing) });
/// builder.initial_state(waiting);
/// let bot = builder.build()?;
/// ```
pub struct BotBuilder<C> {
    network: Arc<dyn Network>,
    session: C,
    scheduler: Arc<dyn Scheduler>,
    resources: Arc<dyn Resources>,
    states: Vec<State<C>>,
    global: CommandTable<C>,
    initial: Option<StateId>,
    errors: Vec<ConfigError>,
}

impl<C: Send + Sync + 'static> BotBuilder<C> {
    /// Starts a bot on `network` with the given session object. Defaults: tokio timer scheduler,
    /// default resources.
    pub fn new(network: Arc<dyn Network>, session: C) -> Self {
        Self {
            network,
            session,
            scheduler: Arc::new(TokioScheduler),
            resources: Arc::new(DefaultResources),
            states: Vec::new(),
            global: CommandTable::new("global commands"),
            initial: None,
            errors: Vec::new(),
        }
    }

    pub fn scheduler(&mut self, scheduler: Arc<dyn Scheduler>) -> &mut Self {
        self.scheduler = scheduler;
        self
    }

    pub fn resources(&mut self, resources: Arc<dyn Resources>) -> &mut Self {
        self.resources = resources;
        self
    }

    /// Declares a state; the name is only used for diagnostics.
    pub fn add_state(&mut self, name: impl Into<String>) -> StateId {
        self.states.push(State::new(name.into()));
        StateId(self.states.len() - 1)
    }

    /// Configures a declared state.
    pub fn state(&mut self, id: StateId) -> StateBuilder<'_, C> {
        let state = self.states.get_mut(id.0);
        if state.is_none() {
            self.errors.push(ConfigError::UnknownState(id.0));
        }
        StateBuilder::new(state, &mut self.errors)
    }

    pub fn initial_state(&mut self, id: StateId) -> &mut Self {
        if id.0 >= self.states.len() {
            self.errors.push(ConfigError::UnknownState(id.0));
        } else if self.initial.is_some() {
            self.errors.push(ConfigError::InitialStateAlreadySet);
        } else {
            self.initial = Some(id);
        }
        self
    }

    /// Registers a command handler that works in every state and wins over state-local handlers.
    pub fn global_command<F, Fut>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(StateContext<C>, Command) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if let Err(e) = self.global.insert(name, command_fn(handler)) {
            self.errors.push(e);
        }
        self
    }

    /// Builds the bot, failing with the first configuration error.
    pub fn build(self) -> Result<Bot<C>> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(BotError::Config(error));
        }
        let initial = self.initial.ok_or(ConfigError::MissingInitialState)?;
        let machine = StateMachine::new(self.states, self.global, initial);
        Ok(Bot::new(Runtime::new(
            self.session,
            self.network,
            self.scheduler,
            self.resources,
            machine,
        )))
    }
}
