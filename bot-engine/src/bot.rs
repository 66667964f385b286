//! Bot lifecycle and dispatch loop.
//!
//! [`Bot::run`] joins the network, announces itself, enters the initial state and then consumes
//! inbound events one at a time. Built-in `!help` / `!info` are answered first, other commands go to
//! the global table and then to the current state, plain messages go to the current state's message
//! handler. Transitions queued by handlers or background actions are applied between events.

use std::sync::Arc;

use bot_core::{
    BotError, Command, InboundEvent, Message, Network, Resources, Result, Scheduler,
};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

use crate::context::StateContext;
use crate::machine::{Signal, StateMachine, Transition};
use crate::state::ActionFn;

/// Linear lifecycle: `run` moves NotRunning → Running, a stop request moves Running → Stopping,
/// and the end of the run moves back to NotRunning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    NotRunning,
    Running,
    Stopping,
}

/// Everything shared between the bot handle, the dispatch loop, and the contexts given to hooks.
pub(crate) struct Runtime<C> {
    pub(crate) session: C,
    pub(crate) network: Arc<dyn Network>,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    pub(crate) resources: Arc<dyn Resources>,
    pub(crate) machine: StateMachine<C>,
    status: watch::Sender<Lifecycle>,
}

impl<C: Send + Sync + 'static> Runtime<C> {
    pub(crate) fn new(
        session: C,
        network: Arc<dyn Network>,
        scheduler: Arc<dyn Scheduler>,
        resources: Arc<dyn Resources>,
        machine: StateMachine<C>,
    ) -> Self {
        let (status, _) = watch::channel(Lifecycle::NotRunning);
        Self {
            session,
            network,
            scheduler,
            resources,
            machine,
            status,
        }
    }

    fn status(&self) -> Lifecycle {
        *self.status.borrow()
    }

    fn transition_status(&self, from: Lifecycle, to: Lifecycle) -> bool {
        self.status.send_if_modified(|status| {
            if *status == from {
                *status = to;
                true
            } else {
                false
            }
        })
    }

    /// Moves Running → Stopping and cancels the run. False when the bot was not running.
    pub(crate) fn request_stop(&self) -> bool {
        if !self.transition_status(Lifecycle::Running, Lifecycle::Stopping) {
            return false;
        }
        info!("Stop requested");
        self.machine.shutdown();
        true
    }

    /// Join, announce, enter the initial state, then dispatch until shutdown or failure.
    async fn serve(
        self: &Arc<Self>,
        signals: &mut mpsc::UnboundedReceiver<Signal>,
        shutdown: &CancellationToken,
    ) -> Result<()> {
        info!(network = %self.network.name(), "Connecting");
        self.network.join().await?;
        info!("Sending welcome message");
        self.network.send_message(&self.resources.started()).await?;

        self.machine.request_switch(self.machine.initial(), None)?;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Ok(()),
                Some(signal) = signals.recv() => match signal {
                    Signal::Switch(transition) => self.apply(transition).await?,
                    Signal::Failed { state, error } => {
                        error!(state = %state, error = %error, "Background action failed");
                        return Err(error);
                    }
                },
                event = self.network.next_event() => match event {
                    Some(event) => self.dispatch(event).await?,
                    None => {
                        info!("Inbound stream ended");
                        self.request_stop();
                        return Ok(());
                    }
                },
            }
        }
    }

    /// Runs the target's initializer, then activates it unless a newer transition superseded it.
    async fn apply(self: &Arc<Self>, transition: Transition) -> Result<()> {
        let state = self.machine.state(transition.target)?.clone();
        if !self.machine.is_current(transition.generation) {
            debug!(
                state = %state.name(),
                generation = transition.generation,
                "Transition superseded before initialization"
            );
            return Ok(());
        }

        info!(state = %state.name(), generation = transition.generation, "Switching state");
        if let Some(initializer) = &state.initializer {
            let ctx = StateContext::new(self.clone(), transition.generation, transition.scope.clone());
            let span = info_span!("initializer", state = %state.name(), generation = transition.generation);
            match initializer(ctx).instrument(span).await {
                Err(e) if !e.is_cancelled() => return Err(e),
                _ => {}
            }
        }

        let runtime = self.clone();
        let committed = self.machine.commit(&transition, |signals| {
            if let Some(action) = state.background.clone() {
                let ctx = StateContext::new(runtime, transition.generation, transition.scope.clone());
                let span = info_span!("background", state = %state.name(), generation = transition.generation);
                tokio::spawn(
                    run_background(action, ctx, state.name().to_string(), signals).instrument(span),
                );
            }
        });
        if committed {
            info!(state = %state.name(), generation = transition.generation, "State active");
        } else {
            debug!(
                state = %state.name(),
                generation = transition.generation,
                "Transition superseded during initialization"
            );
        }
        Ok(())
    }

    async fn dispatch(self: &Arc<Self>, event: InboundEvent) -> Result<()> {
        let message = match event {
            InboundEvent::UserJoined(user) => {
                info!(user_id = %user.id, user_name = %user.name, "User joined");
                return Ok(());
            }
            InboundEvent::UserLeft(user) => {
                info!(user_id = %user.id, user_name = %user.name, "User left");
                return Ok(());
            }
            event => match event.into_message() {
                Some(message) => message,
                None => return Ok(()),
            },
        };

        info!(
            user_id = %message.sender.id,
            kind = ?message.kind,
            text = %message.text,
            "Message received"
        );

        let result = match Command::parse(&message) {
            Some(command) => self.dispatch_command(command).await,
            None => self.dispatch_message(message).await,
        };
        match result {
            Err(e) if e.is_cancelled() => Ok(()),
            other => other,
        }
    }

    async fn dispatch_command(self: &Arc<Self>, command: Command) -> Result<()> {
        if command.is_builtin() {
            debug!(user_id = %command.sender.id, command = %command.action, "Answering built-in command");
            let text = match command.action.as_str() {
                "help" => self.resources.help(),
                _ => self.resources.info(),
            };
            return self
                .network
                .send_private_message(&command.sender, &text)
                .await;
        }

        let snapshot = self.machine.snapshot();
        let ctx = StateContext::new(self.clone(), snapshot.generation, snapshot.scope);

        if let Some(handler) = self.machine.global_command(&command.action) {
            info!(command = %command.action, "Executing global command");
            return handler(ctx, command).await;
        }

        match snapshot
            .state
            .as_ref()
            .and_then(|state| state.command(&command.action).map(|handler| (state, handler)))
        {
            Some((state, handler)) => {
                info!(command = %command.action, state = %state.name(), "Executing command");
                handler(ctx, command).await
            }
            None => {
                // No feedback on unknown commands.
                debug!(command = %command.action, "Ignoring unhandled command");
                Ok(())
            }
        }
    }

    async fn dispatch_message(self: &Arc<Self>, message: Message) -> Result<()> {
        let snapshot = self.machine.snapshot();
        let Some(handler) = snapshot
            .state
            .as_ref()
            .and_then(|state| state.message_handler.clone())
        else {
            return Ok(());
        };
        let ctx = StateContext::new(self.clone(), snapshot.generation, snapshot.scope);
        handler(ctx, message).await
    }

    /// Graceful end of a run: goodbye message, then leave. Both are attempted.
    async fn say_goodbye(&self) -> Result<()> {
        info!("Sending goodbye message");
        let announced = self.network.send_message(&self.resources.stopped()).await;
        info!("Disconnecting");
        let left = self.network.leave().await;
        announced.and(left)
    }
}

async fn run_background<C: Send + Sync + 'static>(
    action: ActionFn<C>,
    ctx: StateContext<C>,
    state: String,
    signals: mpsc::UnboundedSender<Signal>,
) {
    if ctx.is_cancelled() {
        debug!("Background action skipped: already superseded");
        return;
    }
    match action(ctx).await {
        Ok(()) => debug!("Background action finished"),
        Err(e) if e.is_cancelled() => debug!("Background action cancelled"),
        Err(error) => {
            let _ = signals.send(Signal::Failed { state, error });
        }
    }
}

/// Handle to a bot built with [`BotBuilder`](crate::BotBuilder). Cheap to clone; clones share the same bot.
pub struct Bot<C> {
    runtime: Arc<Runtime<C>>,
}

impl<C> Clone for Bot<C> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
        }
    }
}

impl<C: Send + Sync + 'static> Bot<C> {
    pub(crate) fn new(runtime: Runtime<C>) -> Self {
        Self {
            runtime: Arc::new(runtime),
        }
    }

    /// Runs the bot until it is stopped, the inbound stream ends, or a failure is not handled.
    ///
    /// Fails with [`BotError::AlreadyRunning`] unless the bot is NotRunning. On failure the network
    /// is left on a best-effort basis and the original error is returned.
    #[instrument(skip(self), fields(network = %self.runtime.network.name()))]
    pub async fn run(&self) -> Result<()> {
        let runtime = &self.runtime;
        if !runtime.transition_status(Lifecycle::NotRunning, Lifecycle::Running) {
            return Err(BotError::AlreadyRunning);
        }

        let shutdown = CancellationToken::new();
        let (signals_tx, mut signals) = mpsc::unbounded_channel();
        runtime.machine.start(shutdown.clone(), signals_tx);
        // A stop that raced with start() may have cancelled the previous token.
        if runtime.status() != Lifecycle::Running {
            shutdown.cancel();
        }

        let served = runtime.serve(&mut signals, &shutdown).await;
        runtime.machine.finish();

        let result = match served {
            Ok(()) => runtime.say_goodbye().await,
            Err(error) => {
                error!(error = %error, "Bot failed, disconnecting");
                if let Err(e) = runtime.network.leave().await {
                    warn!(error = %e, "Disconnecting after failure failed");
                }
                Err(error)
            }
        };

        runtime.status.send_replace(Lifecycle::NotRunning);
        info!("Bot stopped");
        result
    }

    /// Stops a running bot and waits until its dispatch loop has exited and the network was left.
    ///
    /// Fails with [`BotError::NotRunning`] unless the bot is Running. Must not be awaited from
    /// inside a hook (the loop would wait on itself); hooks use [`StateContext::request_stop`].
    pub async fn stop(&self) -> Result<()> {
        let mut status = self.runtime.status.subscribe();
        if !self.runtime.request_stop() {
            return Err(BotError::NotRunning);
        }
        if status
            .wait_for(|status| *status == Lifecycle::NotRunning)
            .await
            .is_err()
        {
            warn!("Status channel closed while stopping");
        }
        Ok(())
    }

    pub fn status(&self) -> Lifecycle {
        self.runtime.status()
    }

    pub fn session(&self) -> &C {
        &self.runtime.session
    }

    /// Name of the active state, if any.
    pub fn current_state(&self) -> Option<String> {
        let id = self.runtime.machine.current()?;
        self.runtime
            .machine
            .state(id)
            .ok()
            .map(|state| state.name().to_string())
    }

    /// Current transition generation.
    pub fn generation(&self) -> u64 {
        self.runtime.machine.generation()
    }
}
