//! Generation-stamped state machine.
//!
//! The generation counter, the cancellation scope of that generation and the current state are
//! stored together under one lock that is never held across an await. A switch request cancels the
//! current scope and bumps the generation immediately, then queues a [`Transition`] for the dispatch
//! loop, which is the only place initializers run and the only writer of the current state. An
//! initializer that requests another switch therefore supersedes its own transition, and
//! [`StateMachine::commit`] refuses to activate it.

use std::sync::{Arc, Mutex, MutexGuard};

use bot_core::{BotError, ConfigError, Result};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::state::{CommandFn, CommandTable, State, StateId};

/// A switch accepted by [`StateMachine::request_switch`], waiting for the dispatch loop.
#[derive(Debug)]
pub(crate) struct Transition {
    pub(crate) target: StateId,
    pub(crate) generation: u64,
    pub(crate) scope: CancellationToken,
}

/// Work for the dispatch loop that does not come from the network.
#[derive(Debug)]
pub(crate) enum Signal {
    Switch(Transition),
    /// A background action failed; the run must end with this error.
    Failed { state: String, error: BotError },
}

struct Epoch {
    generation: u64,
    scope: CancellationToken,
    shutdown: CancellationToken,
    current: Option<StateId>,
    signals: Option<UnboundedSender<Signal>>,
}

impl Epoch {
    fn is_active(&self) -> bool {
        self.signals.is_some() && !self.shutdown.is_cancelled()
    }
}

/// What a handler dispatched right now runs against.
pub(crate) struct Snapshot<C> {
    pub(crate) state: Option<Arc<State<C>>>,
    pub(crate) generation: u64,
    pub(crate) scope: CancellationToken,
}

pub(crate) struct StateMachine<C> {
    states: Vec<Arc<State<C>>>,
    global: CommandTable<C>,
    initial: StateId,
    epoch: Mutex<Epoch>,
}

impl<C> StateMachine<C> {
    pub(crate) fn new(states: Vec<State<C>>, global: CommandTable<C>, initial: StateId) -> Self {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        Self {
            states: states.into_iter().map(Arc::new).collect(),
            global,
            initial,
            epoch: Mutex::new(Epoch {
                generation: 0,
                scope: shutdown.child_token(),
                shutdown,
                current: None,
                signals: None,
            }),
        }
    }

    fn epoch(&self) -> MutexGuard<'_, Epoch> {
        self.epoch.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn initial(&self) -> StateId {
        self.initial
    }

    pub(crate) fn state(&self, id: StateId) -> Result<&Arc<State<C>>> {
        self.states
            .get(id.0)
            .ok_or_else(|| ConfigError::UnknownState(id.0).into())
    }

    pub(crate) fn generation(&self) -> u64 {
        self.epoch().generation
    }

    pub(crate) fn current(&self) -> Option<StateId> {
        self.epoch().current
    }

    /// Opens a run: transitions are accepted until `shutdown` is cancelled.
    ///
    /// The generation advances so contexts left over from a previous run are already superseded.
    pub(crate) fn start(&self, shutdown: CancellationToken, signals: UnboundedSender<Signal>) {
        let mut epoch = self.epoch();
        epoch.scope.cancel();
        epoch.scope = shutdown.child_token();
        epoch.generation += 1;
        epoch.shutdown = shutdown;
        epoch.current = None;
        epoch.signals = Some(signals);
    }

    /// Cancels the run's shutdown token, and with it the current scope.
    pub(crate) fn shutdown(&self) {
        self.epoch().shutdown.cancel();
    }

    /// Closes the run: nothing is current any more and later requests are absorbed.
    pub(crate) fn finish(&self) {
        let mut epoch = self.epoch();
        epoch.shutdown.cancel();
        epoch.current = None;
        epoch.signals = None;
    }

    /// Accepts a switch to `target`: cancels the current scope, opens a new one, bumps the
    /// generation and queues the transition.
    ///
    /// `requester` is the generation of the context asking; a request from a superseded
    /// generation is dropped, so each generation gets at most one accepted switch.
    /// Requests while not running are absorbed.
    pub(crate) fn request_switch(&self, target: StateId, requester: Option<u64>) -> Result<()> {
        let name = self.state(target)?.name();
        let mut epoch = self.epoch();
        if !epoch.is_active() {
            debug!(state = %name, "Switch ignored: not running");
            return Ok(());
        }
        if let Some(requester) = requester {
            if requester != epoch.generation {
                debug!(
                    state = %name,
                    requester,
                    generation = epoch.generation,
                    "Switch ignored: requested from a superseded generation"
                );
                return Ok(());
            }
        }

        epoch.scope.cancel();
        epoch.scope = epoch.shutdown.child_token();
        epoch.generation += 1;
        info!(state = %name, generation = epoch.generation, "Switch requested");

        let transition = Transition {
            target,
            generation: epoch.generation,
            scope: epoch.scope.clone(),
        };
        if let Some(signals) = &epoch.signals {
            let _ = signals.send(Signal::Switch(transition));
        }
        Ok(())
    }

    /// True while the run is active and `generation` has not been superseded.
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        let epoch = self.epoch();
        epoch.is_active() && epoch.generation == generation
    }

    /// Makes the transition's target current if its generation is still the latest, and calls
    /// `activate` under the same lock so no newer transition can slip in between.
    pub(crate) fn commit(
        &self,
        transition: &Transition,
        activate: impl FnOnce(UnboundedSender<Signal>),
    ) -> bool {
        let mut epoch = self.epoch();
        if !epoch.is_active() || epoch.generation != transition.generation {
            return false;
        }
        epoch.current = Some(transition.target);
        if let Some(signals) = &epoch.signals {
            activate(signals.clone());
        }
        true
    }

    pub(crate) fn snapshot(&self) -> Snapshot<C> {
        let epoch = self.epoch();
        Snapshot {
            state: epoch.current.and_then(|id| self.states.get(id.0).cloned()),
            generation: epoch.generation,
            scope: epoch.scope.clone(),
        }
    }

    pub(crate) fn global_command(&self, action: &str) -> Option<&CommandFn<C>> {
        self.global.get(action)
    }
}
