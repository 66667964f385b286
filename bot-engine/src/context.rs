//! The callback surface handed to every hook: session access, sends, cancellable delays and
//! transition requests. A context is bound to the generation it was created for.

use std::sync::Arc;
use std::time::Duration;

use bot_core::{BotError, Result, User};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::bot::Runtime;
use crate::state::StateId;

pub struct StateContext<C> {
    runtime: Arc<Runtime<C>>,
    generation: u64,
    scope: CancellationToken,
}

impl<C> Clone for StateContext<C> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            generation: self.generation,
            scope: self.scope.clone(),
        }
    }
}

impl<C: Send + Sync + 'static> StateContext<C> {
    pub(crate) fn new(runtime: Arc<Runtime<C>>, generation: u64, scope: CancellationToken) -> Self {
        Self {
            runtime,
            generation,
            scope,
        }
    }

    /// The session object shared by every hook of the bot.
    pub fn session(&self) -> &C {
        &self.runtime.session
    }

    /// Generation this context belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once a newer transition (or a stop) superseded this context's generation.
    pub fn is_cancelled(&self) -> bool {
        self.scope.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.scope
    }

    pub async fn send_message(&self, text: &str) -> Result<()> {
        self.runtime.network.send_message(text).await
    }

    pub async fn send_private_message(&self, user: &User, text: &str) -> Result<()> {
        self.runtime.network.send_private_message(user, text).await
    }

    /// Waits on the scheduler under this context's scope.
    ///
    /// Returns [`BotError::Cancelled`] as soon as the scope is cancelled, and also when the scope was
    /// cancelled by the time the scheduler resolved, so callers can use `?` and stop making side effects.
    pub async fn delay(&self, id: &str, duration: Duration) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.scope.cancelled() => {
                debug!(delay_id = %id, generation = self.generation, "Delay cancelled");
                Err(BotError::Cancelled)
            }
            _ = self.runtime.scheduler.delay(id, duration) => {
                if self.scope.is_cancelled() {
                    Err(BotError::Cancelled)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Requests a switch to `target`. The current scope is cancelled right away; the target's
    /// initializer runs on the dispatch loop before the next inbound event.
    ///
    /// Silently ignored once the bot is stopping, or when this context's generation was already
    /// superseded. Fails only for a handle that does not belong to this bot.
    pub fn request_switch(&self, target: StateId) -> Result<()> {
        self.runtime
            .machine
            .request_switch(target, Some(self.generation))
    }

    /// Requests a stop without waiting for it; the dispatch loop shuts down once the current
    /// handler returns. Ignored when the bot is not running.
    pub fn request_stop(&self) {
        if !self.runtime.request_stop() {
            debug!(generation = self.generation, "Stop request ignored: not running");
        }
    }
}
