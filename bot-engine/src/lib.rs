//! # bot-engine
//!
//! Runs a command-driven bot as a sequence of states. Exactly one state is active at a time;
//! switching states cancels the previous state's background work, and a transition superseded while
//! its initializer was running is never activated. Inbound events are handled one at a time in
//! arrival order by a single dispatch loop, which is also the only writer of the current state.
//!
//! Declare states with [`BotBuilder`], drive them from hooks through [`StateContext`], and run the
//! result with [`Bot::run`] / [`Bot::stop`].

mod bot;
mod builder;
mod context;
mod machine;
mod state;

pub use bot::{Bot, Lifecycle};
pub use builder::BotBuilder;
pub use context::StateContext;
pub use state::{State, StateBuilder, StateId};
