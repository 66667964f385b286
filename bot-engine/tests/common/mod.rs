//! Shared fixtures for bot-engine integration tests.
//!
//! Tests run on a paused tokio clock: [`settle`] only returns once every other task is idle, which
//! makes "the bot has processed everything sent so far" a deterministic sync point.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bot_core::testing::{FakeNetwork, ManualScheduler};
use bot_core::Result;
use bot_engine::{Bot, BotBuilder};
use tokio::task::JoinHandle;

/// Session recording which hooks ran, in order.
#[derive(Default)]
pub struct Recorder {
    entries: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

pub struct Harness {
    pub network: Arc<FakeNetwork>,
    pub scheduler: Arc<ManualScheduler>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            network: Arc::new(FakeNetwork::new()),
            scheduler: Arc::new(ManualScheduler::new()),
        }
    }

    pub fn builder(&self) -> BotBuilder<Recorder> {
        let mut builder = BotBuilder::new(self.network.clone(), Recorder::default());
        builder.scheduler(self.scheduler.clone());
        builder
    }
}

/// Waits until every other task is idle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// Runs the bot on its own task and lets it reach the dispatch loop.
pub async fn start<C: Send + Sync + 'static>(bot: &Bot<C>) -> JoinHandle<Result<()>> {
    let runner = {
        let bot = bot.clone();
        tokio::spawn(async move { bot.run().await })
    };
    settle().await;
    runner
}

/// Stops the bot and returns what `run` returned.
pub async fn stop<C: Send + Sync + 'static>(bot: &Bot<C>, runner: JoinHandle<Result<()>>) -> Result<()> {
    bot.stop().await.unwrap();
    runner.await.unwrap()
}
