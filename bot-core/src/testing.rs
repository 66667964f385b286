//! In-memory [`Network`] and [`Scheduler`] for tests of bots built on the engine.
//!
//! [`FakeNetwork`] records every outbound message and lets the test inject inbound events;
//! [`ManualScheduler`] never resolves a delay by itself: the test resolves delays by id with
//! [`ManualScheduler::advance`].

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::{BotError, Result};
use crate::network::{event_queue, EventQueue, EventSender, Network};
use crate::scheduler::Scheduler;
use crate::types::{InboundEvent, User};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// A message the bot sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Public(String),
    Private { to: String, text: String },
}

impl std::fmt::Display for Outbound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outbound::Public(text) => write!(f, "bot: {}", text),
            Outbound::Private { to, text } => write!(f, "bot>{}: {}", to, text),
        }
    }
}

/// Network that records sends and replays injected events. Users are identified by name (id = name).
pub struct FakeNetwork {
    sender: Mutex<Option<EventSender>>,
    queue: EventQueue,
    outbound: Mutex<Vec<Outbound>>,
    joins: AtomicUsize,
    leaves: AtomicUsize,
    fail_join: AtomicBool,
    fail_sends: AtomicBool,
}

impl Default for FakeNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeNetwork {
    pub fn new() -> Self {
        let (sender, queue) = event_queue();
        Self {
            sender: Mutex::new(Some(sender)),
            queue,
            outbound: Mutex::new(Vec::new()),
            joins: AtomicUsize::new(0),
            leaves: AtomicUsize::new(0),
            fail_join: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
        }
    }

    pub fn user(name: &str) -> User {
        User::new(name, name)
    }

    fn push(&self, event: InboundEvent) {
        if let Some(sender) = lock(&self.sender).as_ref() {
            sender.send(event);
        }
    }

    /// `name` says `text` publicly.
    pub fn say(&self, name: &str, text: &str) {
        self.push(InboundEvent::public(Self::user(name), text));
    }

    /// `name` sends `text` to the bot privately.
    pub fn whisper(&self, name: &str, text: &str) {
        self.push(InboundEvent::private(Self::user(name), text));
    }

    pub fn join_user(&self, name: &str) {
        self.push(InboundEvent::UserJoined(Self::user(name)));
    }

    pub fn leave_user(&self, name: &str) {
        self.push(InboundEvent::UserLeft(Self::user(name)));
    }

    /// Ends the inbound stream once the already queued events are consumed.
    pub fn close(&self) {
        lock(&self.sender).take();
    }

    /// Makes `join` fail from now on.
    pub fn fail_join(&self, fail: bool) {
        self.fail_join.store(fail, Ordering::SeqCst);
    }

    /// Makes every send fail from now on.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn outbound(&self) -> Vec<Outbound> {
        lock(&self.outbound).clone()
    }

    /// Texts of the public messages, in send order.
    pub fn public_messages(&self) -> Vec<String> {
        lock(&self.outbound)
            .iter()
            .filter_map(|m| match m {
                Outbound::Public(text) => Some(text.clone()),
                Outbound::Private { .. } => None,
            })
            .collect()
    }

    /// One line per outbound message, e.g. `bot: Hello!` or `bot>alice: help`.
    pub fn transcript(&self) -> Vec<String> {
        lock(&self.outbound).iter().map(|m| m.to_string()).collect()
    }

    pub fn joins(&self) -> usize {
        self.joins.load(Ordering::SeqCst)
    }

    pub fn leaves(&self) -> usize {
        self.leaves.load(Ordering::SeqCst)
    }

    fn check_send(&self) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BotError::Network("send failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Network for FakeNetwork {
    fn name(&self) -> &str {
        "FakeNetwork"
    }

    async fn join(&self) -> Result<()> {
        if self.fail_join.load(Ordering::SeqCst) {
            return Err(BotError::Network("join failed".to_string()));
        }
        self.joins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn leave(&self) -> Result<()> {
        self.leaves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        self.check_send()?;
        lock(&self.outbound).push(Outbound::Public(text.to_string()));
        Ok(())
    }

    async fn send_private_message(&self, user: &User, text: &str) -> Result<()> {
        self.check_send()?;
        lock(&self.outbound).push(Outbound::Private {
            to: user.name.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn next_event(&self) -> Option<InboundEvent> {
        self.queue.next().await
    }
}

/// Scheduler whose delays resolve only when the test calls [`ManualScheduler::advance`].
#[derive(Default)]
pub struct ManualScheduler {
    pending: Mutex<HashMap<String, VecDeque<oneshot::Sender<()>>>>,
    requested: Mutex<Vec<(String, Duration)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the oldest delay with this id that is still awaited. Returns false if there is none,
    /// e.g. because its awaiting action was cancelled.
    pub fn advance(&self, id: &str) -> bool {
        let mut pending = lock(&self.pending);
        let Some(waiters) = pending.get_mut(id) else {
            return false;
        };
        while let Some(waiter) = waiters.pop_front() {
            if waiter.send(()).is_ok() {
                return true;
            }
        }
        false
    }

    /// Number of delays with this id that are still awaited.
    pub fn pending(&self, id: &str) -> usize {
        lock(&self.pending)
            .get(id)
            .map(|waiters| waiters.iter().filter(|w| !w.is_closed()).count())
            .unwrap_or(0)
    }

    /// Every delay requested so far, in request order.
    pub fn requested(&self) -> Vec<(String, Duration)> {
        lock(&self.requested).clone()
    }
}

#[async_trait]
impl Scheduler for ManualScheduler {
    async fn delay(&self, id: &str, duration: Duration) {
        let (tx, rx) = oneshot::channel();
        lock(&self.pending)
            .entry(id.to_string())
            .or_default()
            .push_back(tx);
        lock(&self.requested).push((id.to_string(), duration));
        let _ = rx.await;
    }
}
