//! A [`Network`] on the terminal: one chat room whose users are typed in on stdin.
//!
//! Input lines look like `alice: hello` (public) or `alice> hello` (private to the bot).
//! `+alice` / `-alice` make a user join / leave. Everything the bot sends is written to the output.

use std::io::{BufRead, Write};
use std::sync::Mutex;
use std::thread;

use async_trait::async_trait;
use bot_core::{event_queue, BotError, EventQueue, EventSender, InboundEvent, Network, Result, User};
use tracing::{debug, info, warn};

pub struct ConsoleNetwork<W> {
    output: Mutex<W>,
    queue: EventQueue,
}

impl<W: Write + Send> ConsoleNetwork<W> {
    /// The network, and the sender that feeds it inbound events. The inbound stream ends once every
    /// clone of the sender is dropped.
    pub fn new(output: W) -> (Self, EventSender) {
        let (sender, queue) = event_queue();
        let network = Self {
            output: Mutex::new(output),
            queue,
        };
        (network, sender)
    }

    fn write_line(&self, line: &str) -> Result<()> {
        let mut output = self
            .output
            .lock()
            .map_err(|_| BotError::Network("console output poisoned".to_string()))?;
        writeln!(output, "{}", line)?;
        output.flush()?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> Network for ConsoleNetwork<W> {
    fn name(&self) -> &str {
        "console"
    }

    async fn join(&self) -> Result<()> {
        info!("Console ready");
        Ok(())
    }

    async fn leave(&self) -> Result<()> {
        info!("Console closed");
        Ok(())
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        for line in text.lines() {
            self.write_line(&format!("bot: {}", line))?;
        }
        Ok(())
    }

    async fn send_private_message(&self, user: &User, text: &str) -> Result<()> {
        for line in text.lines() {
            self.write_line(&format!("bot>{}: {}", user.name, line))?;
        }
        Ok(())
    }

    async fn next_event(&self) -> Option<InboundEvent> {
        self.queue.next().await
    }
}

/// Parses one input line. Users are identified by name.
pub fn parse_line(line: &str) -> Option<InboundEvent> {
    let line = line.trim();
    if let Some(name) = line.strip_prefix('+') {
        return user(name).map(InboundEvent::UserJoined);
    }
    if let Some(name) = line.strip_prefix('-') {
        return user(name).map(InboundEvent::UserLeft);
    }

    let split = line.find([':', '>'])?;
    let sender = user(&line[..split])?;
    let text = &line[split + 1..];
    if line[split..].starts_with(':') {
        Some(InboundEvent::public(sender, text))
    } else {
        Some(InboundEvent::private(sender, text))
    }
}

fn user(name: &str) -> Option<User> {
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some(User::new(name, name))
}

/// Forwards parsed lines from `input` until it ends, then drops `sender`. Blocks on reads.
pub fn forward_lines<R: BufRead>(input: R, sender: EventSender) -> std::io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Some(event) => {
                if !sender.send(event) {
                    debug!("Bot no longer listening, stopping input");
                    break;
                }
            }
            None => warn!(line = %line, "Ignoring input line (expected 'name: text' or 'name> text')"),
        }
    }
    debug!("Input ended");
    Ok(())
}

/// Feeds stdin into `sender` from a detached thread, so a pending read never holds up exit.
pub fn read_stdin(sender: EventSender) -> std::io::Result<()> {
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            if let Err(e) = forward_lines(std::io::stdin().lock(), sender) {
                warn!(error = %e, "Reading input failed");
            }
        })?;
    Ok(())
}
