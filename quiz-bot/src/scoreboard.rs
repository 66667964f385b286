use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bot_core::{BotError, Result, User};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Player scores, keyed by user id.
#[async_trait]
pub trait Scoreboard: Send + Sync {
    /// Adds `increment` to the user's score and returns the new score.
    async fn increase_score(&self, user: &User, increment: i64) -> Result<i64>;

    /// Scores by user name, using the latest name seen for each user.
    async fn scores_by_name(&self) -> Result<HashMap<String, i64>>;
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    name: String,
    score: i64,
}

type Entries = HashMap<String, Entry>;

fn add_score(entries: &mut Entries, user: &User, increment: i64) -> i64 {
    let entry = entries.entry(user.id.clone()).or_default();
    entry.name = user.name.clone();
    entry.score += increment;
    entry.score
}

fn by_name(entries: &Entries) -> HashMap<String, i64> {
    entries
        .values()
        .map(|entry| (entry.name.clone(), entry.score))
        .collect()
}

/// Scoreboard kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryScoreboard {
    entries: Mutex<Entries>,
}

impl InMemoryScoreboard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Scoreboard for InMemoryScoreboard {
    async fn increase_score(&self, user: &User, increment: i64) -> Result<i64> {
        let mut entries = self.entries.lock().await;
        Ok(add_score(&mut entries, user, increment))
    }

    async fn scores_by_name(&self) -> Result<HashMap<String, i64>> {
        Ok(by_name(&*self.entries.lock().await))
    }
}

/// Scoreboard saved to a JSON file after every change, so scores survive restarts.
///
/// The file maps user ids to `{"name": ..., "score": ...}`.
#[derive(Debug)]
pub struct FileScoreboard {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileScoreboard {
    /// Loads the scores saved at `path`. A missing or empty file is an empty scoreboard.
    pub async fn open(path: impl Into<PathBuf>) -> crate::error::Result<Self> {
        let path = path.into();
        let entries: Entries = match tokio::fs::read_to_string(&path).await {
            Ok(json) if json.trim().is_empty() => Entries::new(),
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Entries::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), players = entries.len(), "Loaded scores");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn save(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| BotError::Scoreboard(e.to_string()))?;
        tokio::fs::write(&self.path, json).await?;
        debug!(path = %self.path.display(), "Saved scores");
        Ok(())
    }
}

#[async_trait]
impl Scoreboard for FileScoreboard {
    async fn increase_score(&self, user: &User, increment: i64) -> Result<i64> {
        let mut entries = self.entries.lock().await;
        let score = add_score(&mut entries, user, increment);
        self.save(&entries).await?;
        Ok(score)
    }

    async fn scores_by_name(&self) -> Result<HashMap<String, i64>> {
        Ok(by_name(&*self.entries.lock().await))
    }
}

/// Highest scores first, ties by name; at most `limit` entries.
pub fn ranking(scores: HashMap<String, i64>, limit: usize) -> Vec<(String, i64)> {
    let mut ranking: Vec<_> = scores.into_iter().collect();
    ranking.sort_by(|(a_name, a_score), (b_name, b_score)| {
        b_score.cmp(a_score).then_with(|| a_name.cmp(b_name))
    });
    ranking.truncate(limit);
    ranking
}
