//! Quiz questions and where they come from.
//!
//! A [`Question`] is shown one paragraph at a time; any of its answers wins. Questions are handed
//! out by a [`QuestionFactory`], usually a [`QuestionDeck`] loaded from a JSON file:
//!
//! ```json
//! [
//!   { "id": "capital-fr", "category": "Geography",
//!     "paragraphs": ["Capital of France?"], "answers": ["Paris"], "speed": "fast" }
//! ]
//! ```

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{QuizError, Result};

/// How fast paragraphs are revealed and how long players get to answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Fast,
    #[default]
    Medium,
    Slow,
}

impl Speed {
    /// Scales a medium-speed delay: ×0.5 fast, ×1.5 slow.
    pub fn scale(self, delay: Duration) -> Duration {
        match self {
            Speed::Fast => delay / 2,
            Speed::Medium => delay,
            Speed::Slow => delay * 3 / 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Unique id, used in logs.
    pub id: String,
    pub category: Option<String>,
    /// Shown in order; later ones are skipped when someone answers early.
    pub paragraphs: Vec<String>,
    /// The first one is revealed when nobody finds any.
    pub answers: Vec<String>,
    pub case_sensitive: bool,
    pub speed: Speed,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        category: Option<String>,
        paragraphs: Vec<String>,
        answers: Vec<String>,
    ) -> Result<Self> {
        let id = id.into();
        if paragraphs.is_empty() {
            return Err(QuizError::InvalidQuestion {
                id,
                reason: "a question must have at least one paragraph".to_string(),
            });
        }
        if answers.iter().all(|a| normalize(a).is_empty()) {
            return Err(QuizError::InvalidQuestion {
                id,
                reason: "a question must have at least one answer".to_string(),
            });
        }
        Ok(Self {
            id,
            category,
            paragraphs,
            answers,
            case_sensitive: false,
            speed: Speed::Medium,
        })
    }

    pub fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Returns the acceptable answer `text` matches, if any.
    ///
    /// Leading/trailing whitespace is ignored and inner runs of whitespace count as one space;
    /// case is ignored unless the question is case sensitive.
    pub fn matches(&self, text: &str) -> Option<&str> {
        let candidate = self.comparable(text);
        if candidate.is_empty() {
            return None;
        }
        self.answers
            .iter()
            .find(|answer| self.comparable(answer) == candidate)
            .map(String::as_str)
    }

    pub fn first_answer(&self) -> &str {
        self.answers.first().map(String::as_str).unwrap_or_default()
    }

    /// Appends up to `count` hint paragraphs, each revealing `fraction` more of the first answer.
    /// Hints that would give the whole answer away are skipped.
    pub fn with_hints(mut self, count: usize, fraction: f64) -> Self {
        let answer: Vec<char> = self.first_answer().chars().collect();
        for n in 1..=count {
            let shown = (answer.len() as f64 * fraction * n as f64).ceil() as usize;
            if shown >= answer.len() {
                continue;
            }
            self.paragraphs.push(answer[..shown].iter().collect());
        }
        self
    }

    fn comparable(&self, text: &str) -> String {
        let normalized = normalize(text);
        if self.case_sensitive {
            normalized
        } else {
            normalized.to_lowercase()
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A question as written in a question file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub paragraphs: Vec<String>,
    pub answers: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub speed: Speed,
}

impl QuestionRecord {
    /// Validates the record; records without an id are named after their position.
    pub fn into_question(self, index: usize) -> Result<Question> {
        let id = self.id.unwrap_or_else(|| format!("q{}", index + 1));
        Ok(Question::new(id, self.category, self.paragraphs, self.answers)?
            .with_speed(self.speed)
            .case_sensitive(self.case_sensitive))
    }
}

/// Source of questions. `None` means the quiz is over.
pub trait QuestionFactory: Send + Sync {
    fn next_question(&self) -> Option<Question>;
}

/// Hands out its questions once each, in order.
#[derive(Debug, Default)]
pub struct QuestionDeck {
    questions: Mutex<VecDeque<Question>>,
}

impl QuestionDeck {
    pub fn new(questions: impl IntoIterator<Item = Question>) -> Self {
        Self {
            questions: Mutex::new(questions.into_iter().collect()),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<QuestionRecord> = serde_json::from_str(json)?;
        let questions = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_question(index))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(questions))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let deck = Self::from_json(&json)?;
        info!(path = %path.display(), questions = deck.remaining(), "Loaded questions");
        Ok(deck)
    }

    /// Adds hint paragraphs to every remaining question.
    pub fn with_hints(self, count: usize, fraction: f64) -> Self {
        Self::new(
            self.into_questions()
                .into_iter()
                .map(|q| q.with_hints(count, fraction)),
        )
    }

    /// The questions not handed out yet, in order.
    pub fn into_questions(self) -> Vec<Question> {
        self.questions
            .into_inner()
            .unwrap_or_else(|e| e.into_inner())
            .into()
    }

    pub fn remaining(&self) -> usize {
        self.questions.lock().map(|q| q.len()).unwrap_or(0)
    }
}

impl QuestionFactory for QuestionDeck {
    fn next_question(&self) -> Option<Question> {
        self.questions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }
}

/// Picks a random question every time and never runs out. Questions can repeat.
#[derive(Debug)]
pub struct ShuffledQuestions {
    questions: Vec<Question>,
    rng: Mutex<StdRng>,
}

impl ShuffledQuestions {
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        Self::with_rng(questions, StdRng::from_entropy())
    }

    /// Same questions, same order for the same seed.
    pub fn with_seed(questions: Vec<Question>, seed: u64) -> Result<Self> {
        Self::with_rng(questions, StdRng::seed_from_u64(seed))
    }

    fn with_rng(questions: Vec<Question>, rng: StdRng) -> Result<Self> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        Ok(Self {
            questions,
            rng: Mutex::new(rng),
        })
    }

    /// Number of distinct questions drawn from.
    pub fn count(&self) -> usize {
        self.questions.len()
    }
}

impl QuestionFactory for ShuffledQuestions {
    fn next_question(&self) -> Option<Question> {
        let index = self
            .rng
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .gen_range(0..self.questions.len());
        self.questions.get(index).cloned()
    }
}
