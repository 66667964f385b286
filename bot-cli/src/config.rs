use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use quiz_bot::{Language, QuizSettings};

/// Quiz configuration, loaded from environment variables. Command line values override them.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizConfig {
    /// `LOG_FILE`: also write logs to this file.
    pub log_file: Option<String>,
    /// `QUIZ_LANGUAGE`: `en` (default) or `fr`.
    pub language: Language,
    /// `QUIZ_QUESTIONS_FILE`: JSON question file; the bundled sample deck when unset.
    pub questions_file: Option<String>,
    /// `QUIZ_HINTS`: hint paragraphs appended to each question.
    pub hints: usize,
    /// `QUIZ_SHUFFLE`: `true` to draw random questions forever instead of playing the deck once.
    pub shuffle: bool,
    /// `QUIZ_SCORES_FILE`: keep scores in this JSON file; in memory only when unset.
    pub scores_file: Option<String>,
    pub settings: QuizSettings,
}

impl QuizConfig {
    pub fn load(questions_file: Option<String>, language: Option<Language>) -> Result<Self> {
        let defaults = QuizSettings::default();

        let language = match language {
            Some(language) => language,
            None => parse_var("QUIZ_LANGUAGE")?.unwrap_or_default(),
        };
        let questions_file = questions_file.or_else(|| env::var("QUIZ_QUESTIONS_FILE").ok());
        let settings = QuizSettings {
            paragraph_delay: seconds_var("QUIZ_PARAGRAPH_DELAY_SECS")?
                .unwrap_or(defaults.paragraph_delay),
            answer_delay: seconds_var("QUIZ_ANSWER_DELAY_SECS")?.unwrap_or(defaults.answer_delay),
            question_delay: seconds_var("QUIZ_QUESTION_DELAY_SECS")?
                .unwrap_or(defaults.question_delay),
            scoreboard_length: parse_var("QUIZ_SCOREBOARD_LENGTH")?
                .unwrap_or(defaults.scoreboard_length),
        };

        Ok(Self {
            log_file: env::var("LOG_FILE").ok().filter(|s| !s.is_empty()),
            language,
            questions_file,
            hints: parse_var("QUIZ_HINTS")?.unwrap_or(0),
            shuffle: parse_var("QUIZ_SHUFFLE")?.unwrap_or(false),
            scores_file: env::var("QUIZ_SCORES_FILE").ok().filter(|s| !s.is_empty()),
            settings,
        })
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("Invalid {}: '{}'", name, value)),
        _ => Ok(None),
    }
}

fn seconds_var(name: &str) -> Result<Option<Duration>> {
    let Some(seconds) = parse_var::<f64>(name)? else {
        return Ok(None);
    };
    Duration::try_from_secs_f64(seconds)
        .map(Some)
        .with_context(|| format!("Invalid {}: {} is not a valid delay", name, seconds))
}
