//! # bot-cli
//!
//! Runs the quiz bot in a terminal: argument parsing, config loading, console network.

pub mod cli;
pub mod config;
pub mod console;

use std::sync::Arc;

use anyhow::{Context, Result};
use quiz_bot::{
    build_quiz_bot, EnglishResources, FileScoreboard, FrenchResources, InMemoryScoreboard,
    Language, QuestionDeck, QuestionFactory, QuizServices, Scoreboard, ShuffledQuestions,
};
use tracing::{info, warn};

pub use cli::{Cli, Commands};
pub use config::QuizConfig;
pub use console::ConsoleNetwork;

const SAMPLE_QUESTIONS: &str = include_str!("../questions.json");

/// Loads the configured question file, or the bundled sample questions.
pub fn load_questions(config: &QuizConfig) -> Result<QuestionDeck> {
    let deck = match &config.questions_file {
        Some(path) => QuestionDeck::from_json_file(path)
            .with_context(|| format!("Load questions from {}", path))?,
        None => QuestionDeck::from_json(SAMPLE_QUESTIONS).context("Load sample questions")?,
    };
    if config.hints > 0 {
        let fraction = 1.0 / (config.hints + 1) as f64;
        return Ok(deck.with_hints(config.hints, fraction));
    }
    Ok(deck)
}

/// The loaded questions, played once in order or drawn at random forever.
pub fn question_source(config: &QuizConfig) -> Result<Arc<dyn QuestionFactory>> {
    let deck = load_questions(config)?;
    if config.shuffle {
        let shuffled =
            ShuffledQuestions::new(deck.into_questions()).context("Shuffle questions")?;
        info!(questions = shuffled.count(), "Questions shuffled");
        return Ok(Arc::new(shuffled));
    }
    info!(questions = deck.remaining(), "Questions in order");
    Ok(Arc::new(deck))
}

pub async fn open_scoreboard(config: &QuizConfig) -> Result<Arc<dyn Scoreboard>> {
    match &config.scores_file {
        Some(path) => {
            let scoreboard = FileScoreboard::open(path)
                .await
                .with_context(|| format!("Load scores from {}", path))?;
            Ok(Arc::new(scoreboard))
        }
        None => Ok(Arc::new(InMemoryScoreboard::new())),
    }
}

/// Plays the quiz on stdin/stdout until input ends, Ctrl-C, or the questions run out.
pub async fn run_quiz(config: QuizConfig) -> Result<()> {
    info!(language = %config.language, "Starting quiz");
    let questions = question_source(&config)?;
    let scoreboard = open_scoreboard(&config).await?;

    let (network, sender) = ConsoleNetwork::new(std::io::stdout());
    let services = QuizServices {
        network: Arc::new(network),
        scheduler: Arc::new(bot_core::TokioScheduler),
        questions,
        scoreboard,
        settings: config.settings.clone(),
    };
    let bot = match config.language {
        Language::English => build_quiz_bot(services, Arc::new(EnglishResources))?,
        Language::French => build_quiz_bot(services, Arc::new(FrenchResources))?,
    };

    console::read_stdin(sender).context("Start reading input")?;

    let handle = bot.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            if let Err(e) = handle.stop().await {
                warn!(error = %e, "Stop on interrupt failed");
            }
        }
    });

    bot.run().await.context("Quiz bot failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_bot::QuizSettings;

    fn config(hints: usize) -> QuizConfig {
        QuizConfig {
            log_file: None,
            language: Language::English,
            questions_file: None,
            hints,
            shuffle: false,
            scores_file: None,
            settings: QuizSettings::default(),
        }
    }

    #[test]
    fn test_sample_questions_load() {
        let deck = load_questions(&config(0)).unwrap();
        assert_eq!(deck.remaining(), 4);
        let first = deck.next_question().unwrap();
        assert_eq!(first.id, "capital-fr");
        assert_eq!(first.paragraphs.len(), 1);
    }

    #[test]
    fn test_hints_split_the_answer() {
        let deck = load_questions(&config(1)).unwrap();
        let first = deck.next_question().unwrap();
        assert_eq!(first.paragraphs, vec!["What is the capital of France?", "Par"]);
    }

    #[test]
    fn test_shuffled_source_never_runs_out() {
        let mut config = config(0);
        config.shuffle = true;
        let questions = question_source(&config).unwrap();
        for _ in 0..20 {
            assert!(questions.next_question().is_some());
        }
    }

    #[test]
    fn test_ordered_source_plays_the_deck_once() {
        let questions = question_source(&config(0)).unwrap();
        for _ in 0..4 {
            assert!(questions.next_question().is_some());
        }
        assert!(questions.next_question().is_none());
    }

    #[tokio::test]
    async fn test_scores_file_is_used_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        let mut config = config(0);
        config.scores_file = Some(path.display().to_string());

        let scoreboard = open_scoreboard(&config).await.unwrap();
        scoreboard
            .increase_score(&bot_core::User::new("1", "alice"), 4)
            .await
            .unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("alice"));
    }

    #[test]
    fn test_missing_question_file() {
        let mut config = config(0);
        config.questions_file = Some("/nonexistent/questions.json".to_string());
        let err = load_questions(&config).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/questions.json"));
    }
}
