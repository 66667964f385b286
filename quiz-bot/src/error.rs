//! Quiz error types.
//!
//! Used when loading questions and saved scores; runtime failures inside the bot are reported as
//! [`bot_core::BotError`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Invalid question '{id}': {reason}")]
    InvalidQuestion { id: String, reason: String },

    #[error("No questions to play")]
    NoQuestions,

    #[error("Invalid question file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QuizError>;
