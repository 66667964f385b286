//! # quiz-bot
//!
//! A trivia quiz played in a chat room. Users start it with `!start`, the bot reveals questions
//! paragraph by paragraph and the first public correct answer scores a point. `!stop` pauses,
//! `!scores` lists the best players privately.

pub mod bot;
pub mod error;
pub mod question;
pub mod resources;
pub mod scoreboard;
pub mod settings;

pub use bot::{build_quiz_bot, QuizServices, QuizSession};
pub use error::{QuizError, Result};
pub use question::{
    Question, QuestionDeck, QuestionFactory, QuestionRecord, ShuffledQuestions, Speed,
};
pub use resources::{EnglishResources, FrenchResources, Language, QuizResources};
pub use scoreboard::{FileScoreboard, InMemoryScoreboard, Scoreboard};
pub use settings::QuizSettings;
