//! CLI parser.

use clap::{Parser, Subcommand};
use quiz_bot::Language;

#[derive(Parser)]
#[command(name = "quizbot")]
#[command(about = "Quiz bot CLI: play a quiz in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the quiz on stdin/stdout (config from env; options override it).
    ///
    /// Type `name: text` to talk in public, `name> text` to talk to the bot privately.
    Run {
        /// JSON question file (overrides QUIZ_QUESTIONS_FILE).
        #[arg(short, long)]
        questions: Option<String>,
        /// Language of the bot: en or fr (overrides QUIZ_LANGUAGE).
        #[arg(short, long)]
        language: Option<Language>,
    },
}
