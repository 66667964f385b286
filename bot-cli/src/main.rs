//! quizbot CLI: play the quiz bot in the terminal. Config from env and optional CLI args.

use anyhow::Result;
use bot_cli::{run_quiz, Cli, Commands, QuizConfig};
use bot_core::init_tracing;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            questions,
            language,
        } => {
            let config = QuizConfig::load(questions, language)?;
            init_tracing(config.log_file.as_deref())?;
            run_quiz(config).await
        }
    }
}
