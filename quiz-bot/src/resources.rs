//! Texts the quiz bot sends, in English and French.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bot_core::Resources;

/// Quiz texts on top of the bot's own announcements.
pub trait QuizResources: Resources {
    fn pausing(&self) -> String;
    fn resuming(&self) -> String;
    fn congratulation(&self, user_name: &str, answer: &str, new_score: i64) -> String;
    fn no_answer(&self, answer: &str) -> String;
    fn next_question_announcement(&self, delay: Duration) -> String;
    fn no_more_questions(&self) -> String;
    fn scoreboard_title(&self) -> String;

    fn scoreboard_entry(&self, user_name: &str, score: i64) -> String {
        format!("{}: {}", user_name, score)
    }

    /// First paragraph of a question, with its category if any.
    fn question(&self, category: Option<&str>, first_paragraph: &str) -> String {
        match category {
            Some(category) => format!("[{}] {}", category, first_paragraph),
            None => first_paragraph.to_string(),
        }
    }

    fn question_paragraph(&self, paragraph: &str) -> String {
        paragraph.to_string()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishResources;

impl Resources for EnglishResources {
    fn started(&self) -> String {
        "Hello, I am the quiz master.\n\
         !start to begin.\n\
         !help to list the available commands."
            .to_string()
    }

    fn stopped(&self) -> String {
        "Goodbye!".to_string()
    }

    fn info(&self) -> String {
        "I am a quiz bot.".to_string()
    }

    fn help(&self) -> String {
        "!start to begin.\n\
         !stop to pause.\n\
         !scores to see the best players.\n\
         !help to see this list of commands."
            .to_string()
    }
}

impl QuizResources for EnglishResources {
    fn pausing(&self) -> String {
        "The quiz is paused.\n!start to continue.".to_string()
    }

    fn resuming(&self) -> String {
        "The quiz is back on!".to_string()
    }

    fn congratulation(&self, user_name: &str, answer: &str, new_score: i64) -> String {
        format!(
            "Well done, {}!\nThe answer was indeed '{}'.\nYou now have {} points.",
            user_name, answer, new_score
        )
    }

    fn no_answer(&self, answer: &str) -> String {
        format!("The answer was {}.", answer)
    }

    fn next_question_announcement(&self, delay: Duration) -> String {
        format!("Next question in {} seconds...", delay.as_secs_f64())
    }

    fn no_more_questions(&self) -> String {
        "I have no more questions!\nGoodbye!".to_string()
    }

    fn scoreboard_title(&self) -> String {
        "Scoreboard".to_string()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FrenchResources;

impl Resources for FrenchResources {
    fn started(&self) -> String {
        "Bonjour, je suis le maître du quiz.\n\
         !start pour commencer.\n\
         !help pour voir la liste des commandes disponibles."
            .to_string()
    }

    fn stopped(&self) -> String {
        "Au revoir !".to_string()
    }

    fn info(&self) -> String {
        "Je suis un bot de quiz.".to_string()
    }

    fn help(&self) -> String {
        "!start pour commencer.\n\
         !stop pour arrêter.\n\
         !scores pour voir les meilleurs joueurs.\n\
         !help pour voir cette liste de commandes."
            .to_string()
    }
}

impl QuizResources for FrenchResources {
    fn pausing(&self) -> String {
        "Le quiz est en pause.\n!start pour continuer.".to_string()
    }

    fn resuming(&self) -> String {
        "Le quiz reprend !".to_string()
    }

    fn congratulation(&self, user_name: &str, answer: &str, new_score: i64) -> String {
        format!(
            "Bravo, {} !\nLa réponse était bien '{}'.\nTu as maintenant {} points.",
            user_name, answer, new_score
        )
    }

    fn no_answer(&self, answer: &str) -> String {
        format!("La réponse était {}.", answer)
    }

    fn next_question_announcement(&self, delay: Duration) -> String {
        format!("Prochaine question dans {} secondes...", delay.as_secs_f64())
    }

    fn no_more_questions(&self) -> String {
        "Je n'ai plus de questions !\nAu revoir !".to_string()
    }

    fn scoreboard_title(&self) -> String {
        "Tableau des scores".to_string()
    }
}

/// Language of the quiz texts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    English,
    French,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "fr" | "french" | "français" => Ok(Language::French),
            other => Err(format!("Unsupported language '{}' (expected en or fr)", other)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "en"),
            Language::French => write!(f, "fr"),
        }
    }
}
