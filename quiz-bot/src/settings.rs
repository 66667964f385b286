use std::time::Duration;

/// Pacing of the quiz. Delays are for medium-speed questions and are scaled by each question's speed,
/// except the pause between questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    /// Between two paragraphs of a question.
    pub paragraph_delay: Duration,
    /// After the last paragraph, before the answer is revealed.
    pub answer_delay: Duration,
    /// Between the announcement of a question and its first paragraph.
    pub question_delay: Duration,
    /// Number of players listed by `!scores`.
    pub scoreboard_length: usize,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            paragraph_delay: Duration::from_secs(10),
            answer_delay: Duration::from_secs(30),
            question_delay: Duration::from_secs(10),
            scoreboard_length: 10,
        }
    }
}
