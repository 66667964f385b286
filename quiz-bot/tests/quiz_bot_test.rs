//! Plays whole quiz games against a fake network, resolving delays by hand.

use std::sync::Arc;
use std::time::Duration;

use bot_core::testing::{FakeNetwork, ManualScheduler, Outbound};
use bot_core::{Resources, Result};
use bot_engine::Bot;
use quiz_bot::{
    build_quiz_bot, InMemoryScoreboard, Question, QuestionDeck, QuizResources, QuizServices,
    QuizSession, QuizSettings, Scoreboard, Speed,
};
use tokio::task::JoinHandle;

struct FakeQuizResources;

impl Resources for FakeQuizResources {
    fn started(&self) -> String {
        "Start".to_string()
    }

    fn stopped(&self) -> String {
        "Stop".to_string()
    }

    fn info(&self) -> String {
        "Info".to_string()
    }

    fn help(&self) -> String {
        "Help".to_string()
    }
}

impl QuizResources for FakeQuizResources {
    fn pausing(&self) -> String {
        "Pause".to_string()
    }

    fn resuming(&self) -> String {
        "Resume".to_string()
    }

    fn congratulation(&self, user_name: &str, answer: &str, new_score: i64) -> String {
        format!("Congrats {} on {} with score {}", user_name, answer, new_score)
    }

    fn no_answer(&self, answer: &str) -> String {
        format!("It was {}", answer)
    }

    fn next_question_announcement(&self, delay: Duration) -> String {
        format!("Next in {}", delay.as_millis())
    }

    fn no_more_questions(&self) -> String {
        "End".to_string()
    }

    fn scoreboard_title(&self) -> String {
        "Scoreboard".to_string()
    }
}

fn question(text: &str, answer: &str) -> Question {
    Question::new(text, None, vec![text.to_string()], vec![answer.to_string()]).unwrap()
}

fn settings() -> QuizSettings {
    QuizSettings {
        paragraph_delay: Duration::from_millis(100),
        answer_delay: Duration::from_millis(200),
        question_delay: Duration::from_millis(300),
        scoreboard_length: 3,
    }
}

struct Game {
    network: Arc<FakeNetwork>,
    scheduler: Arc<ManualScheduler>,
    bot: Bot<QuizSession>,
    runner: Option<JoinHandle<Result<()>>>,
}

impl Game {
    fn new(questions: Vec<Question>) -> Self {
        Self::with_scoreboard(questions, Arc::new(InMemoryScoreboard::new()), settings())
    }

    fn with_scoreboard(
        questions: Vec<Question>,
        scoreboard: Arc<dyn Scoreboard>,
        settings: QuizSettings,
    ) -> Self {
        let network = Arc::new(FakeNetwork::new());
        let scheduler = Arc::new(ManualScheduler::new());
        let bot = build_quiz_bot(
            QuizServices {
                network: network.clone(),
                scheduler: scheduler.clone(),
                questions: Arc::new(QuestionDeck::new(questions)),
                scoreboard,
                settings,
            },
            Arc::new(FakeQuizResources),
        )
        .unwrap();
        Self {
            network,
            scheduler,
            bot,
            runner: None,
        }
    }

    async fn start(&mut self) {
        let bot = self.bot.clone();
        self.runner = Some(tokio::spawn(async move { bot.run().await }));
        settle().await;
    }

    async fn say(&self, name: &str, text: &str) {
        self.network.say(name, text);
        settle().await;
    }

    async fn wait(&self, id: &str) {
        assert!(self.scheduler.advance(id), "nothing waits on '{}'", id);
        settle().await;
    }

    /// Stops the bot from outside.
    async fn force_stop(&mut self) {
        self.bot.stop().await.unwrap();
        self.finished().await;
    }

    /// Waits for a run that ends by itself.
    async fn finished(&mut self) {
        if let Some(runner) = self.runner.take() {
            runner.await.unwrap().unwrap();
        }
    }

    fn said(&self) -> Vec<String> {
        self.network.public_messages()
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn test_nothing() {
    let mut game = Game::new(vec![]);
    game.start().await;
    game.force_stop().await;

    assert_eq!(game.said(), vec!["Start", "Stop"]);
}

/// **Test: starting without questions announces the end and stops the bot.**
#[tokio::test(start_paused = true)]
async fn test_start_without_questions() {
    let mut game = Game::new(vec![]);
    game.start().await;
    game.say("user", "!start").await;
    game.finished().await;

    assert_eq!(game.said(), vec!["Start", "Resume", "End", "Stop"]);
}

#[tokio::test(start_paused = true)]
async fn test_pause() {
    let mut game = Game::new(vec![question("Hello?", "World")]);
    game.start().await;
    game.say("user", "!start").await;
    game.say("user", "!stop").await;
    game.force_stop().await;

    assert_eq!(
        game.said(),
        vec!["Start", "Resume", "Next in 300", "Pause", "Stop"]
    );
}

/// **Test: after a pause the pending question is never shown.**
#[tokio::test(start_paused = true)]
async fn test_pause_does_not_keep_going() {
    let mut game = Game::new(vec![question("Hello?", "World")]);
    game.start().await;
    game.say("user", "!start").await;
    game.say("user", "!stop").await;

    assert!(!game.scheduler.advance("Question"));
    settle().await;
    assert_eq!(game.bot.current_state().as_deref(), Some("Waiting"));
    game.force_stop().await;

    assert_eq!(
        game.said(),
        vec!["Start", "Resume", "Next in 300", "Pause", "Stop"]
    );
}

/// **Test: resuming after a pause moves on to the next question.**
#[tokio::test(start_paused = true)]
async fn test_pause_then_continue() {
    let mut game = Game::new(vec![question("Hello?", "World")]);
    game.start().await;
    game.say("user", "!start").await;
    game.say("user", "!stop").await;
    game.say("user", "!start").await;
    game.finished().await;

    assert_eq!(
        game.said(),
        vec!["Start", "Resume", "Next in 300", "Pause", "Resume", "End", "Stop"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_pause_during_question() {
    let mut game = Game::new(vec![question("Hello?", "World")]);
    game.start().await;
    game.say("user", "!start").await;
    game.wait("Question").await;
    game.say("user", "!stop").await;

    assert!(!game.scheduler.advance("Answer"));
    game.say("user", "World").await;
    game.force_stop().await;

    assert_eq!(
        game.said(),
        vec!["Start", "Resume", "Next in 300", "Hello?", "Pause", "Stop"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_nobody_answers() {
    let mut game = Game::new(vec![question("Hello?", "World")]);
    game.start().await;
    game.say("user", "!start").await;
    game.wait("Question").await;
    game.wait("Answer").await;
    game.finished().await;

    assert_eq!(
        game.said(),
        vec!["Start", "Resume", "Next in 300", "Hello?", "It was World", "End", "Stop"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_user_answers_correctly() {
    let mut game = Game::new(vec![question("Hello?", "World")]);
    game.start().await;
    game.say("user", "!start").await;
    game.wait("Question").await;
    game.say("user", "World").await;
    game.finished().await;

    assert_eq!(
        game.said(),
        vec![
            "Start",
            "Resume",
            "Next in 300",
            "Hello?",
            "Congrats user on World with score 1",
            "End",
            "Stop",
        ]
    );
    assert!(!game.scheduler.advance("Answer"));
}

#[tokio::test(start_paused = true)]
async fn test_user_answers_correctly_with_too_many_spaces() {
    let mut game = Game::new(vec![question("Hello?", "The World")]);
    game.start().await;
    game.say("user", "!start").await;
    game.wait("Question").await;
    game.say("user", "  The   World ").await;
    game.finished().await;

    assert_eq!(game.said()[4], "Congrats user on The World with score 1");
}

#[tokio::test(start_paused = true)]
async fn test_user_forgets_space() {
    let mut game = Game::new(vec![question("Hello?", "The World")]);
    game.start().await;
    game.say("user", "!start").await;
    game.wait("Question").await;
    game.say("user", "TheWorld").await;
    game.wait("Answer").await;
    game.finished().await;

    assert_eq!(
        game.said(),
        vec!["Start", "Resume", "Next in 300", "Hello?", "It was The World", "End", "Stop"]
    );
}

/// **Test: answers given before the first paragraph do not count.**
#[tokio::test(start_paused = true)]
async fn test_user_answers_before_question() {
    let mut game = Game::new(vec![question("Hello?", "World")]);
    game.start().await;
    game.say("user", "!start").await;
    game.say("user", "World").await;
    game.wait("Question").await;
    game.wait("Answer").await;
    game.finished().await;

    assert_eq!(
        game.said(),
        vec!["Start", "Resume", "Next in 300", "Hello?", "It was World", "End", "Stop"]
    );
}

/// **Test: private answers are ignored.**
#[tokio::test(start_paused = true)]
async fn test_private_answer_does_not_count() {
    let mut game = Game::new(vec![question("Hello?", "World")]);
    game.start().await;
    game.say("user", "!start").await;
    game.wait("Question").await;
    game.network.whisper("user", "World");
    settle().await;
    game.wait("Answer").await;
    game.finished().await;

    assert_eq!(game.said()[4], "It was World");
    assert!(game.network.outbound().iter().all(|m| matches!(m, Outbound::Public(_))));
}

/// **Test: paragraphs are revealed one by one, at the question's speed.**
#[tokio::test(start_paused = true)]
async fn test_question_with_multiple_paragraphs() {
    let slow = Question::new(
        "Q",
        None,
        vec!["1".to_string(), "2".to_string(), "3".to_string()],
        vec!["4!".to_string()],
    )
    .unwrap()
    .with_speed(Speed::Slow);
    let mut game = Game::new(vec![slow]);
    game.start().await;
    game.say("user", "!start").await;
    game.wait("Question").await;
    assert_eq!(game.said().last().map(String::as_str), Some("1"));
    game.wait("Paragraph").await;
    assert_eq!(game.said().last().map(String::as_str), Some("2"));
    game.wait("Paragraph").await;
    game.wait("Answer").await;
    game.finished().await;

    assert_eq!(
        game.said(),
        vec!["Start", "Resume", "Next in 300", "1", "2", "3", "It was 4!", "End", "Stop"]
    );
    assert_eq!(
        game.scheduler.requested(),
        vec![
            ("Question".to_string(), Duration::from_millis(300)),
            ("Paragraph".to_string(), Duration::from_millis(150)),
            ("Paragraph".to_string(), Duration::from_millis(150)),
            ("Answer".to_string(), Duration::from_millis(300)),
        ]
    );
}

/// **Test: an answer in the middle of a question skips its remaining paragraphs.**
#[tokio::test(start_paused = true)]
async fn test_answer_skips_remaining_paragraphs() {
    let long = Question::new(
        "Q",
        None,
        vec!["1".to_string(), "2".to_string(), "3".to_string()],
        vec!["4".to_string()],
    )
    .unwrap();
    let mut game = Game::new(vec![long]);
    game.start().await;
    game.say("alice", "!start").await;
    game.wait("Question").await;
    game.say("alice", "4").await;

    assert!(!game.scheduler.advance("Paragraph"));
    game.finished().await;
    assert_eq!(
        game.said(),
        vec!["Start", "Resume", "Next in 300", "1", "Congrats alice on 4 with score 1", "End", "Stop"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_question_shows_category() {
    let categorized = Question::new(
        "math-1",
        Some("Math".to_string()),
        vec!["What is 2?".to_string()],
        vec!["1+1".to_string()],
    )
    .unwrap();
    let mut game = Game::new(vec![categorized]);
    game.start().await;
    game.say("user", "!start").await;
    game.wait("Question").await;
    game.force_stop().await;

    assert_eq!(game.said()[3], "[Math] What is 2?");
}

#[tokio::test(start_paused = true)]
async fn test_two_users_compete_in_single_question() {
    let mut game = Game::new(vec![question("Hello?", "World")]);
    game.start().await;
    game.say("alice", "!start").await;
    game.wait("Question").await;
    game.say("alice", "Hello").await;
    game.say("bob", "World").await;
    game.finished().await;

    assert_eq!(game.said()[4], "Congrats bob on World with score 1");
}

#[tokio::test(start_paused = true)]
async fn test_two_users_compete_in_three_questions() {
    let mut game = Game::new(vec![
        question("Q1?", "A1"),
        question("Q2?", "A2"),
        question("Q3?", "A3"),
    ]);
    game.start().await;
    game.say("alice", "!start").await;
    game.wait("Question").await;
    game.say("alice", "A1").await;
    game.wait("Question").await;
    game.say("alice", "A3").await;
    game.say("bob", "A2").await;
    game.wait("Question").await;
    game.say("alice", "A3").await;
    game.finished().await;

    assert_eq!(
        game.said(),
        vec![
            "Start",
            "Resume",
            "Next in 300",
            "Q1?",
            "Congrats alice on A1 with score 1",
            "Next in 300",
            "Q2?",
            "Congrats bob on A2 with score 1",
            "Next in 300",
            "Q3?",
            "Congrats alice on A3 with score 2",
            "End",
            "Stop",
        ]
    );
}

/// **Test: two answers in the same batch only score once.**
#[tokio::test(start_paused = true)]
async fn test_simultaneous_answers_score_once() {
    let scoreboard = Arc::new(InMemoryScoreboard::new());
    let mut game = Game::with_scoreboard(
        vec![question("Hello?", "World")],
        scoreboard.clone(),
        settings(),
    );
    game.start().await;
    game.say("alice", "!start").await;
    game.wait("Question").await;
    game.network.say("alice", "World");
    game.network.say("bob", "world");
    settle().await;
    game.finished().await;

    let scores = scoreboard.scores_by_name().await.unwrap();
    assert_eq!(scores.get("alice"), Some(&1));
    assert_eq!(scores.get("bob"), None);
}

/// **Test: `!scores` lists the best players privately, in any state.**
#[tokio::test(start_paused = true)]
async fn test_scoreboard() {
    let scoreboard = Arc::new(InMemoryScoreboard::new());
    for (name, score) in [("A", 100), ("B", 10), ("C", 20), ("D", 50)] {
        scoreboard
            .increase_score(&FakeNetwork::user(name), score)
            .await
            .unwrap();
    }
    let mut game = Game::with_scoreboard(vec![], scoreboard, settings());
    game.start().await;
    game.say("A", "!scores").await;
    game.force_stop().await;

    assert_eq!(
        game.network.outbound(),
        vec![
            Outbound::Public("Start".to_string()),
            Outbound::Private {
                to: "A".to_string(),
                text: "Scoreboard\nA: 100\nD: 50\nC: 20".to_string(),
            },
            Outbound::Public("Stop".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_help_uses_quiz_texts() {
    let mut game = Game::new(vec![]);
    game.start().await;
    game.say("alice", "!help").await;
    game.say("alice", "!info").await;
    game.force_stop().await;

    assert_eq!(
        game.network.transcript(),
        vec!["bot: Start", "bot>alice: Help", "bot>alice: Info", "bot: Stop"]
    );
}
