//! The quiz as a state machine.
//!
//! ```text
//! Waiting --!start--> PreQuestion --"Question" delay--> Question
//!    ^                  |  ^                               |
//!    +------!stop-------+  +--correct answer / "Answer"----+
//!    +------------------------!stop------------------------+
//! ```
//!
//! A question is picked on entry to PreQuestion and only shown once Question is entered, so nobody
//! can answer before its first paragraph was sent. When no question is left the bot stops.

use std::sync::{Arc, Mutex, MutexGuard};

use bot_core::{BotError, Command, Message, Network, Result, Scheduler};
use bot_engine::{Bot, BotBuilder, StateContext, StateId};
use tracing::info;

use crate::question::{Question, QuestionFactory};
use crate::resources::QuizResources;
use crate::scoreboard::{ranking, Scoreboard};
use crate::settings::QuizSettings;

/// Collaborators of a quiz bot.
pub struct QuizServices {
    pub network: Arc<dyn Network>,
    pub scheduler: Arc<dyn Scheduler>,
    pub questions: Arc<dyn QuestionFactory>,
    pub scoreboard: Arc<dyn Scoreboard>,
    pub settings: QuizSettings,
}

/// State shared by the quiz hooks.
pub struct QuizSession {
    questions: Arc<dyn QuestionFactory>,
    scoreboard: Arc<dyn Scoreboard>,
    resources: Arc<dyn QuizResources>,
    settings: QuizSettings,
    current: Mutex<Option<Arc<Question>>>,
}

impl QuizSession {
    /// The question picked on the last entry to PreQuestion.
    pub fn current_question(&self) -> Option<Arc<Question>> {
        self.current().clone()
    }

    fn current(&self) -> MutexGuard<'_, Option<Arc<Question>>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn require_question(&self) -> Result<Arc<Question>> {
        self.current_question()
            .ok_or_else(|| BotError::Handler("no question selected".to_string()))
    }
}

/// Builds a quiz bot that starts in Waiting.
pub fn build_quiz_bot<R>(services: QuizServices, resources: Arc<R>) -> Result<Bot<QuizSession>>
where
    R: QuizResources + 'static,
{
    let QuizServices {
        network,
        scheduler,
        questions,
        scoreboard,
        settings,
    } = services;
    let session = QuizSession {
        questions,
        scoreboard,
        resources: resources.clone(),
        settings,
        current: Mutex::new(None),
    };

    let mut builder = BotBuilder::new(network, session);
    builder.scheduler(scheduler).resources(resources);

    let waiting = builder.add_state("Waiting");
    let pre_question = builder.add_state("Pre-Question");
    let question = builder.add_state("Question");
    builder.initial_state(waiting);

    builder.global_command("scores", show_scores);

    builder
        .state(waiting)
        .command("start", move |ctx, _command| resume(ctx, pre_question));

    builder
        .state(pre_question)
        .command("stop", move |ctx, _command| pause(ctx, waiting))
        .initializer(pick_question)
        .background_action(move |ctx| announce_question(ctx, question));

    builder
        .state(question)
        .command("stop", move |ctx, _command| pause(ctx, waiting))
        .initializer(ask_question)
        .background_action(move |ctx| reveal_question(ctx, pre_question))
        .message_handler(move |ctx, message| check_answer(ctx, message, pre_question));

    builder.build()
}

async fn resume(ctx: StateContext<QuizSession>, pre_question: StateId) -> Result<()> {
    info!("Resuming");
    ctx.send_message(&ctx.session().resources.resuming()).await?;
    ctx.request_switch(pre_question)
}

async fn pause(ctx: StateContext<QuizSession>, waiting: StateId) -> Result<()> {
    info!("Pausing");
    ctx.send_message(&ctx.session().resources.pausing()).await?;
    ctx.request_switch(waiting)
}

async fn show_scores(ctx: StateContext<QuizSession>, command: Command) -> Result<()> {
    let session = ctx.session();
    let scores = session.scoreboard.scores_by_name().await?;
    let mut lines = vec![session.resources.scoreboard_title()];
    lines.extend(
        ranking(scores, session.settings.scoreboard_length)
            .into_iter()
            .map(|(name, score)| session.resources.scoreboard_entry(&name, score)),
    );
    ctx.send_private_message(&command.sender, &lines.join("\n"))
        .await
}

async fn pick_question(ctx: StateContext<QuizSession>) -> Result<()> {
    let session = ctx.session();
    let next = session.questions.next_question().map(Arc::new);
    *session.current() = next.clone();

    match next {
        Some(question) => {
            info!(question_id = %question.id, "Question selected");
        }
        None => {
            info!("No more questions available");
            ctx.send_message(&session.resources.no_more_questions())
                .await?;
            ctx.request_stop();
        }
    }
    Ok(())
}

async fn announce_question(ctx: StateContext<QuizSession>, question: StateId) -> Result<()> {
    let session = ctx.session();
    let delay = session.settings.question_delay;
    ctx.send_message(&session.resources.next_question_announcement(delay))
        .await?;
    ctx.delay("Question", delay).await?;
    ctx.request_switch(question)
}

async fn ask_question(ctx: StateContext<QuizSession>) -> Result<()> {
    let session = ctx.session();
    let question = session.require_question()?;
    info!(question_id = %question.id, "Writing first paragraph");
    let first = question.paragraphs.first().map(String::as_str).unwrap_or_default();
    ctx.send_message(&session.resources.question(question.category.as_deref(), first))
        .await
}

/// Sends the remaining paragraphs, then gives the answer away if nobody found it.
async fn reveal_question(ctx: StateContext<QuizSession>, pre_question: StateId) -> Result<()> {
    let session = ctx.session();
    let question = session.require_question()?;
    let settings = &session.settings;

    for paragraph in question.paragraphs.iter().skip(1) {
        ctx.delay("Paragraph", question.speed.scale(settings.paragraph_delay))
            .await?;
        ctx.send_message(&session.resources.question_paragraph(paragraph))
            .await?;
    }

    ctx.delay("Answer", question.speed.scale(settings.answer_delay))
        .await?;
    info!(question_id = %question.id, "No correct answer was given");
    ctx.send_message(&session.resources.no_answer(question.first_answer()))
        .await?;
    ctx.request_switch(pre_question)
}

async fn check_answer(
    ctx: StateContext<QuizSession>,
    message: Message,
    pre_question: StateId,
) -> Result<()> {
    // Answers only count in public; wrong ones get no feedback.
    if !message.is_public() {
        return Ok(());
    }
    let session = ctx.session();
    let question = session.require_question()?;
    let Some(answer) = question.matches(&message.text) else {
        return Ok(());
    };

    info!(question_id = %question.id, user_id = %message.sender.id, "Correct answer");
    let score = session.scoreboard.increase_score(&message.sender, 1).await?;
    ctx.send_message(
        &session
            .resources
            .congratulation(&message.sender.name, answer, score),
    )
    .await?;
    ctx.request_switch(pre_question)
}
