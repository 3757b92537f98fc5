use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{CallbackQuery, ChatAction, ChatId, Message, ParseMode, ReplyMarkup},
    utils::html,
    Bot,
};
use tracing::instrument;

use crate::{
    api::client::{Identity, ListQuizzes, SubmitAttempt},
    api::models::{AnswerPayload, Question, Quiz, SubmitOutcome},
    keyboard::{self, options_keyboard, review_keyboard, skip_keyboard},
    listing::{question_count_label, send_quiz_list},
    results,
    state::{AnswerMap, QuizState},
    HandlerResult, UserDialogue,
};

#[instrument(level = "info", skip(bot, dialogue, client))]
pub(crate) async fn confirm_start<C: ListQuizzes>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    quiz: Quiz,
    client: Arc<C>,
) -> HandlerResult {
    match msg.text() {
        Some("Yes") | Some("Yes✔️") => {
            log::info!(
                "{} starts quiz '{}'",
                msg.chat.username().unwrap_or("anonymous"),
                quiz.title
            );
            bot.send_message(msg.chat.id, "Let's begin!")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;

            let answers = AnswerMap::new();
            ask_question(&bot, msg.chat.id, &quiz, 0, &answers).await?;
            dialogue
                .update(QuizState::Answering {
                    quiz,
                    current: 0,
                    answers,
                })
                .await?;
        }
        Some("No") | Some("No❌") => {
            log::info!(
                "{} declines quiz '{}'",
                msg.chat.username().unwrap_or("anonymous"),
                quiz.title
            );
            bot.send_message(msg.chat.id, "OK. Returning to the quiz list...")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            send_quiz_list(&bot, msg.chat.id, &dialogue, client.as_ref()).await?;
        }
        _ => {
            bot.send_message(
                msg.chat.id,
                "Please, enter a valid answer <b>Yes</b> or <b>No</b>.",
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
    }

    Ok(())
}

/// Renders one question. Choice questions get an option keyboard, text
/// questions a prompt for a message, both with a skip row.
pub(crate) async fn ask_question(
    bot: &Bot,
    chat_id: ChatId,
    quiz: &Quiz,
    index: usize,
    answers: &AnswerMap,
) -> HandlerResult {
    let Some(question) = quiz.questions.get(index) else {
        return Ok(());
    };
    let header = format!(
        "Question #{} of {}\n\n{}",
        index + 1,
        quiz.questions.len(),
        html::escape(&question.context),
    );
    let recorded = answers.get(&question.id).map(String::as_str);

    if question.qtype.is_choice() {
        bot.send_message(chat_id, header)
            .parse_mode(ParseMode::Html)
            .reply_markup(options_keyboard(question, recorded))
            .await?;
    } else {
        let mut text = header;
        if let Some(current) = recorded.filter(|response| !response.is_empty()) {
            text.push_str(&format!("\nCurrent answer: {}", html::escape(current)));
        }
        text.push_str("\n\n✍️ Send your answer as a message.");
        bot.send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(skip_keyboard())
            .await?;
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn take_text_answer(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (quiz, current, mut answers): (Quiz, usize, AnswerMap),
) -> HandlerResult {
    let Some(question) = quiz.questions.get(current) else {
        return advance(&bot, msg.chat.id, &dialogue, quiz, current, answers).await;
    };
    if question.qtype.is_choice() {
        bot.send_message(msg.chat.id, "Please use the answer buttons for this question.")
            .await?;
        return Ok(());
    }
    match msg.text() {
        Some(text) if !text.is_empty() => {
            log::info!(
                "{} answers question #{} of quiz '{}'",
                msg.chat.username().unwrap_or("anonymous"),
                current + 1,
                quiz.title
            );
            answers.insert(question.id, text.to_owned());
            advance(&bot, msg.chat.id, &dialogue, quiz, current, answers).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please, send your answer as a text message.")
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn take_option(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    (quiz, current, mut answers): (Quiz, usize, AnswerMap),
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;
    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };

    if data == keyboard::SKIP_QUESTION {
        log::info!(
            "{} skips question #{} of quiz '{}'",
            q.from.username.as_deref().unwrap_or("anonymous"),
            current + 1,
            quiz.title
        );
        return advance(&bot, chat_id, &dialogue, quiz, current, answers).await;
    }

    let Some((question_id, option_id)) = keyboard::parse_answer_callback(data) else {
        log::info!("Ignoring callback data '{data}' while answering");
        return Ok(());
    };
    let Some(question) = quiz.question_by_id(question_id) else {
        return Ok(());
    };

    log::info!(
        "{} answers question {} of quiz '{}'",
        q.from.username.as_deref().unwrap_or("anonymous"),
        question_id,
        quiz.title
    );
    if let Some(message) = &q.message {
        if let Some(option) = question.option_by_id(&option_id) {
            if let Some(text) = message.regular_message().and_then(|m| m.text()) {
                bot.edit_message_text(chat_id, message.id(), format!("{text}\n\n➡️ {}", option.content))
                    .await?;
            }
        }
    }
    // Last write wins, so a tap on an older keyboard re-answers that question.
    answers.insert(question_id, option_id);

    let on_current = quiz.questions.get(current).map(|question| question.id) == Some(question_id);
    if on_current {
        advance(&bot, chat_id, &dialogue, quiz, current, answers).await?;
    } else {
        dialogue
            .update(QuizState::Answering {
                quiz,
                current,
                answers,
            })
            .await?;
    }
    Ok(())
}

async fn advance(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &UserDialogue,
    quiz: Quiz,
    current: usize,
    answers: AnswerMap,
) -> HandlerResult {
    let next = current + 1;
    if next < quiz.questions.len() {
        ask_question(bot, chat_id, &quiz, next, &answers).await?;
        dialogue
            .update(QuizState::Answering {
                quiz,
                current: next,
                answers,
            })
            .await?;
    } else {
        send_review_summary(bot, chat_id, &quiz, &answers).await?;
        dialogue.update(QuizState::Reviewing { quiz, answers }).await?;
    }
    Ok(())
}

async fn send_review_summary(
    bot: &Bot,
    chat_id: ChatId,
    quiz: &Quiz,
    answers: &AnswerMap,
) -> HandlerResult {
    let answered = quiz.questions.len() - unanswered(quiz, answers).len();
    let mut lines = vec![format!("📋 {}", html::escape(&quiz.title))];
    for (index, question) in quiz.questions.iter().enumerate() {
        let mark = if is_answered(question, answers) { "✅" } else { "⬜" };
        lines.push(format!("{mark} Question #{}", index + 1));
    }
    lines.push(String::new());
    lines.push(format!(
        "Answered {answered} of {}.",
        question_count_label(quiz.questions.len())
    ));

    bot.send_message(chat_id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .reply_markup(review_keyboard())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, client, identity))]
pub(crate) async fn review_action<C: SubmitAttempt>(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    (quiz, mut answers): (Quiz, AnswerMap),
    client: Arc<C>,
    identity: Identity,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;
    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };

    if data == keyboard::SUBMIT_ATTEMPT {
        return submit(&bot, chat_id, &dialogue, quiz, answers, client.as_ref(), &identity).await;
    }
    if data == keyboard::REVISIT_QUESTIONS {
        ask_question(&bot, chat_id, &quiz, 0, &answers).await?;
        dialogue
            .update(QuizState::Answering {
                quiz,
                current: 0,
                answers,
            })
            .await?;
        return Ok(());
    }
    // A tap on a question keyboard left above the summary still counts.
    if let Some((question_id, option_id)) = keyboard::parse_answer_callback(data) {
        if quiz.question_by_id(question_id).is_some() {
            answers.insert(question_id, option_id);
            send_review_summary(&bot, chat_id, &quiz, &answers).await?;
            dialogue.update(QuizState::Reviewing { quiz, answers }).await?;
        }
        return Ok(());
    }
    log::info!("Ignoring callback data '{data}' while reviewing");
    Ok(())
}

pub(crate) async fn review_nudge(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "Use the buttons above to submit or go over the questions.",
    )
    .await?;
    Ok(())
}

async fn submit<C: SubmitAttempt>(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &UserDialogue,
    quiz: Quiz,
    answers: AnswerMap,
    client: &C,
    identity: &Identity,
) -> HandlerResult {
    if let Some(warning) = submission_blocker(&quiz, &answers) {
        bot.send_message(chat_id, warning)
            .reply_markup(review_keyboard())
            .await?;
        return Ok(());
    }

    bot.send_chat_action(chat_id, ChatAction::Typing).await?;
    match client
        .submit_attempt(quiz.id, answer_payloads(&answers), identity)
        .await
    {
        Ok(outcome) => {
            let quiz_title = resolved_title(&outcome, &quiz);
            log::info!(
                "Attempt {} for quiz '{}' scored {}/{}",
                outcome.attempt.id,
                quiz_title,
                outcome.score,
                outcome.total_questions
            );
            results::send_result(bot, chat_id, outcome.score, outcome.total_questions, &quiz_title)
                .await?;
            dialogue
                .update(QuizState::Finished {
                    attempt_id: outcome.attempt.id,
                    score: outcome.score,
                    total: outcome.total_questions,
                    quiz_title,
                })
                .await?;
        }
        Err(e) => {
            // The dialogue stays in Reviewing with the answers intact.
            log::error!("Failed to submit quiz {}: {e}", quiz.id);
            bot.send_message(chat_id, format!("⚠️ {e}"))
                .reply_markup(review_keyboard())
                .await?;
        }
    }
    Ok(())
}

fn is_answered(question: &Question, answers: &AnswerMap) -> bool {
    answers
        .get(&question.id)
        .is_some_and(|response| !response.is_empty())
}

/// Questions with no recorded response. An entry holding an empty string
/// counts as unanswered, the same as blank input in a form.
pub(crate) fn unanswered<'q>(quiz: &'q Quiz, answers: &AnswerMap) -> Vec<&'q Question> {
    quiz.questions
        .iter()
        .filter(|question| !is_answered(question, answers))
        .collect()
}

/// The warning shown instead of submitting while questions remain open.
pub(crate) fn submission_blocker(quiz: &Quiz, answers: &AnswerMap) -> Option<String> {
    let missing = unanswered(quiz, answers).len();
    (missing > 0).then(|| format!("Please answer all questions. {missing} question(s) remaining."))
}

/// Responses are forwarded verbatim; the backend is the one that grades.
pub(crate) fn answer_payloads(answers: &AnswerMap) -> Vec<AnswerPayload> {
    answers
        .iter()
        .map(|(question_id, response)| AnswerPayload {
            question_id: *question_id,
            response: response.clone(),
        })
        .collect()
}

fn resolved_title(outcome: &SubmitOutcome, fallback: &Quiz) -> String {
    outcome
        .quiz
        .as_ref()
        .map(|scored| scored.title.clone())
        .unwrap_or_else(|| fallback.title.clone())
}
