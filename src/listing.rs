use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{CallbackQuery, ChatAction, ChatId, InlineKeyboardMarkup, Message},
    Bot,
};
use tracing::instrument;

use crate::api::client::{ApiError, FetchQuiz, ListQuizzes};
use crate::api::models::Quiz;
use crate::keyboard::{self, quizzes_keyboard, refresh_keyboard, yes_no_keyboard};
use crate::state::QuizState;
use crate::{HandlerResult, UserDialogue};

pub(crate) fn question_count_label(count: usize) -> String {
    if count == 1 {
        "1 question".to_owned()
    } else {
        format!("{count} questions")
    }
}

/// Message and keyboard for the list view's three states: the quiz rows,
/// the empty-state prompt, or an error with a retry row.
pub(crate) fn quiz_list_reply(
    fetched: Result<Vec<Quiz>, ApiError>,
) -> (String, InlineKeyboardMarkup) {
    match fetched {
        Ok(quizzes) if quizzes.is_empty() => {
            ("No quizzes available yet.".to_owned(), refresh_keyboard())
        }
        Ok(quizzes) => (
            "Please, choose an available quiz:".to_owned(),
            quizzes_keyboard(&quizzes),
        ),
        Err(e) => (format!("⚠️ {e}"), refresh_keyboard()),
    }
}

/// Loads and renders the quiz list, then parks the dialogue in `Browsing`.
/// Failures become a message with a retry button instead of bubbling up.
pub(crate) async fn send_quiz_list<C: ListQuizzes>(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &UserDialogue,
    client: &C,
) -> HandlerResult {
    bot.send_chat_action(chat_id, ChatAction::Typing).await?;
    let fetched = client.list_quizzes().await;
    match &fetched {
        Ok(quizzes) => log::info!("Listing {} quizzes", quizzes.len()),
        Err(e) => log::error!("Failed to load the quiz list: {e}"),
    }
    let (text, markup) = quiz_list_reply(fetched);
    bot.send_message(chat_id, text).reply_markup(markup).await?;
    dialogue.update(QuizState::Browsing).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, client))]
pub(crate) async fn show_quizzes<C: ListQuizzes>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    client: Arc<C>,
) -> HandlerResult {
    send_quiz_list(&bot, msg.chat.id, &dialogue, client.as_ref()).await
}

#[instrument(level = "info", skip(bot, dialogue, client))]
pub(crate) async fn pick_quiz<C: ListQuizzes + FetchQuiz>(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    client: Arc<C>,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;
    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };
    match q.data.as_deref() {
        Some(keyboard::REFRESH_LIST) => {
            send_quiz_list(&bot, chat_id, &dialogue, client.as_ref()).await?;
        }
        Some(data) => {
            if let Some(quiz_id) = keyboard::parse_quiz_callback(data) {
                open_quiz(&bot, chat_id, &dialogue, client.as_ref(), quiz_id).await?;
            } else {
                log::info!("Ignoring callback data '{data}' while browsing");
            }
        }
        None => {}
    }
    Ok(())
}

async fn open_quiz<C: FetchQuiz>(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &UserDialogue,
    client: &C,
    quiz_id: i64,
) -> HandlerResult {
    bot.send_chat_action(chat_id, ChatAction::Typing).await?;
    match client.fetch_quiz(quiz_id).await {
        Ok(quiz) if quiz.questions.is_empty() => {
            log::info!("Quiz {} '{}' has no questions", quiz.id, quiz.title);
            bot.send_message(chat_id, "Sorry, no questions for that quiz are available.")
                .await?;
        }
        Ok(quiz) => {
            log::info!("Quiz {} '{}' selected", quiz.id, quiz.title);
            bot.send_message(
                chat_id,
                format!(
                    "«{}»\n{}\n\nAre you ready to begin?",
                    quiz.title,
                    question_count_label(quiz.question_count()),
                ),
            )
            .reply_markup(yes_no_keyboard())
            .await?;
            dialogue.update(QuizState::AwaitingStart { quiz }).await?;
        }
        Err(e) => {
            log::error!("Failed to fetch quiz {quiz_id}: {e}");
            bot.send_message(chat_id, format!("⚠️ {e}")).await?;
        }
    }
    Ok(())
}
