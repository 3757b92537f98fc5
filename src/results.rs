use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{CallbackQuery, ChatAction, ChatId, Message, ParseMode},
    utils::html,
    Bot,
};
use tracing::instrument;

use crate::api::client::{FetchAttempt, Identity, ListQuizzes};
use crate::api::models::Attempt;
use crate::keyboard::{self, result_keyboard};
use crate::listing::send_quiz_list;
use crate::{HandlerResult, UserDialogue};

/// Share of correct answers as a whole percent. A non-positive total would
/// divide by zero and renders as 0%.
pub fn percentage(score: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    ((score as f64 / total as f64) * 100.0).round() as i64
}

pub fn score_message(percentage: i64) -> &'static str {
    if percentage >= 90 {
        "Outstanding! 🎉"
    } else if percentage >= 80 {
        "Great Job! 👏"
    } else if percentage >= 60 {
        "Good Effort! 👍"
    } else if percentage >= 40 {
        "Keep Practicing! 💪"
    } else {
        "Try Again! 📚"
    }
}

pub fn score_badge(percentage: i64) -> &'static str {
    if percentage >= 80 {
        "🟢"
    } else if percentage >= 60 {
        "🟡"
    } else {
        "🔴"
    }
}

pub fn render_result(score: i64, total: i64, quiz_title: &str) -> String {
    let percent = percentage(score, total);
    format!(
        "<b>Quiz Results</b>\n\n{} <b>{}%</b>\n{}\n\nYou scored {} out of {}\nQuiz: {}",
        score_badge(percent),
        percent,
        score_message(percent),
        score,
        total,
        html::escape(quiz_title),
    )
}

pub(crate) async fn send_result(
    bot: &Bot,
    chat_id: ChatId,
    score: i64,
    total: i64,
    quiz_title: &str,
) -> HandlerResult {
    bot.send_message(chat_id, render_result(score, total, quiz_title))
        .parse_mode(ParseMode::Html)
        .reply_markup(result_keyboard())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot))]
pub(crate) async fn show_result_again(
    bot: Bot,
    msg: Message,
    (attempt_id, score, total, quiz_title): (i64, i64, i64, String),
) -> HandlerResult {
    log::info!("Re-sending the result card for attempt {attempt_id}");
    send_result(&bot, msg.chat.id, score, total, &quiz_title).await
}

#[instrument(level = "info", skip(bot, dialogue, client, identity))]
pub(crate) async fn result_action<C: ListQuizzes + FetchAttempt>(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    (attempt_id, score, total, quiz_title): (i64, i64, i64, String),
    client: Arc<C>,
    identity: Identity,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;
    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };
    match q.data.as_deref() {
        Some(keyboard::BACK_TO_LIST) => {
            send_quiz_list(&bot, chat_id, &dialogue, client.as_ref()).await?;
        }
        Some(keyboard::SHOW_ANSWERS) => {
            log::info!(
                "Showing answers for attempt {attempt_id} ({score}/{total} on '{quiz_title}')"
            );
            bot.send_chat_action(chat_id, ChatAction::Typing).await?;
            match client.fetch_attempt(attempt_id, &identity).await {
                Ok(attempt) => {
                    bot.send_message(chat_id, render_attempt_breakdown(&attempt))
                        .parse_mode(ParseMode::Html)
                        .reply_markup(result_keyboard())
                        .await?;
                }
                Err(e) => {
                    log::error!("Failed to fetch attempt {attempt_id}: {e}");
                    bot.send_message(chat_id, format!("⚠️ {e}"))
                        .reply_markup(result_keyboard())
                        .await?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Per-question breakdown of a scored attempt. Option ids resolve back to
/// their display text where the nested question allows it; free-text answers
/// are shown as sent, with no verdict attached.
pub fn render_attempt_breakdown(attempt: &Attempt) -> String {
    let title = attempt
        .quiz
        .as_ref()
        .map(|quiz| quiz.title.as_str())
        .unwrap_or("Your answers");
    let mut lines = vec![
        format!("<b>{}</b>", html::escape(title)),
        format!("Score: {}", attempt.score),
    ];

    let answers = attempt.answers.as_deref().unwrap_or_default();
    for (index, answer) in answers.iter().enumerate() {
        lines.push(String::new());
        match &answer.question {
            Some(question) => {
                let picked = question.option_by_id(&answer.response);
                let shown = picked
                    .map(|option| option.content.as_str())
                    .unwrap_or(answer.response.as_str());
                let verdict = match picked {
                    Some(option) if option.correct => " ✅",
                    Some(_) => " ❌",
                    None => "",
                };
                lines.push(format!("{}. {}", index + 1, html::escape(&question.context)));
                lines.push(format!("➡️ {}{verdict}", html::escape(shown)));
            }
            None => {
                lines.push(format!("{}. ➡️ {}", index + 1, html::escape(&answer.response)));
            }
        }
    }
    if answers.is_empty() {
        lines.push(String::new());
        lines.push("No recorded answers.".to_owned());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_whole_numbers() {
        assert_eq!(percentage(7, 10), 70);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn percentage_guards_against_an_empty_total() {
        assert_eq!(percentage(3, 0), 0);
        assert_eq!(percentage(3, -1), 0);
    }

    #[test]
    fn messages_follow_the_score_bands() {
        assert_eq!(score_message(100), "Outstanding! 🎉");
        assert_eq!(score_message(90), "Outstanding! 🎉");
        assert_eq!(score_message(89), "Great Job! 👏");
        assert_eq!(score_message(80), "Great Job! 👏");
        assert_eq!(score_message(79), "Good Effort! 👍");
        assert_eq!(score_message(60), "Good Effort! 👍");
        assert_eq!(score_message(59), "Keep Practicing! 💪");
        assert_eq!(score_message(40), "Keep Practicing! 💪");
        assert_eq!(score_message(39), "Try Again! 📚");
        assert_eq!(score_message(0), "Try Again! 📚");
    }

    #[test]
    fn badges_follow_the_colour_bands() {
        assert_eq!(score_badge(80), "🟢");
        assert_eq!(score_badge(79), "🟡");
        assert_eq!(score_badge(60), "🟡");
        assert_eq!(score_badge(59), "🔴");
    }

    #[test]
    fn rendered_result_combines_all_the_pieces() {
        let card = render_result(2, 3, "Capitals <3");

        assert!(card.contains("67%"));
        assert!(card.contains("Good Effort! 👍"));
        assert!(card.contains("🟡"));
        assert!(card.contains("You scored 2 out of 3"));
        assert!(card.contains("Capitals &lt;3"));
    }

    #[test]
    fn breakdown_resolves_option_ids_and_marks_verdicts() {
        let attempt: Attempt = serde_json::from_value(serde_json::json!({
            "id": 900,
            "quiz_id": 7,
            "sore": 1,
            "quiz": {"id": 7, "title": "Capitals of Europe"},
            "answers": [
                {
                    "id": 1, "attempt_id": 900, "question_id": 71, "response": "711",
                    "question": {
                        "id": 71, "quiz_id": 7,
                        "context": "Paris is the capital of France.",
                        "qtype": "true_false",
                        "options": [
                            {"id": 711, "question_id": 71, "content": "True", "correct": true},
                            {"id": 712, "question_id": 71, "content": "False", "correct": false}
                        ]
                    }
                },
                {
                    "id": 2, "attempt_id": 900, "question_id": 72, "response": "Tallinn",
                    "question": {
                        "id": 72, "quiz_id": 7,
                        "context": "Name any Baltic capital.",
                        "qtype": "text"
                    }
                }
            ]
        }))
        .expect("attempt with answers");

        let breakdown = render_attempt_breakdown(&attempt);
        assert!(breakdown.contains("Capitals of Europe"));
        assert!(breakdown.contains("Score: 1"));
        assert!(breakdown.contains("➡️ True ✅"));
        assert!(breakdown.contains("➡️ Tallinn"));
        assert!(!breakdown.contains("Tallinn ✅"));
        assert!(!breakdown.contains("Tallinn ❌"));
    }

    #[test]
    fn breakdown_handles_a_bare_attempt() {
        let attempt: Attempt =
            serde_json::from_value(serde_json::json!({"id": 900, "quiz_id": 7, "score": 0}))
                .expect("bare attempt");

        let breakdown = render_attempt_breakdown(&attempt);
        assert!(breakdown.contains("Your answers"));
        assert!(breakdown.contains("No recorded answers."));
    }
}
