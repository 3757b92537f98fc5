use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Message, ReplyMarkup},
    utils::command::BotCommands,
    Bot,
};
use tracing::instrument;

use crate::{
    api::client::ListQuizzes, listing::send_quiz_list, state::QuizState, HandlerResult,
    UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "browse the available quizzes.")]
    Start,
    #[command(description = "abandon the current quiz.")]
    Cancel,
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, client))]
pub(crate) async fn start<C: ListQuizzes>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    client: Arc<C>,
) -> HandlerResult {
    send_quiz_list(&bot, msg.chat.id, &dialogue, client.as_ref()).await
}

pub(crate) async fn cancel(bot: Bot, dialogue: UserDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Cancelling. Send /start to browse quizzes.")
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;
    dialogue.update(QuizState::Start).await?;
    Ok(())
}
