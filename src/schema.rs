use std::error::Error;

use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        DpHandlerDescription, UpdateFilterExt, UpdateHandler,
    },
    dptree::{self, Handler},
    prelude::{DependencyMap, Requester},
    types::{Message, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    api::client::ApiClient,
    commands::{cancel, help, start, Command},
    listing, results, runner,
    state::QuizState,
    HandlerResult,
};

pub fn schema() -> UpdateHandler<Box<dyn Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start::<ApiClient>))
        .branch(case![Command::Cancel].endpoint(cancel));

    let handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![QuizState::Start].endpoint(listing::show_quizzes::<ApiClient>))
        .branch(taking_scheme())
        .branch(
            case![QuizState::Finished {
                attempt_id,
                score,
                total,
                quiz_title
            }]
            .endpoint(results::show_result_again),
        )
        .endpoint(invalid_state);

    dialogue::enter::<Update, InMemStorage<QuizState>, QuizState, _>()
        .branch(handler)
        .branch(callback_query_scheme())
}

#[instrument(level = "debug")]
fn taking_scheme() -> Handler<
    'static,
    DependencyMap,
    Result<(), Box<(dyn Error + Send + Sync + 'static)>>,
    DpHandlerDescription,
> {
    use dptree::case;
    Update::filter_message()
        .branch(case![QuizState::AwaitingStart { quiz }].endpoint(runner::confirm_start::<ApiClient>))
        .branch(
            case![QuizState::Answering {
                quiz,
                current,
                answers
            }]
            .endpoint(runner::take_text_answer),
        )
        .branch(case![QuizState::Reviewing { quiz, answers }].endpoint(runner::review_nudge))
}

#[instrument(level = "debug")]
fn callback_query_scheme() -> Handler<
    'static,
    DependencyMap,
    Result<(), Box<(dyn Error + Send + Sync + 'static)>>,
    DpHandlerDescription,
> {
    use dptree::case;

    Update::filter_callback_query()
        .branch(case![QuizState::Browsing].endpoint(listing::pick_quiz::<ApiClient>))
        // The list keyboard is still live while a ready prompt is open.
        .branch(case![QuizState::AwaitingStart { quiz }].endpoint(listing::pick_quiz::<ApiClient>))
        .branch(
            case![QuizState::Answering {
                quiz,
                current,
                answers
            }]
            .endpoint(runner::take_option),
        )
        .branch(
            case![QuizState::Reviewing { quiz, answers }]
                .endpoint(runner::review_action::<ApiClient>),
        )
        .branch(
            case![QuizState::Finished {
                attempt_id,
                score,
                total,
                quiz_title
            }]
            .endpoint(results::result_action::<ApiClient>),
        )
}

#[instrument(level = "info")]
async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "Unable to handle the message. Enter /help to see usages.",
    )
    .await?;
    Ok(())
}
