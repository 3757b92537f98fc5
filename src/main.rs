use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::error_handlers::IgnoringErrorHandlerSafe;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::level_filters;
use tracing_subscriber::fmt::format::FmtSpan;
use url::Url;

use quiztakerbot::api::client::{ApiClient, Identity, DEFAULT_API_URL};
use quiztakerbot::schema::schema;
use quiztakerbot::state::QuizState;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let rust_log = std::env::var("LOG_LEVEL").unwrap_or("info".into());
    tracing_subscriber::fmt()
        .with_max_level(level_filters::LevelFilter::from_level(
            rust_log.parse().expect("LOG_LEVEL should be a valid level."),
        ))
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_ansi(true)
        .with_line_number(true)
        .with_target(false)
        .init();

    let api_url = std::env::var("QUIZ_API_URL")
        .unwrap_or_else(|_| DEFAULT_API_URL.into())
        .parse::<Url>()
        .expect("QUIZ_API_URL can't be parsed.");
    let api = Arc::new(ApiClient::new(api_url));
    let identity = Identity::from_env();

    let teloxide_token = std::env::var("TELOXIDE_TOKEN").expect("TELOXIDE_TOKEN should be set.");
    let bot = Bot::new(teloxide_token);
    log::info!("Starting quiz taker bot...");

    let webhook_url = std::env::var("WEBHOOK_URL")
        .map(|d| d.parse::<Url>().expect("WEBHOOK_URL can't be parsed."))
        .ok();
    let webhook_addr = std::env::var("WEBHOOK_ADDR")
        .map(|d| d.parse::<SocketAddr>().expect("WEBHOOK_ADDR can't be parsed."))
        .ok();

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![InMemStorage::<QuizState>::new(), api, identity])
        .enable_ctrlc_handler()
        .build();

    if let (Some(webhook_url), Some(webhook_addr)) = (webhook_url, webhook_addr) {
        let listener = webhooks::axum(bot, Options::new(webhook_addr, webhook_url))
            .await
            .expect("Failed to build a listener.");
        dispatcher
            .dispatch_with_listener(listener, Arc::new(IgnoringErrorHandlerSafe))
            .await
    } else {
        dispatcher.dispatch().await
    }
}
