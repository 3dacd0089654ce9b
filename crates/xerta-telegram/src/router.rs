use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::info;

use xerta_core::{
    commands::BotService, config::Config, db::Connector, messaging::port::MessagingPort,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BotService>,
    /// Own username, without `@`; commands mentioning another bot are dropped.
    pub bot_username: String,
}

pub async fn run_polling(cfg: Arc<Config>, connector: Arc<dyn Connector>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = bot.get_me().await?;
    let bot_username = me.username().to_string();
    info!("xerta started: @{bot_username}");
    info!(
        database = %cfg.database.database,
        host = %cfg.database.host,
        "using mysql"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let service = Arc::new(BotService::new(
        connector,
        messenger,
        cfg.start_message_path.clone(),
    ));

    let state = Arc::new(AppState {
        service,
        bot_username,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    info!("dispatcher stopped");
    Ok(())
}
