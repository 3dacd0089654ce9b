//! Telegram update handlers.
//!
//! Decodes a teloxide `Message` into an `Invocation` and hands it to
//! `BotService`. Failures are logged and end handling of that one message.

use std::sync::Arc;

use teloxide::{prelude::*, types::User};
use tracing::{debug, error};

use xerta_core::{
    commands::Invocation,
    domain::{ChatId, UserId, UserProfile},
};

use crate::router::AppState;

mod commands;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let Some(command) = commands::route(text, &state.bot_username) else {
        debug!(user_id = user.id.0, text, "ignoring command");
        return Ok(());
    };

    let inv = Invocation {
        chat_id: ChatId(msg.chat.id.0),
        caller: profile_of(user),
        command,
    };

    if let Err(e) = state.service.handle(inv).await {
        error!(
            user_id = user.id.0,
            command = command.log_name(),
            "command failed: {e}"
        );
    }

    Ok(())
}

fn profile_of(user: &User) -> UserProfile {
    UserProfile {
        id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        language_code: user.language_code.clone(),
    }
}
