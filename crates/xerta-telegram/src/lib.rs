//! Telegram adapter (teloxide).
//!
//! Implements the `xerta-core` messaging port over the Telegram Bot API and
//! routes inbound updates to `BotService`.

use async_trait::async_trait;

use teloxide::prelude::*;

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use xerta_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::port::{split_text_chunks, MessagingCapabilities, MessagingPort},
    Result,
};

/// Telegram's hard limit for a single text message.
const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        tracing::warn!(?d, "telegram flood control, retrying");
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: TELEGRAM_MESSAGE_LIMIT,
        }
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        if text.trim().is_empty() {
            return Err(Error::External("refusing to send an empty message".to_string()));
        }

        let mut last = None;
        for chunk in split_text_chunks(text, self.capabilities().max_message_len) {
            let msg = self
                .with_retry(|| self.bot.send_message(Self::tg_chat(chat_id), chunk.clone()))
                .await?;
            last = Some(MessageRef {
                chat_id,
                message_id: MessageId(msg.id.0),
            });
        }

        last.ok_or_else(|| Error::External("nothing to send".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_text_is_rejected_before_any_request() {
        let messenger = TelegramMessenger::new(Bot::new("123:test-token"));

        for text in ["", "  \n "] {
            let err = messenger.send_text(ChatId(1), text).await.unwrap_err();
            assert!(err.to_string().contains("empty message"), "{err}");
        }
    }
}
