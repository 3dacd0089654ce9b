//! Command handlers and the pipeline that runs them.
//!
//! For every invocation [`BotService::handle`] runs, in order:
//! 1. the access gate of the command ([`access::check`]);
//! 2. the command log (`commands` table);
//! 3. the handler itself, whose reply is sent back to the chat.
//!
//! A denied call stops after step 1 and is not logged. Each step opens its
//! own database connection.

use std::{path::PathBuf, sync::Arc};

use tracing::{debug, info};

use crate::{
    access::{self, Access, Gate},
    db::{self, Connector},
    domain::{ChatId, UserProfile, PRIVILEGE_ORDINARY},
    messaging::port::MessagingPort,
    store::{self, users::User},
    Result,
};

pub const MESSAGE_REPLY: &str = "Jajaja, you are very funny.";
pub const NO_JOKES_REPLY: &str = "No jokes yet, come back later.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Joke,
    Users,
    /// Any non-command text.
    Message,
}

impl BotCommand {
    /// Map a slash-command name (without `/`) to a handler.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "joke" => Some(Self::Joke),
            "users" => Some(Self::Users),
            _ => None,
        }
    }

    /// Name recorded in the command log. `/help` shares the `/start` handler.
    pub fn log_name(self) -> &'static str {
        match self {
            Self::Start | Self::Help => "start",
            Self::Joke => "joke",
            Self::Users => "users",
            Self::Message => "message",
        }
    }

    pub fn access(self) -> Access {
        match self {
            Self::Users => Access::Restricted,
            Self::Start | Self::Help | Self::Joke | Self::Message => Access::Public,
        }
    }
}

/// One inbound command, already decoded from the transport.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub chat_id: ChatId,
    pub caller: UserProfile,
    pub command: BotCommand,
}

pub struct BotService {
    connector: Arc<dyn Connector>,
    messenger: Arc<dyn MessagingPort>,
    start_message_path: PathBuf,
}

impl BotService {
    pub fn new(
        connector: Arc<dyn Connector>,
        messenger: Arc<dyn MessagingPort>,
        start_message_path: PathBuf,
    ) -> Self {
        Self {
            connector,
            messenger,
            start_message_path,
        }
    }

    pub async fn handle(&self, inv: Invocation) -> Result<()> {
        let Invocation {
            chat_id,
            caller,
            command,
        } = inv;
        debug!(user_id = caller.id.0, command = command.log_name(), "dispatch");

        let mut conn = self.connector.connect().await?;
        let gate = access::check(conn.as_mut(), command.access(), &caller).await;
        db::release(conn).await;
        if let Gate::Denied(reply) = gate? {
            self.messenger.send_text(chat_id, reply).await?;
            return Ok(());
        }

        let mut conn = self.connector.connect().await?;
        let logged =
            store::commands::insert_command(conn.as_mut(), caller.id, command.log_name()).await;
        db::release(conn).await;
        logged?;

        let reply = self.run(command).await?;
        self.messenger.send_text(chat_id, &reply).await?;
        Ok(())
    }

    async fn run(&self, command: BotCommand) -> Result<String> {
        match command {
            BotCommand::Start | BotCommand::Help => self.start().await,
            BotCommand::Joke => self.joke().await,
            BotCommand::Users => self.users().await,
            BotCommand::Message => Ok(MESSAGE_REPLY.to_string()),
        }
    }

    /// Greeting text, read from disk on every call.
    async fn start(&self) -> Result<String> {
        Ok(tokio::fs::read_to_string(&self.start_message_path).await?)
    }

    async fn joke(&self) -> Result<String> {
        let mut conn = self.connector.connect().await?;
        let joke = store::jokes::random_joke(conn.as_mut()).await;
        db::release(conn).await;
        match joke? {
            Some(joke) => Ok(joke),
            None => {
                info!("joke requested but the jokes table is empty");
                Ok(NO_JOKES_REPLY.to_string())
            }
        }
    }

    async fn users(&self) -> Result<String> {
        let mut conn = self.connector.connect().await?;
        let users = store::users::list_users(conn.as_mut(), Some(PRIVILEGE_ORDINARY)).await;
        db::release(conn).await;
        Ok(format_users_reply(&users?))
    }
}

/// `"Users connected: \n"` followed by one full name per line.
///
/// Users missing a first or last name are left out.
pub fn format_users_reply(users: &[User]) -> String {
    let names = users
        .iter()
        .filter_map(User::full_name)
        .collect::<Vec<_>>()
        .join("\n");
    format!("Users connected: \n{names}")
}
