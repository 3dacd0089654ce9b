/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Display fields of the sender, as reported by the chat platform.
///
/// This is what gets upserted into `users` on every public command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

impl UserProfile {
    pub fn new(id: i64, first_name: &str) -> Self {
        Self {
            id: UserId(id),
            username: None,
            first_name: first_name.to_string(),
            last_name: None,
            language_code: None,
        }
    }
}

/// Privilege tier stored on a user row.
pub type Privilege = i64;

pub const PRIVILEGE_ORDINARY: Privilege = 0;
pub const PRIVILEGE_ELEVATED: Privilege = 1;
pub const PRIVILEGE_ADMIN: Privilege = 2;
