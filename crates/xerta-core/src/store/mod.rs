//! Entity managers: the generic [`Database`](crate::db::Database) calls pinned
//! to the bot's tables and column sets.

pub mod commands;
pub mod jokes;
pub mod users;
