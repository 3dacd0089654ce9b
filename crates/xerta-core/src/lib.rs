//! Core logic for the Xerta chat bot.
//!
//! This crate is framework-agnostic. Telegram lives behind the messaging port
//! (implemented in `xerta-telegram`); MySQL lives behind the database port.

pub mod access;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod db;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod store;

pub use errors::{Error, Result};
