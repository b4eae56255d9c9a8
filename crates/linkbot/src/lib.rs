//! linkbot - Telegram bot that links a Telegram account to a website profile
//!
//! The user sends `/start`, the bot stores their profile in PocketBase and
//! answers with a short code to paste on the website.
//!
//! # Module Structure
//!
//! - `cli`: command line interface
//! - `telegram`: bot construction, command set, keyboards, replies, handler tree
//!
//! Domain logic (code derivation, store, upsert) lives in `linkcore`.

pub mod cli;
pub mod telegram;

pub use telegram::{build_dispatcher, create_bot, schema, setup_bot_commands, HandlerDeps};
