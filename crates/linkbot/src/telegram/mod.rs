//! Telegram bot integration and handlers

pub mod bot;
pub mod handlers;
pub mod keyboards;
pub mod replies;

// Re-exports for convenience
pub use bot::{build_dispatcher, create_bot, setup_bot_commands, Command};
#[cfg(unix)]
pub use bot::spawn_sigterm_handler;
pub use handlers::{schema, Action, HandlerDeps, HandlerError};
pub use keyboards::MenuButton;
