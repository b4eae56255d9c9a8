//! Bot initialization and command definitions

use linkcore::core::config;
use linkcore::Settings;
use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use teloxide::dispatching::DefaultKey;
#[cfg(unix)]
use teloxide::dispatching::ShutdownToken;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::telegram::handlers::{schema, HandlerDeps, HandlerError};

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "register and get your unique code")]
    Start,
    #[command(description = "show this help message")]
    Help,
    #[command(description = "view your saved information")]
    Info,
    #[command(description = "get your unique code again")]
    Code,
    #[command(description = "open the website")]
    Website,
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to build the HTTP client
pub fn create_bot(settings: &Settings) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(settings.bot_token.expose_secret(), client);

    let bot = match &settings.bot_api_url {
        Some(url) => {
            log::info!("Using custom Bot API URL: {}", url);
            bot.set_api_url(url.clone())
        }
        None => bot,
    };

    Ok(bot)
}

/// Publishes the command list shown in the Telegram UI
///
/// # Returns
/// * `Ok(())` - Commands set successfully
/// * `Err(RequestError)` - Failed to set commands
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

/// Builds the long-polling dispatcher around [`schema`]. Ctrl-C stops it.
pub fn build_dispatcher(bot: Bot, deps: HandlerDeps) -> Dispatcher<Bot, HandlerError, DefaultKey> {
    Dispatcher::builder(bot, schema(deps))
        .error_handler(LoggingErrorHandler::with_custom_text("An error has occurred in the dispatcher"))
        .enable_ctrlc_handler()
        .build()
}

/// Stops the dispatcher behind `token` on SIGTERM, the way ctrl-c does.
///
/// The signal handler is installed before this returns. A SIGTERM that
/// arrives while the dispatcher is not running is logged and ignored.
#[cfg(unix)]
pub fn spawn_sigterm_handler(token: ShutdownToken) -> std::io::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    Ok(tokio::spawn(async move {
        while terminate.recv().await.is_some() {
            log::info!("SIGTERM received, shutting down the dispatcher");
            match token.shutdown() {
                Ok(done) => {
                    done.await;
                    break;
                }
                Err(_) => log::warn!("Dispatcher is not running, ignoring SIGTERM"),
            }
        }
    }))
}
