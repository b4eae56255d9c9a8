use anyhow::Result;
use dotenvy::dotenv;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use teloxide::prelude::*;

use linkbot::cli::{Cli, Commands};
#[cfg(unix)]
use linkbot::telegram::spawn_sigterm_handler;
use linkbot::{build_dispatcher, create_bot, setup_bot_commands, HandlerDeps};
use linkcore::core::init_logger;
use linkcore::{derive_code, Lookup, PocketBaseStore, ProfileService, ProfileStore, Settings};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if configuration is incomplete, logging cannot start, or
/// the profile store is unreachable at startup.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    match cli.command {
        Some(Commands::Run) | None => run_bot(load_settings()?).await,
        // Offline: needs only the salt and writes no log file
        Some(Commands::Code { chat_id }) => {
            let salt = Settings::code_salt_from_env()?;
            println!("{}", derive_code(chat_id, &salt));
            Ok(())
        }
        Some(Commands::Lookup { chat_id }) => run_lookup(load_settings()?, chat_id).await,
    }
}

fn load_settings() -> Result<Settings> {
    let settings = Settings::from_env()?;
    init_logger(&settings.log_file_path)?;
    Ok(settings)
}

/// Build the profile service and make sure the store answers.
async fn connect_profiles(settings: &Settings) -> Result<Arc<ProfileService>> {
    let store = PocketBaseStore::from_settings(settings)?;

    if let Err(e) = store.health().await {
        log::error!("Failed to connect to PocketBase at {}: {}", settings.pocketbase_url, e);
        return Err(e.into());
    }
    log::info!(
        "Connected to PocketBase at {} (collection: {})",
        settings.pocketbase_url,
        store.collection()
    );

    let store: Arc<dyn ProfileStore> = Arc::new(store);
    let salt = SecretString::from(settings.code_salt.expose_secret().to_string());
    Ok(Arc::new(ProfileService::new(store, salt)))
}

async fn run_lookup(settings: Settings, chat_id: i64) -> Result<()> {
    let profiles = connect_profiles(&settings).await?;

    match profiles.lookup(chat_id).await {
        Lookup::Found(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        Lookup::Absent => println!("chat {} is not registered", chat_id),
        Lookup::Failure(e) => return Err(e.into()),
    }
    Ok(())
}

async fn run_bot(settings: Settings) -> Result<()> {
    let profiles = connect_profiles(&settings).await?;
    let bot = create_bot(&settings)?;

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let me = bot.get_me().await?;
    log::info!("Starting bot @{} in long polling mode", me.username());

    let deps = HandlerDeps::new(profiles, settings.website_url.clone());

    let mut dispatcher = build_dispatcher(bot, deps);

    #[cfg(unix)]
    {
        if let Err(e) = spawn_sigterm_handler(dispatcher.shutdown_token()) {
            log::warn!("Failed to install SIGTERM handler: {}", e);
        }
    }

    dispatcher.dispatch().await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
