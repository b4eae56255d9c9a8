//! Telegram bot handler tree configuration
//!
//! Commands and keyboard buttons both map onto an [`Action`], so `/code` and
//! the "My code" button run the same code path. The same schema is used in
//! production and can be driven from integration tests.

use std::sync::Arc;

use linkcore::{Lookup, ProfileFields, ProfileService};
use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode, User};
use url::Url;

use crate::telegram::bot::Command;
use crate::telegram::keyboards::{main_keyboard, website_keyboard, MenuButton};
use crate::telegram::replies;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub profiles: Arc<ProfileService>,
    pub website_url: Url,
}

impl HandlerDeps {
    pub fn new(profiles: Arc<ProfileService>, website_url: Url) -> Self {
        Self { profiles, website_url }
    }
}

/// What the user asked for, whichever way they asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Save the profile and hand out the code with a welcome
    Register,
    /// Save the profile and repeat the code
    ShowCode,
    ShowInfo,
    Website,
    Help,
}

impl From<Command> for Action {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Start => Action::Register,
            Command::Code => Action::ShowCode,
            Command::Info => Action::ShowInfo,
            Command::Website => Action::Website,
            Command::Help => Action::Help,
        }
    }
}

impl From<MenuButton> for Action {
    fn from(button: MenuButton) -> Self {
        match button {
            MenuButton::MyCode => Action::ShowCode,
            MenuButton::GetInfo => Action::ShowInfo,
            MenuButton::VisitWebsite => Action::Website,
            MenuButton::Help => Action::Help,
        }
    }
}

/// Display fields carried by the sender of a message.
pub fn profile_fields(user: Option<&User>) -> ProfileFields {
    match user {
        Some(user) => ProfileFields {
            first_name: Some(user.first_name.clone()).filter(|n| !n.is_empty()),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
        },
        None => ProfileFields::default(),
    }
}

/// Creates the main dispatcher schema for the Telegram bot.
///
/// # Arguments
/// * `deps` - Handler dependencies (profile service, website URL)
///
/// # Returns
/// The complete handler tree for the bot
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_buttons = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(menu_button_handler(deps_buttons))
        .branch(unknown_text_handler())
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command {:?} from chat {}", cmd, msg.chat.id);
                handle_action(&bot, &msg, Action::from(cmd), &deps).await
            }
        })
}

fn menu_button_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| msg.text().and_then(MenuButton::from_text))
        .endpoint(move |bot: Bot, msg: Message, button: MenuButton| {
            let deps = deps.clone();
            async move {
                log::info!("Received button {:?} from chat {}", button, msg.chat.id);
                handle_action(&bot, &msg, Action::from(button), &deps).await
            }
        })
}

// Groups get plenty of text not meant for the bot; only nudge in private chats.
fn unknown_text_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.chat.is_private() && msg.text().is_some())
        .endpoint(reply_unknown_text)
}

async fn reply_unknown_text(bot: Bot, msg: Message) -> Result<(), HandlerError> {
    log::debug!("Unrecognised text from chat {}", msg.chat.id);
    bot.send_message(msg.chat.id, replies::unknown_text()).await?;
    Ok(())
}

/// Run one action for the chat the message came from.
///
/// Store failures are answered with a generic message; only Telegram send
/// failures are returned as errors.
pub async fn handle_action(bot: &Bot, msg: &Message, action: Action, deps: &HandlerDeps) -> Result<(), HandlerError> {
    match action {
        Action::Register => register(bot, msg, deps).await,
        Action::ShowCode => show_code(bot, msg, deps).await,
        Action::ShowInfo => show_info(bot, msg, deps).await,
        Action::Website => {
            bot.send_message(msg.chat.id, replies::WEBSITE_PROMPT)
                .reply_markup(website_keyboard(&deps.website_url))
                .await?;
            Ok(())
        }
        Action::Help => {
            bot.send_message(msg.chat.id, replies::help())
                .reply_markup(main_keyboard())
                .await?;
            Ok(())
        }
    }
}

async fn register(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let fields = profile_fields(msg.from.as_ref());

    let outcome = match deps.profiles.upsert(msg.chat.id.0, &fields).await {
        Ok(outcome) => outcome,
        Err(_) => {
            bot.send_message(msg.chat.id, replies::TRY_AGAIN_LATER).await?;
            return Ok(());
        }
    };

    bot.send_message(
        msg.chat.id,
        replies::welcome(fields.first_name.as_deref(), outcome.is_created()),
    )
    .reply_markup(main_keyboard())
    .await?;

    // Separate message so the code is easy to copy
    bot.send_message(msg.chat.id, replies::code_issued(outcome.code()))
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

async fn show_code(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let fields = profile_fields(msg.from.as_ref());

    match deps.profiles.upsert(msg.chat.id.0, &fields).await {
        Ok(outcome) => {
            bot.send_message(msg.chat.id, replies::code_repeated(outcome.code()))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Err(_) => {
            bot.send_message(msg.chat.id, replies::TRY_AGAIN_LATER).await?;
        }
    }

    Ok(())
}

async fn show_info(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    match deps.profiles.lookup(msg.chat.id.0).await {
        Lookup::Found(record) => {
            bot.send_message(msg.chat.id, replies::profile_info(&record))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Lookup::Absent => {
            bot.send_message(msg.chat.id, replies::NOT_REGISTERED).await?;
        }
        Lookup::Failure(_) => {
            bot.send_message(msg.chat.id, replies::TRY_AGAIN_LATER).await?;
        }
    }

    Ok(())
}
