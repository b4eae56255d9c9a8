//! Reply templates
//!
//! Everything sent with `ParseMode::Html` escapes user-supplied text first.

use indoc::{formatdoc, indoc};
use linkcore::{ProfileRecord, UniqueCode};
use teloxide::utils::html;

use crate::telegram::keyboards::{GET_INFO, HELP, MY_CODE, VISIT_WEBSITE};

/// Shown whenever the store could not be written or read.
pub const TRY_AGAIN_LATER: &str = "Sorry, there was an error processing your request. Please try again later.";

pub const NOT_REGISTERED: &str = "No information found. Please use /start to register.";

pub const WEBSITE_PROMPT: &str = "Visit our website:";

/// Welcome line sent with the main keyboard. Plain text.
pub fn welcome(first_name: Option<&str>, newly_registered: bool) -> String {
    let name = first_name.filter(|n| !n.is_empty()).unwrap_or("there");
    if newly_registered {
        format!("Welcome, {}! Your unique code has been generated.", name)
    } else {
        format!("Welcome back, {}! Your profile has been refreshed.", name)
    }
}

/// Code message after `/start`. HTML.
pub fn code_issued(code: &UniqueCode) -> String {
    formatdoc! {"
        Your unique code:

        <code>{code}</code>

        Please copy this code and paste it on our website to connect your Telegram account.",
        code = html::escape(code.as_str()),
    }
}

/// Code message for "My code". HTML.
///
/// The code is derived from the chat id, so asking again returns the same
/// value; the wording says so.
pub fn code_repeated(code: &UniqueCode) -> String {
    formatdoc! {"
        Your unique code:

        <code>{code}</code>

        This code stays the same every time you ask. Use it on our website to connect your Telegram account.",
        code = html::escape(code.as_str()),
    }
}

/// Stored profile summary. HTML.
pub fn profile_info(record: &ProfileRecord) -> String {
    let name = record.display_name();
    let name = if name.is_empty() { "-".to_string() } else { html::escape(&name) };
    let username = match record.username.as_deref() {
        Some(u) => format!("@{}", html::escape(u)),
        None => "-".to_string(),
    };

    formatdoc! {"
        Your information:

        Name: {name}
        Username: {username}
        Unique Code: <code>{code}</code>",
        name = name,
        username = username,
        code = html::escape(&record.unique_code),
    }
}

pub fn help() -> String {
    formatdoc! {"
        Available commands:
        {info} - View your saved information
        {website} - Go to our website
        {help} - Show this help message
        {code} - Get your code again

        You can also type /start, /info, /code, /website or /help.",
        info = GET_INFO,
        website = VISIT_WEBSITE,
        help = HELP,
        code = MY_CODE,
    }
}

pub fn unknown_text() -> &'static str {
    indoc! {"
        I didn't understand that.
        Use the keyboard below or send /help to see what I can do."}
}
