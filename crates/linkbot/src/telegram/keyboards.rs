//! Reply and inline keyboards
//!
//! The reply keyboard sends its label back as plain text, so the labels
//! below are also what the text handler matches on.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};
use url::Url;

pub const GET_INFO: &str = "📊 Get my info";
pub const VISIT_WEBSITE: &str = "🌐 Visit website";
pub const HELP: &str = "❓ Help";
pub const MY_CODE: &str = "🔄 My code";

/// A tap on one of the main keyboard buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuButton {
    GetInfo,
    VisitWebsite,
    Help,
    MyCode,
}

impl MenuButton {
    pub fn label(self) -> &'static str {
        match self {
            MenuButton::GetInfo => GET_INFO,
            MenuButton::VisitWebsite => VISIT_WEBSITE,
            MenuButton::Help => HELP,
            MenuButton::MyCode => MY_CODE,
        }
    }

    /// Match incoming text against the button labels.
    ///
    /// Case and surrounding whitespace are ignored; some clients lowercase or
    /// pad keyboard text when the user retypes it.
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        [MenuButton::GetInfo, MenuButton::VisitWebsite, MenuButton::Help, MenuButton::MyCode]
            .into_iter()
            .find(|b| b.label().eq_ignore_ascii_case(text))
    }
}

/// 2x2 main keyboard shown after registration.
pub fn main_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(GET_INFO), KeyboardButton::new(VISIT_WEBSITE)],
        vec![KeyboardButton::new(HELP), KeyboardButton::new(MY_CODE)],
    ])
    .resize_keyboard()
}

/// Single URL button to the website.
pub fn website_keyboard(url: &Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url("Go to website", url.clone())]])
}
