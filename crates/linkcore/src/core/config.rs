use secrecy::SecretString;
use std::env;
use std::time::Duration;
use url::Url;

use crate::core::error::{AppError, AppResult};

/// Default PocketBase collection holding Telegram profiles
pub const DEFAULT_COLLECTION: &str = "tele_users";

/// Default page the "Visit website" button opens
pub const DEFAULT_WEBSITE_URL: &str = "https://redruby.one/account/profile";

/// Default log file path
pub const DEFAULT_LOG_FILE_PATH: &str = "linkbot.log";

/// Process configuration, read once at startup.
///
/// Values come from the environment (after `.env` has been loaded by the
/// binary). Secrets are wrapped in [`SecretString`] so they never end up in
/// `Debug` output or logs.
#[derive(Debug)]
pub struct Settings {
    /// Bot token. Read from BOT_TOKEN or TELOXIDE_TOKEN
    pub bot_token: SecretString,
    /// Custom Bot API server. Read from BOT_API_URL
    pub bot_api_url: Option<Url>,
    /// Salt mixed into every unique code. Read from UNIQUE_CODE_SALT
    pub code_salt: SecretString,
    /// PocketBase base URL. Read from POCKETBASE_URL
    pub pocketbase_url: Url,
    /// Optional PocketBase auth token. Read from POCKETBASE_TOKEN
    pub pocketbase_token: Option<SecretString>,
    /// Profile collection name. Read from POCKETBASE_COLLECTION
    pub collection: String,
    /// Website the user pastes the code into. Read from WEBSITE_URL
    pub website_url: Url,
    /// Log file path. Read from LOG_FILE_PATH
    pub log_file_path: String,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    ///
    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| AppError::Config(format!("{} is not set", key)));

        let bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELOXIDE_TOKEN"))
            .ok_or_else(|| AppError::Config("BOT_TOKEN is not set".to_string()))?;
        let code_salt = Self::code_salt_from_lookup(&lookup)?;

        let pocketbase_url = Url::parse(&required("POCKETBASE_URL")?)
            .map_err(|e| AppError::Config(format!("Invalid POCKETBASE_URL: {}", e)))?;

        let bot_api_url = get("BOT_API_URL")
            .map(|raw| Url::parse(&raw))
            .transpose()
            .map_err(|e| AppError::Config(format!("Invalid BOT_API_URL: {}", e)))?;

        let website_url = get("WEBSITE_URL").unwrap_or_else(|| DEFAULT_WEBSITE_URL.to_string());
        let website_url =
            Url::parse(&website_url).map_err(|e| AppError::Config(format!("Invalid WEBSITE_URL: {}", e)))?;

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            bot_api_url,
            code_salt,
            pocketbase_url,
            pocketbase_token: get("POCKETBASE_TOKEN").map(SecretString::from),
            collection: get("POCKETBASE_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            website_url,
            log_file_path: get("LOG_FILE_PATH").unwrap_or_else(|| DEFAULT_LOG_FILE_PATH.to_string()),
        })
    }

    /// Read only the code salt, for tools that derive codes offline.
    pub fn code_salt_from_env() -> AppResult<SecretString> {
        Self::code_salt_from_lookup(|key| env::var(key).ok())
    }

    pub fn code_salt_from_lookup<F>(lookup: F) -> AppResult<SecretString>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup("UNIQUE_CODE_SALT")
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| AppError::Config("UNIQUE_CODE_SALT is not set".to_string()))
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for store and Telegram HTTP calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
