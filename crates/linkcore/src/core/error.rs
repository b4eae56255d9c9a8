use thiserror::Error;

/// Centralized error types for the application
///
/// Every failure on the way to the profile store ends up here. Callers on the
/// Telegram side never show these to users; they log them and reply with a
/// generic message.
///
/// # Example
///
/// ```no_run
/// use linkcore::AppError;
///
/// fn report(err: &AppError) {
///     log::error!("Store call failed: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP transport errors (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Store answered with a non-success status
    #[error("Store request failed with status {status}: {message}")]
    HttpStatus {
        status: reqwest::StatusCode,
        message: String,
    },

    /// Unexpected response shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// In-memory store was switched offline
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// True for a store response that means "no such record".
    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::HttpStatus { status, .. } => *status == reqwest::StatusCode::NOT_FOUND,
            _ => false,
        }
    }
}
