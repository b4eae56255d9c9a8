//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::Settings;
pub use error::{AppError, AppResult};
pub use logging::init_logger;
