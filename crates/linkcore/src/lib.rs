//! linkcore - account-linking core for the linkbot Telegram bot
//!
//! Everything here is free of Telegram types so it can be reused by the
//! bot binary, operator tooling, and tests alike.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging
//! - `code`: deterministic unique-code derivation
//! - `storage`: profile record model and store backends (PocketBase, in-memory)
//! - `profile`: upsert and lookup on top of a store

pub mod code;
pub mod core;
pub mod profile;
pub mod storage;

pub use code::{derive_code, UniqueCode};
pub use crate::core::{AppError, AppResult, Settings};
pub use profile::{Lookup, ProfileService, UpsertOutcome};
pub use storage::{MemoryStore, PocketBaseStore, ProfileFields, ProfileRecord, ProfileStore};
