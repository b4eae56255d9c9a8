//! Profile upsert and lookup
//!
//! [`ProfileService`] owns the code salt and a store handle. Upserts for the
//! same chat are serialised through a per-chat async mutex so two commands
//! arriving together cannot both see "absent" and create twice. The guard
//! only covers this process; a second bot instance on the same collection
//! would need a unique index on `chatId` in the store. A chat's lock entry is
//! dropped again once no upsert for that chat is running or waiting.

use dashmap::DashMap;
use secrecy::SecretString;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::code::{derive_code, UniqueCode};
use crate::core::error::{AppError, AppResult};
use crate::storage::{ProfileFields, ProfileRecord, ProfileStore};

/// Which branch an upsert took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(UniqueCode),
    Updated(UniqueCode),
}

impl UpsertOutcome {
    pub fn code(&self) -> &UniqueCode {
        match self {
            UpsertOutcome::Created(code) | UpsertOutcome::Updated(code) => code,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, UpsertOutcome::Created(_))
    }
}

/// Result of a read by chat id.
///
/// `Absent` is an expected answer, `Failure` is everything else. Callers
/// must branch on all three.
#[derive(Debug)]
pub enum Lookup {
    Found(ProfileRecord),
    Absent,
    Failure(AppError),
}

pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    salt: SecretString,
    chat_locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>, salt: SecretString) -> Self {
        Self {
            store,
            salt,
            chat_locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }

    /// The code this service would issue for `chat_id`.
    pub fn code_for(&self, chat_id: i64) -> UniqueCode {
        derive_code(chat_id, &self.salt)
    }

    /// Create the chat's profile or refresh its display fields and code.
    ///
    /// # Errors
    /// Any store failure. The cause is logged here; callers only need to tell
    /// the user to try again later.
    #[tracing::instrument(skip(self, fields))]
    pub async fn upsert(&self, chat_id: i64, fields: &ProfileFields) -> AppResult<UpsertOutcome> {
        let lock = self.chat_lock(chat_id);
        let result = {
            let _guard = lock.lock().await;
            self.upsert_locked(chat_id, fields).await
        };
        drop(lock);
        self.release_chat_lock(chat_id);

        if let Err(e) = &result {
            log::error!("Failed to save profile for chat {}: {}", chat_id, e);
        }
        result
    }

    async fn upsert_locked(&self, chat_id: i64, fields: &ProfileFields) -> AppResult<UpsertOutcome> {
        let code = self.code_for(chat_id);

        let existing = match self.store.find_by_chat_id(chat_id).await {
            Ok(found) => found,
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        match existing {
            Some(existing) => {
                self.store.update(&existing.id, fields, &code).await?;
                log::info!("Profile updated for chat {}", chat_id);
                Ok(UpsertOutcome::Updated(code))
            }
            None => {
                self.store.create(chat_id, fields, &code).await?;
                log::info!("Profile created for chat {}", chat_id);
                Ok(UpsertOutcome::Created(code))
            }
        }
    }

    /// Read the chat's profile.
    pub async fn lookup(&self, chat_id: i64) -> Lookup {
        match self.store.find_by_chat_id(chat_id).await {
            Ok(Some(record)) => Lookup::Found(record),
            Ok(None) => Lookup::Absent,
            Err(e) if e.is_not_found() => Lookup::Absent,
            Err(e) => {
                log::error!("Failed to fetch profile for chat {}: {}", chat_id, e);
                Lookup::Failure(e)
            }
        }
    }

    fn chat_lock(&self, chat_id: i64) -> Arc<Mutex<()>> {
        self.chat_locks
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // Drops the entry once no other upsert holds or waits on it. `remove_if`
    // runs under the shard lock that `chat_lock` also takes.
    fn release_chat_lock(&self, chat_id: i64) {
        self.chat_locks.remove_if(&chat_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
