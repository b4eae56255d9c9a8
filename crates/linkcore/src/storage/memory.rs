//! In-memory profile store
//!
//! Behaves like a PocketBase collection without a unique index on `chatId`:
//! nothing stops two records for one chat if callers race. Every operation
//! yields to the scheduler first, like a network round trip would, and the
//! store can be switched offline to simulate an outage.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{ProfileFields, ProfileRecord, ProfileStore};
use crate::code::UniqueCode;
use crate::core::error::{AppError, AppResult};

#[derive(Default)]
struct Inner {
    records: Vec<ProfileRecord>,
    next_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store going down (`true`) or coming back (`false`).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Snapshot of every record in insertion order.
    pub async fn records(&self) -> Vec<ProfileRecord> {
        self.inner.read().await.records.clone()
    }

    pub async fn count_for_chat(&self, chat_id: i64) -> usize {
        self.inner
            .read()
            .await
            .records
            .iter()
            .filter(|r| r.chat_id == chat_id)
            .count()
    }

    async fn round_trip(&self) -> AppResult<()> {
        tokio::task::yield_now().await;
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

fn apply(record: &mut ProfileRecord, fields: &ProfileFields, code: &UniqueCode) {
    record.first_name = fields.first_name.clone();
    record.last_name = fields.last_name.clone();
    record.username = fields.username.clone();
    record.unique_code = code.as_str().to_string();
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn health(&self) -> AppResult<()> {
        self.round_trip().await
    }

    async fn find_by_chat_id(&self, chat_id: i64) -> AppResult<Option<ProfileRecord>> {
        self.round_trip().await?;
        let inner = self.inner.read().await;
        Ok(inner.records.iter().find(|r| r.chat_id == chat_id).cloned())
    }

    async fn create(&self, chat_id: i64, fields: &ProfileFields, code: &UniqueCode) -> AppResult<ProfileRecord> {
        self.round_trip().await?;
        let mut inner = self.inner.write().await;
        inner.next_id += 1;

        let mut record = ProfileRecord {
            id: format!("mem{:012}", inner.next_id),
            chat_id,
            first_name: None,
            last_name: None,
            username: None,
            unique_code: String::new(),
            created: None,
            updated: None,
        };
        apply(&mut record, fields, code);
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, fields: &ProfileFields, code: &UniqueCode) -> AppResult<ProfileRecord> {
        self.round_trip().await?;
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::HttpStatus {
                status: reqwest::StatusCode::NOT_FOUND,
                message: format!("record {} not found", id),
            })?;
        apply(record, fields, code);
        Ok(record.clone())
    }
}
