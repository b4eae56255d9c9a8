//! Profile records and the stores that hold them
//!
//! The store is an external collaborator. This module only needs three
//! operations from it (exact-match lookup by chat id, create, update) plus a
//! health check used at startup.

pub mod memory;
pub mod pocketbase;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::code::UniqueCode;
use crate::core::AppResult;

pub use memory::MemoryStore;
pub use pocketbase::PocketBaseStore;

/// One profile per Telegram chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    /// Store-assigned record id
    pub id: String,
    #[serde(deserialize_with = "chat_id_from_number_or_string")]
    pub chat_id: i64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub unique_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

impl ProfileRecord {
    /// "First Last", skipping whichever part is missing.
    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Display attributes supplied by Telegram on every command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl ProfileFields {
    pub fn new(first_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            ..Self::default()
        }
    }
}

/// Body sent on create and update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecordPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub username: Option<&'a str>,
    pub unique_code: &'a str,
}

impl<'a> RecordPayload<'a> {
    pub(crate) fn new(chat_id: Option<i64>, fields: &'a ProfileFields, code: &'a UniqueCode) -> Self {
        Self {
            chat_id,
            first_name: fields.first_name.as_deref(),
            last_name: fields.last_name.as_deref(),
            username: fields.username.as_deref(),
            unique_code: code.as_str(),
        }
    }
}

/// Store boundary used by the profile service.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Probe the store; used once at startup.
    async fn health(&self) -> AppResult<()>;

    /// First record whose `chatId` equals `chat_id`. "Not found" is `Ok(None)`.
    async fn find_by_chat_id(&self, chat_id: i64) -> AppResult<Option<ProfileRecord>>;

    async fn create(&self, chat_id: i64, fields: &ProfileFields, code: &UniqueCode) -> AppResult<ProfileRecord>;

    async fn update(&self, id: &str, fields: &ProfileFields, code: &UniqueCode) -> AppResult<ProfileRecord>;
}

// PocketBase returns "" for unset text fields.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

// `chatId` may be a number or a text column depending on the collection schema.
fn chat_id_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Float(f) if f.fract() == 0.0 => Ok(f as i64),
        Raw::Float(f) => Err(serde::de::Error::custom(format!("chatId is not an integer: {}", f))),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("chatId is not an integer: {:?}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_record_from_pocketbase_json() {
        let record: ProfileRecord = serde_json::from_value(json!({
            "id": "r1a2b3c4d5e6f7g",
            "collectionId": "pbc_123",
            "collectionName": "tele_users",
            "chatId": 42,
            "firstName": "Ann",
            "lastName": "",
            "username": "ann",
            "uniqueCode": "73475cb40a",
            "created": "2024-05-01 10:00:00.000Z",
            "updated": "2024-05-01 10:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(record.chat_id, 42);
        assert_eq!(record.first_name.as_deref(), Some("Ann"));
        assert_eq!(record.last_name, None);
        assert_eq!(record.username.as_deref(), Some("ann"));
        assert_eq!(record.display_name(), "Ann");
    }

    #[test]
    fn test_chat_id_stored_as_text() {
        let record: ProfileRecord =
            serde_json::from_value(json!({"id": "x", "chatId": "-1001234567890", "uniqueCode": "abc"})).unwrap();
        assert_eq!(record.chat_id, -1001234567890);
        assert_eq!(record.first_name, None);
    }

    #[test]
    fn test_chat_id_garbage_is_rejected() {
        let result = serde_json::from_value::<ProfileRecord>(json!({"id": "x", "chatId": "abc"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_payload_shape() {
        let fields = ProfileFields {
            first_name: Some("Ann".into()),
            last_name: None,
            username: Some("ann".into()),
        };
        let code = crate::code::derive_code(42, &secrecy::SecretString::from("".to_string()));

        let create = serde_json::to_value(RecordPayload::new(Some(42), &fields, &code)).unwrap();
        assert_eq!(
            create,
            json!({"chatId": 42, "firstName": "Ann", "lastName": null, "username": "ann", "uniqueCode": "73475cb40a"})
        );

        let update = serde_json::to_value(RecordPayload::new(None, &fields, &code)).unwrap();
        assert!(update.get("chatId").is_none());
    }

    #[test]
    fn test_display_name_joins_parts() {
        let record = ProfileRecord {
            id: "x".into(),
            chat_id: 1,
            first_name: Some("Ann".into()),
            last_name: Some("Lee".into()),
            username: None,
            unique_code: String::new(),
            created: None,
            updated: None,
        };
        assert_eq!(record.display_name(), "Ann Lee");
    }
}
