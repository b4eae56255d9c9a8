//! PocketBase REST backend
//!
//! Talks to the records API of a single collection:
//!
//! - `GET    /api/health`
//! - `GET    /api/collections/{collection}/records?filter=chatId="..."`
//! - `POST   /api/collections/{collection}/records`
//! - `PATCH  /api/collections/{collection}/records/{id}`

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::{ProfileFields, ProfileRecord, ProfileStore, RecordPayload};
use crate::code::UniqueCode;
use crate::core::config::{self, Settings};
use crate::core::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct ListPage<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Profile store backed by a PocketBase collection.
pub struct PocketBaseStore {
    client: Client,
    base_url: Url,
    collection: String,
    token: Option<SecretString>,
}

impl PocketBaseStore {
    /// Creates a store with its own HTTP client.
    ///
    /// # Errors
    /// Fails if the URL cannot carry a path or the HTTP client cannot be built.
    pub fn new(base_url: Url, collection: impl Into<String>) -> AppResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!("POCKETBASE_URL cannot be a base: {}", base_url)));
        }
        let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;

        Ok(Self {
            client,
            base_url,
            collection: collection.into(),
            token: None,
        })
    }

    /// Sends `token` as the `Authorization` header on every request.
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        let store = Self::new(settings.pocketbase_url.clone(), settings.collection.clone())?;
        Ok(match &settings.pocketbase_token {
            Some(token) => store.with_token(SecretString::from(token.expose_secret().to_string())),
            None => store,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("POCKETBASE_URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn records_endpoint(&self, id: Option<&str>) -> AppResult<Url> {
        match id {
            Some(id) => self.endpoint(&["api", "collections", self.collection.as_str(), "records", id]),
            None => self.endpoint(&["api", "collections", self.collection.as_str(), "records"]),
        }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, token.expose_secret()),
            None => builder,
        }
    }
}

/// Turns a non-success response into `AppError::HttpStatus`, keeping the
/// store's own message when it sent one.
async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) if !parsed.message.is_empty() => parsed.message,
        _ => body,
    };
    Err(AppError::HttpStatus { status, message })
}

/// Exact-match filter on `chatId`. Quoted so it matches both number and text
/// columns.
fn chat_id_filter(chat_id: i64) -> String {
    format!("chatId=\"{}\"", chat_id)
}

async fn decode<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl ProfileStore for PocketBaseStore {
    async fn health(&self) -> AppResult<()> {
        let url = self.endpoint(&["api", "health"])?;
        let response = self.request(Method::GET, url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn find_by_chat_id(&self, chat_id: i64) -> AppResult<Option<ProfileRecord>> {
        let url = self.records_endpoint(None)?;
        let filter = chat_id_filter(chat_id);

        let response = self
            .request(Method::GET, url)
            .query(&[("page", "1"), ("perPage", "1"), ("skipTotal", "1"), ("filter", filter.as_str())])
            .send()
            .await?;

        let response = match check_status(response).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let page: ListPage<ProfileRecord> = decode(response).await?;
        Ok(page.items.into_iter().next())
    }

    async fn create(&self, chat_id: i64, fields: &ProfileFields, code: &UniqueCode) -> AppResult<ProfileRecord> {
        let url = self.records_endpoint(None)?;
        let response = self
            .request(Method::POST, url)
            .json(&RecordPayload::new(Some(chat_id), fields, code))
            .send()
            .await?;
        decode(check_status(response).await?).await
    }

    async fn update(&self, id: &str, fields: &ProfileFields, code: &UniqueCode) -> AppResult<ProfileRecord> {
        let url = self.records_endpoint(Some(id))?;
        let response = self
            .request(Method::PATCH, url)
            .json(&RecordPayload::new(None, fields, code))
            .send()
            .await?;
        decode(check_status(response).await?).await
    }
}
