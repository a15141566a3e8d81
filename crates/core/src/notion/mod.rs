//! Notion REST client.
//!
//! Only the three endpoints the assistant needs are modelled: create a page,
//! query a database and patch a page. The [`NotionApi`] trait is the seam the
//! todo list and the check-in persister are written against.

pub mod properties;

use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.notion.com/v1";
pub const DEFAULT_API_VERSION: &str = "2022-06-28";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the Notion API.
///
/// A feature is only enabled when both the token and its database id are set.
#[derive(Debug)]
pub struct NotionConfig {
    pub api_token: Option<SecretString>,
    pub wellness_database_id: Option<String>,
    pub todo_database_id: Option<String>,
    pub api_url: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            wellness_database_id: None,
            todo_database_id: None,
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl NotionConfig {
    /// Database id for the todo list, if the todo tools are enabled.
    pub fn todo_database(&self) -> Option<&str> {
        self.api_token.as_ref()?;
        self.todo_database_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Database id for mirrored check-ins, if mirroring is enabled.
    pub fn wellness_database(&self) -> Option<&str> {
        self.api_token.as_ref()?;
        self.wellness_database_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    #[error("request to Notion failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Notion API error: {status} - {body}")]
    Status { status: u16, body: String },
    #[error("unexpected Notion response: {0}")]
    Decode(String),
    #[error("invalid Notion client configuration: {0}")]
    Config(String),
}

/// One page of a database query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotionApi: Send + Sync {
    /// `POST /pages`. Returns the created page.
    async fn create_page(&self, page: Value) -> Result<Value, NotionError>;

    /// `POST /databases/{id}/query`.
    async fn query_database(
        &self,
        database_id: String,
        query: Value,
    ) -> Result<QueryResponse, NotionError>;

    /// `PATCH /pages/{id}`. Returns the updated page.
    async fn update_page(&self, page_id: String, patch: Value) -> Result<Value, NotionError>;
}

/// [`NotionApi`] over HTTPS with `reqwest`.
pub struct NotionClient {
    http: Client,
    api_url: String,
}

impl NotionClient {
    /// Builds a client from the configuration, or `None` when no token is set.
    pub fn from_config(config: &NotionConfig) -> Result<Option<Self>, NotionError> {
        let Some(token) = &config.api_token else {
            return Ok(None);
        };

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| NotionError::Config(format!("token is not a valid header: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "Notion-Version",
            HeaderValue::from_str(&config.api_version)
                .map_err(|e| NotionError::Config(format!("invalid API version: {}", e)))?,
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Some(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        }))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, NotionError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotionError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl NotionApi for NotionClient {
    async fn create_page(&self, page: Value) -> Result<Value, NotionError> {
        let url = format!("{}/pages", self.api_url);
        debug!(%url, "Creating Notion page");
        self.send(self.http.post(url).json(&page)).await
    }

    async fn query_database(
        &self,
        database_id: String,
        query: Value,
    ) -> Result<QueryResponse, NotionError> {
        let url = format!("{}/databases/{}/query", self.api_url, database_id);
        debug!(%url, "Querying Notion database");
        let body = self.send(self.http.post(url).json(&query)).await?;
        serde_json::from_value(body).map_err(|e| NotionError::Decode(e.to_string()))
    }

    async fn update_page(&self, page_id: String, patch: Value) -> Result<Value, NotionError> {
        let url = format!("{}/pages/{}", self.api_url, page_id);
        debug!(%url, "Updating Notion page");
        self.send(self.http.patch(url).json(&patch)).await
    }
}
