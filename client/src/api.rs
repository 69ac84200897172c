//! The server API surface as seen from the client.
//!
//! [`TodoApi`] is the seam the cache layer mutates through; production
//! uses the reqwest-backed [`HttpTodoApi`], tests script a mock.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tasklist_store::{Todo, UpdateTodo};
use thiserror::Error;

/// Errors surfaced by API calls.
///
/// Failures are reported to the caller after the cache rolls back; the
/// client never retries automatically.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with a failure envelope.
    #[error("api error [{code}]: {message}")]
    Api {
        /// Wire error code (`VALIDATION_ERROR`, `NOT_FOUND`, ...).
        code: String,
        /// Human-readable message from the envelope.
        message: String,
    },

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success envelope arrived without its payload.
    #[error("success envelope carried no data")]
    MissingData,
}

/// Asynchronous todo API operations.
#[async_trait]
pub trait TodoApi: Send + Sync {
    /// Fetch all todos.
    async fn list(&self) -> Result<Vec<Todo>, ClientError>;

    /// Fetch one todo by id.
    async fn get(&self, id: &str) -> Result<Todo, ClientError>;

    /// Create a todo from a title.
    async fn create(&self, title: &str) -> Result<Todo, ClientError>;

    /// Apply a partial update.
    async fn update(&self, id: &str, update: UpdateTodo) -> Result<Todo, ClientError>;

    /// Delete a todo.
    async fn delete(&self, id: &str) -> Result<(), ClientError>;

    /// Remove all completed todos, returning how many were removed.
    async fn clear_completed(&self) -> Result<usize, ClientError>;
}

// Wire shapes for the uniform response envelope.

#[derive(Debug, Deserialize)]
struct WireError {
    code: String,
    message: String,
}

// No `default` attributes here: serde already decodes a missing field as
// `None` for `Option` fields, and `default` would impose a `T: Default`
// bound the payload types do not carry.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
struct ClearedBody {
    removed: usize,
}

impl<T> Envelope<T> {
    // A failure envelope without error details still needs a code.
    fn into_result(self) -> Result<Option<T>, ClientError> {
        if self.success {
            return Ok(self.data);
        }
        let (code, message) = self.error.map_or_else(
            || ("INTERNAL_ERROR".to_string(), "Unknown error".to_string()),
            |error| (error.code, error.message),
        );
        Err(ClientError::Api { code, message })
    }
}

/// HTTP-backed [`TodoApi`] implementation.
#[derive(Clone, Debug)]
pub struct HttpTodoApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTodoApi {
    /// Client over the API at `base_url` (no trailing slash).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let envelope: Envelope<T> = response.json().await?;
        envelope.into_result()?.ok_or(ClientError::MissingData)
    }

    async fn decode_empty(response: reqwest::Response) -> Result<(), ClientError> {
        let envelope: Envelope<serde_json::Value> = response.json().await?;
        envelope.into_result().map(|_| ())
    }
}

#[async_trait]
impl TodoApi for HttpTodoApi {
    async fn list(&self) -> Result<Vec<Todo>, ClientError> {
        let response = self.http.get(self.url("/todos")).send().await?;
        Self::decode(response).await
    }

    async fn get(&self, id: &str) -> Result<Todo, ClientError> {
        let response = self.http.get(self.url(&format!("/todos/{id}"))).send().await?;
        Self::decode(response).await
    }

    async fn create(&self, title: &str) -> Result<Todo, ClientError> {
        let response = self
            .http
            .post(self.url("/todos"))
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn update(&self, id: &str, update: UpdateTodo) -> Result<Todo, ClientError> {
        let response = self
            .http
            .patch(self.url(&format!("/todos/{id}")))
            .json(&update)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/todos/{id}")))
            .send()
            .await?;
        Self::decode_empty(response).await
    }

    async fn clear_completed(&self) -> Result<usize, ClientError> {
        let response = self.http.delete(self.url("/todos/completed")).send().await?;
        let cleared: ClearedBody = Self::decode(response).await?;
        Ok(cleared.removed)
    }
}
