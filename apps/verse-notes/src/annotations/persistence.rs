//! Persistence client
//!
//! Defines the service trait the store talks to and the HTTP implementation
//! used against the verse notes server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::types::{Annotation, Scope};

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The row existed and is gone
    Removed,
    /// No row had that id
    NotFound,
}

/// Errors talking to the persistence service
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Annotation already exists: {0}")]
    Conflict(String),

    #[error("Persistence service unreachable: {0}")]
    Transport(String),

    #[error("Persistence service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Persistence service trait
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// All annotations of a chapter, in insertion order
    async fn list(&self, scope: &Scope) -> Result<Vec<Annotation>, PersistenceError>;

    /// Store a new annotation, returning the stored record
    async fn insert(&self, annotation: &Annotation) -> Result<Annotation, PersistenceError>;

    /// Delete an annotation by id
    async fn delete(&self, id: &str) -> Result<DeleteOutcome, PersistenceError>;
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, without trailing slash
    pub base_url: String,
    /// Applied to every request, connect included
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Persistence over the server's HTTP API
#[derive(Debug, Clone)]
pub struct HttpPersistence {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPersistence {
    pub fn new(config: ClientConfig) -> Result<Self, PersistenceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn highlights_url(&self) -> String {
        format!("{}/api/highlights", self.base_url)
    }

    fn delete_url(&self, id: &str) -> String {
        format!(
            "{}/api/highlights/delete/{}",
            self.base_url,
            urlencoding::encode(id)
        )
    }
}

/// Turn a non-success response into a status error, keeping the server's message
async fn status_error(response: reqwest::Response) -> PersistenceError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or(body);

    PersistenceError::Status { status, message }
}

fn transport(e: reqwest::Error) -> PersistenceError {
    PersistenceError::Transport(e.to_string())
}

#[async_trait]
impl PersistenceService for HttpPersistence {
    async fn list(&self, scope: &Scope) -> Result<Vec<Annotation>, PersistenceError> {
        let book_id = scope.book_id.to_string();
        let chapter = scope.chapter.to_string();

        let response = self
            .client
            .get(self.highlights_url())
            .query(&[
                ("translation", scope.translation.as_str()),
                ("bookId", book_id.as_str()),
                ("chapter", chapter.as_str()),
            ])
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let annotations: Vec<Annotation> = response
            .json()
            .await
            .map_err(|e| PersistenceError::Decode(e.to_string()))?;

        debug!("Fetched {} annotations for {}", annotations.len(), scope);
        Ok(annotations)
    }

    async fn insert(&self, annotation: &Annotation) -> Result<Annotation, PersistenceError> {
        let response = self
            .client
            .post(self.highlights_url())
            .json(annotation)
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::CONFLICT => Err(PersistenceError::Conflict(annotation.id.clone())),
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| PersistenceError::Decode(e.to_string())),
            _ => Err(status_error(response).await),
        }
    }

    async fn delete(&self, id: &str) -> Result<DeleteOutcome, PersistenceError> {
        let response = self
            .client
            .delete(self.delete_url(id))
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(DeleteOutcome::NotFound),
            status if status.is_success() => Ok(DeleteOutcome::Removed),
            _ => Err(status_error(response).await),
        }
    }
}
