//! Remote verse text providers
//!
//! The reader renders chapters from a remote provider that returns one
//! markup string per verse.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One verse as returned by a provider; `text` may contain inline markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseText {
    pub verse: u32,
    pub text: String,
}

/// Errors fetching chapter text
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Text provider unreachable: {0}")]
    Transport(String),

    #[error("Text provider returned {0}")]
    Status(u16),

    #[error("Failed to decode chapter: {0}")]
    Decode(String),
}

/// Text provider trait
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Verses of a chapter in verse order
    async fn chapter(
        &self,
        translation: &str,
        book_id: u32,
        chapter: u32,
    ) -> Result<Vec<VerseText>, ProviderError>;
}

/// bolls.life chapter API
pub struct BollsProvider {
    client: reqwest::Client,
    base_url: String,
}

impl BollsProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn default_url() -> Result<Self, ProviderError> {
        Self::new("https://bolls.life", Duration::from_secs(10))
    }

    fn chapter_url(&self, translation: &str, book_id: u32, chapter: u32) -> String {
        format!(
            "{}/get-text/{}/{}/{}/",
            self.base_url,
            urlencoding::encode(translation),
            book_id,
            chapter
        )
    }
}

#[async_trait]
impl TextProvider for BollsProvider {
    async fn chapter(
        &self,
        translation: &str,
        book_id: u32,
        chapter: u32,
    ) -> Result<Vec<VerseText>, ProviderError> {
        let url = self.chapter_url(translation, book_id, chapter);
        debug!("Fetching chapter text from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let mut verses: Vec<VerseText> = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        verses.sort_by_key(|v| v.verse);

        Ok(verses)
    }
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    pub verses: Vec<VerseText>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockProvider {
    pub fn new(verses: Vec<VerseText>) -> Self {
        Self {
            verses,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl TextProvider for MockProvider {
    async fn chapter(
        &self,
        _translation: &str,
        _book_id: u32,
        _chapter: u32,
    ) -> Result<Vec<VerseText>, ProviderError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.verses.clone())
    }
}
