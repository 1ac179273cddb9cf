//! Chapter cache
//!
//! In-memory cache so navigating back to a chapter does not refetch it.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::provider::{ProviderError, TextProvider, VerseText};
use crate::annotations::Scope;

/// Thread-safe chapter cache around any provider
pub struct ChapterCache<P> {
    provider: P,
    chapters: RwLock<HashMap<Scope, Vec<VerseText>>>,
}

impl<P: TextProvider> ChapterCache<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            chapters: RwLock::new(HashMap::new()),
        }
    }

    /// Verses for a scope, fetched once
    pub async fn get(&self, scope: &Scope) -> Result<Vec<VerseText>, ProviderError> {
        {
            let chapters = self.chapters.read().await;
            if let Some(verses) = chapters.get(scope) {
                debug!("Chapter cache hit for {}", scope);
                return Ok(verses.clone());
            }
        }

        let verses = self
            .provider
            .chapter(&scope.translation, scope.book_id, scope.chapter)
            .await?;

        let mut chapters = self.chapters.write().await;
        chapters.insert(scope.clone(), verses.clone());
        Ok(verses)
    }

    pub async fn contains(&self, scope: &Scope) -> bool {
        self.chapters.read().await.contains_key(scope)
    }

    pub async fn len(&self) -> usize {
        self.chapters.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chapters.read().await.is_empty()
    }

    pub async fn remove(&self, scope: &Scope) -> bool {
        self.chapters.write().await.remove(scope).is_some()
    }

    pub async fn clear(&self) {
        self.chapters.write().await.clear();
    }
}

#[async_trait]
impl<P: TextProvider> TextProvider for ChapterCache<P> {
    async fn chapter(
        &self,
        translation: &str,
        book_id: u32,
        chapter: u32,
    ) -> Result<Vec<VerseText>, ProviderError> {
        self.get(&Scope::new(translation, book_id, chapter)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::provider::MockProvider;

    fn provider() -> MockProvider {
        MockProvider::new(vec![VerseText {
            verse: 1,
            text: "In the beginning".to_string(),
        }])
    }

    #[tokio::test]
    async fn test_fetches_once_per_scope() {
        let cache = ChapterCache::new(provider());
        let genesis = Scope::new("KJV", 1, 1);

        assert!(cache.is_empty().await);
        let first = cache.get(&genesis).await.unwrap();
        let second = cache.chapter("KJV", 1, 1).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.provider.calls(), 1);
        assert!(cache.contains(&genesis).await);

        cache.get(&Scope::new("WEB", 1, 1)).await.unwrap();
        assert_eq!(cache.provider.calls(), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = ChapterCache::new(provider());
        let genesis = Scope::new("KJV", 1, 1);

        cache.get(&genesis).await.unwrap();
        assert!(cache.remove(&genesis).await);
        assert!(!cache.remove(&genesis).await);

        cache.get(&genesis).await.unwrap();
        assert_eq!(cache.provider.calls(), 2);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
