//! In-process cache backend

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::TranslationCache;
use crate::core::errors::Result;
use crate::core::models::CacheKey;

/// Hash-of-fields map kept in memory for the life of the process
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<(String, String), String>>>,
}

impl InMemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized translations
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing has been memoized yet
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn slot(key: &CacheKey) -> (String, String) {
    (key.hash_name().to_string(), key.field())
}

#[async_trait]
impl TranslationCache for InMemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&slot(key)).cloned())
    }

    async fn set(&self, key: &CacheKey, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(slot(key), value.to_string());
        Ok(())
    }

    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.contains_key(&slot(key)))
    }
}
