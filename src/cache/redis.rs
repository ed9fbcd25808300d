//! Redis hash cache backend
//!
//! Each translation lives at `HSET <text> <field> <translation>`, one hash
//! per source text with one field per target language.

use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use tracing::debug;

use super::TranslationCache;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::CacheKey;

/// Long-lived handle; a connection is opened per operation and dropped with it
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    /// Open a client for `url`. No connection is made until the first operation.
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| TranslationError::config(format!("invalid redis url {}: {}", url, e)))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| TranslationError::cache(format!("connect failed: {}", e)))
    }
}

#[async_trait]
impl TranslationCache for RedisCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn
            .hget(key.hash_name(), key.field())
            .await
            .map_err(|e| TranslationError::cache(format!("HGET failed: {}", e)))?;
        debug!("HGET {} [{}] -> {:?}", key.hash_name(), key.field(), value);
        Ok(value)
    }

    async fn set(&self, key: &CacheKey, value: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .hset(key.hash_name(), key.field(), value)
            .await
            .map_err(|e| TranslationError::cache(format!("HSET failed: {}", e)))?;
        Ok(())
    }

    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        let mut conn = self.connection().await?;
        conn.hexists(key.hash_name(), key.field())
            .await
            .map_err(|e| TranslationError::cache(format!("HEXISTS failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_url() {
        let err = RedisCache::new("not a url").err().unwrap();
        assert!(matches!(err, TranslationError::ConfigError { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_cache_error() {
        let cache = RedisCache::new("redis://127.0.0.1:1/7").unwrap();
        let key = CacheKey::new(Default::default(), "um", "pt", "en");

        let err = cache.get(&key).await.unwrap_err();
        assert!(matches!(err, TranslationError::CacheError { .. }));
    }
}
