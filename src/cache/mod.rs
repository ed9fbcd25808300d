//! Translation cache port and its backends

pub mod memory;
#[cfg(feature = "redis-cache")]
pub mod redis;

use async_trait::async_trait;

use crate::core::errors::Result;
use crate::core::models::CacheKey;

/// Key/field store memoizing translations.
///
/// Errors are reported as `CacheError`; callers treat them as non-fatal.
#[async_trait]
pub trait TranslationCache: Send + Sync {
    /// Memoized value for `key`, if any
    async fn get(&self, key: &CacheKey) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing what was there
    async fn set(&self, key: &CacheKey, value: &str) -> Result<()>;

    /// Whether `key` has a value
    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

pub use memory::InMemoryCache;
#[cfg(feature = "redis-cache")]
pub use self::redis::RedisCache;
