//! Token-gated translation client with write-through caching

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{InMemoryCache, TranslationCache};
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::{CacheBackend, TranslatorConfig};
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{
    AccessToken, CacheKey, CacheKeyScope, Credential, TranslationBatchRequest, TranslationRequest,
};
use crate::core::token::TokenManager;
use crate::provider::microsoft::{MicrosoftAuthority, MicrosoftTranslatorApi};
use crate::provider::{Authority, TranslationProvider};

/// Translation client: token manager, provider and cache wired together
#[derive(Clone)]
pub struct AsyncTranslator {
    tokens: TokenManager,
    provider: Arc<dyn TranslationProvider>,
    cache: Arc<dyn TranslationCache>,
    key_scope: CacheKeyScope,
}

/// A text sent to the provider and every batch slot waiting on its result
#[derive(Debug)]
struct PendingMiss<'a> {
    text: &'a str,
    positions: Vec<usize>,
}

impl AsyncTranslator {
    /// Create a new async translator talking to the Microsoft endpoints in `config`
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        config.validate()?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .build()?;

        let authority = Arc::new(MicrosoftAuthority::from_config(client.clone(), &config));
        let provider = Arc::new(MicrosoftTranslatorApi::from_config(client, &config));
        let cache = build_cache(&config)?;

        info!(
            "Translator ready (cache backend: {:?}, key scope: {})",
            config.cache_backend, config.cache_key_scope
        );

        Ok(Self::with_ports(
            authority,
            provider,
            cache,
            Arc::new(SystemClock),
            config.cache_key_scope,
        ))
    }

    /// Create from environment
    pub fn from_env() -> Result<Self> {
        Self::new(TranslatorConfig::from_env()?)
    }

    /// Assemble from explicit collaborators
    pub fn with_ports(
        authority: Arc<dyn Authority>,
        provider: Arc<dyn TranslationProvider>,
        cache: Arc<dyn TranslationCache>,
        clock: Arc<dyn Clock>,
        key_scope: CacheKeyScope,
    ) -> Self {
        Self {
            tokens: TokenManager::new(authority, clock),
            provider,
            cache,
            key_scope,
        }
    }

    /// Exchange `credential` for a fresh access token
    pub async fn acquire_token(&self, credential: &Credential) -> Result<AccessToken> {
        self.tokens.acquire(credential).await
    }

    /// Whether `token` is past its deadline right now
    pub fn is_expired(&self, token: &AccessToken) -> bool {
        self.tokens.is_expired(token)
    }

    /// Token manager shared by every operation of this translator
    pub fn token_manager(&self) -> &TokenManager {
        &self.tokens
    }

    fn cache_key(&self, text: &str, source_lang: &str, target_lang: &str) -> CacheKey {
        CacheKey::new(self.key_scope, text, source_lang, target_lang)
    }

    /// Cache read that degrades to a miss when the backend fails
    async fn cached(&self, key: &CacheKey) -> Option<String> {
        match self.cache.get(key).await {
            Ok(Some(value)) => {
                debug!("Getting from cache {}: [{}] {}", key.hash_name(), key.field(), value);
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Cache lookup failed for {} [{}], treating as miss: {}", key.hash_name(), key.field(), e);
                None
            }
        }
    }

    /// Cache write whose failure is reported and otherwise ignored
    async fn remember(&self, key: &CacheKey, value: &str) {
        match self.cache.set(key, value).await {
            Ok(()) => debug!("Add to cache {}: [{}] {}", key.hash_name(), key.field(), value),
            Err(e) => warn!("Cache write failed for {} [{}]: {}", key.hash_name(), key.field(), e),
        }
    }

    /// Translate a single text
    pub async fn translate(
        &self,
        token: &AccessToken,
        request: &TranslationRequest,
        cache_enabled: bool,
    ) -> Result<String> {
        self.tokens.ensure_valid(token)?;

        let key = self.cache_key(&request.text, &request.source_lang, &request.target_lang);
        if cache_enabled {
            if let Some(hit) = self.cached(&key).await {
                return Ok(hit);
            }
        }

        let translation = self
            .provider
            .translate_one(token, &request.text, &request.source_lang, &request.target_lang)
            .await?;

        if cache_enabled {
            self.remember(&key, &translation).await;
        }

        Ok(translation)
    }

    /// Translate a batch, calling the provider once for the texts the cache cannot answer.
    ///
    /// `output[i]` is the translation of `request.texts[i]`. Repeated texts are
    /// sent once. A provider failure aborts the batch before anything is cached.
    pub async fn translate_batch(
        &self,
        token: &AccessToken,
        request: &TranslationBatchRequest,
        cache_enabled: bool,
    ) -> Result<Vec<String>> {
        self.tokens.ensure_valid(token)?;

        let texts = &request.texts;
        let mut slots: Vec<Option<String>> = vec![None; texts.len()];
        let mut hits: HashMap<&str, String> = HashMap::new();
        let mut pending: Vec<PendingMiss<'_>> = Vec::new();
        let mut pending_index: HashMap<&str, usize> = HashMap::new();

        for (position, text) in texts.iter().enumerate() {
            let text = text.as_str();

            if let Some(value) = hits.get(text) {
                slots[position] = Some(value.clone());
                continue;
            }
            if let Some(&index) = pending_index.get(text) {
                pending[index].positions.push(position);
                continue;
            }

            if cache_enabled {
                let key = self.cache_key(text, &request.source_lang, &request.target_lang);
                if let Some(value) = self.cached(&key).await {
                    slots[position] = Some(value.clone());
                    hits.insert(text, value);
                    continue;
                }
            }

            pending_index.insert(text, pending.len());
            pending.push(PendingMiss {
                text,
                positions: vec![position],
            });
        }

        if pending.is_empty() {
            debug!("All {} texts answered from cache", texts.len());
            return assemble(slots);
        }

        let to_send: Vec<String> = pending.iter().map(|miss| miss.text.to_string()).collect();
        debug!(
            "Batch of {}: {} cached, {} sent to provider",
            texts.len(),
            hits.len(),
            to_send.len()
        );

        let translated = self
            .provider
            .translate_batch(token, &to_send, &request.source_lang, &request.target_lang)
            .await?;

        if translated.len() != to_send.len() {
            return Err(TranslationError::provider(format!(
                "provider returned {} translations for {} texts",
                translated.len(),
                to_send.len()
            )));
        }

        for (miss, value) in pending.iter().zip(translated) {
            if cache_enabled {
                let key = self.cache_key(miss.text, &request.source_lang, &request.target_lang);
                self.remember(&key, &value).await;
            }
            for &position in &miss.positions {
                slots[position] = Some(value.clone());
            }
        }

        assemble(slots)
    }

    /// Detect the language of each text; one provider call, no caching
    pub async fn detect_languages(&self, token: &AccessToken, texts: &[String]) -> Result<Vec<String>> {
        self.tokens.ensure_valid(token)?;

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let languages = self.provider.detect_batch(token, texts).await?;
        if languages.len() != texts.len() {
            return Err(TranslationError::provider(format!(
                "provider returned {} languages for {} texts",
                languages.len(),
                texts.len()
            )));
        }

        Ok(languages)
    }
}

fn assemble(slots: Vec<Option<String>>) -> Result<Vec<String>> {
    slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| TranslationError::InternalError("batch slot left unfilled".to_string()))
}

fn build_cache(config: &TranslatorConfig) -> Result<Arc<dyn TranslationCache>> {
    match config.cache_backend {
        CacheBackend::Memory => Ok(Arc::new(InMemoryCache::new())),
        #[cfg(feature = "redis-cache")]
        CacheBackend::Redis => Ok(Arc::new(crate::cache::RedisCache::new(&config.redis_url)?)),
        #[cfg(not(feature = "redis-cache"))]
        CacheBackend::Redis => Err(TranslationError::config(
            "redis cache backend requires the `redis-cache` feature",
        )),
    }
}
