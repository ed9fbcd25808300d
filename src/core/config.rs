//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::core::errors::{Result, TranslationError};
use crate::core::models::{CacheKeyScope, Credential};

/// OAuth token endpoint of the translator service
pub const DEFAULT_AUTH_ENDPOINT: &str = "https://datamarket.accesscontrol.windows.net/v2/OAuth2-13";
/// Scope requested with every token
pub const DEFAULT_SCOPE: &str = "http://api.microsofttranslator.com";
/// Single-text `Translate` endpoint
pub const DEFAULT_TRANSLATE_ENDPOINT: &str =
    "http://api.microsofttranslator.com/v2/Http.svc/Translate";
/// Batch `TranslateArray` endpoint
pub const DEFAULT_TRANSLATE_ARRAY_ENDPOINT: &str =
    "http://api.microsofttranslator.com/V2/Http.svc/TranslateArray";
/// Batch `DetectArray` endpoint
pub const DEFAULT_DETECT_ARRAY_ENDPOINT: &str =
    "http://api.microsofttranslator.com/V2/Http.svc/DetectArray";
/// Redis database used when `REDIS` is not set
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/7";

/// Where memoized translations are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// Process-local map. Entries die with the process, so a CLI run never
    /// sees what an earlier run cached.
    #[default]
    Memory,
    /// Shared Redis hashes; survives restarts and is shared between processes
    Redis,
}

impl std::str::FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(format!("unknown cache backend: {}", other)),
        }
    }
}

/// Configuration for translator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Client id registered with the translator service
    pub client_id: String,
    /// Secret paired with `client_id`
    pub client_secret: String,
    /// OAuth endpoint the credentials are exchanged at
    pub auth_endpoint: String,
    /// Scope requested with the token
    pub scope: String,
    /// Single translation endpoint
    pub translate_endpoint: String,
    /// Batch translation endpoint
    pub translate_array_endpoint: String,
    /// Batch language detection endpoint
    pub detect_array_endpoint: String,
    /// HTTP request timeout in milliseconds
    pub timeout_ms: u64,
    /// Memoize translations. Callers can still opt out per call.
    pub cache_enabled: bool,
    /// Where memoized translations live. `memory` only lasts as long as the process.
    pub cache_backend: CacheBackend,
    /// Connection URL for the redis backend
    pub redis_url: String,
    /// Which request fields make up the cache key
    pub cache_key_scope: CacheKeyScope,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            auth_endpoint: DEFAULT_AUTH_ENDPOINT.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            translate_endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            translate_array_endpoint: DEFAULT_TRANSLATE_ARRAY_ENDPOINT.to_string(),
            detect_array_endpoint: DEFAULT_DETECT_ARRAY_ENDPOINT.to_string(),
            timeout_ms: 30000,
            cache_enabled: true,
            cache_backend: CacheBackend::Memory,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            cache_key_scope: CacheKeyScope::Target,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| TranslationError::config(format!("{}: {}", name, e)))
}

fn parse_switch(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Ok(true),
        "0" | "off" | "false" | "no" => Ok(false),
        other => Err(TranslationError::config(format!(
            "{}: expected on/off, got {}",
            name, other
        ))),
    }
}

impl TranslatorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("MS_CLIENT_ID")
            .map_err(|_| TranslationError::config("MS_CLIENT_ID environment variable is required"))?;

        let client_secret = std::env::var("MS_CLIENT_SECRET").map_err(|_| {
            TranslationError::config("MS_CLIENT_SECRET environment variable is required")
        })?;

        let timeout_ms = parse_env(
            "REQUEST_TIMEOUT_MS",
            &env_or("REQUEST_TIMEOUT_MS", "30000"),
        )?;

        let cache_enabled = parse_switch("TRANSLATION_CACHE", &env_or("TRANSLATION_CACHE", "on"))?;
        let cache_backend = parse_env("CACHE_BACKEND", &env_or("CACHE_BACKEND", "memory"))?;
        let cache_key_scope = parse_env("CACHE_KEY_SCOPE", &env_or("CACHE_KEY_SCOPE", "target"))?;

        Ok(Self {
            client_id,
            client_secret,
            auth_endpoint: env_or("MS_AUTH_ENDPOINT", DEFAULT_AUTH_ENDPOINT),
            scope: env_or("MS_SCOPE", DEFAULT_SCOPE),
            translate_endpoint: env_or("MS_TRANSLATE_ENDPOINT", DEFAULT_TRANSLATE_ENDPOINT),
            translate_array_endpoint: env_or(
                "MS_TRANSLATE_ARRAY_ENDPOINT",
                DEFAULT_TRANSLATE_ARRAY_ENDPOINT,
            ),
            detect_array_endpoint: env_or("MS_DETECT_ARRAY_ENDPOINT", DEFAULT_DETECT_ARRAY_ENDPOINT),
            timeout_ms,
            cache_enabled,
            cache_backend,
            redis_url: env_or("REDIS", DEFAULT_REDIS_URL),
            cache_key_scope,
        })
    }

    /// Load from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(TranslationError::config("client_id is required"));
        }

        if self.client_secret.is_empty() {
            return Err(TranslationError::config("client_secret is required"));
        }

        for (name, value) in [
            ("auth_endpoint", &self.auth_endpoint),
            ("translate_endpoint", &self.translate_endpoint),
            ("translate_array_endpoint", &self.translate_array_endpoint),
            ("detect_array_endpoint", &self.detect_array_endpoint),
        ] {
            if value.is_empty() {
                return Err(TranslationError::config(format!("{} is required", name)));
            }
        }

        if self.timeout_ms == 0 {
            return Err(TranslationError::config("timeout_ms must be greater than 0"));
        }

        if self.cache_backend == CacheBackend::Redis && self.redis_url.is_empty() {
            return Err(TranslationError::config("redis_url is required for the redis backend"));
        }

        if self.cache_key_scope == CacheKeyScope::Target {
            debug!("Cache key ignores source language; the same text from different sources shares one entry");
        }

        Ok(())
    }

    /// Credentials to exchange for an access token
    pub fn credential(&self) -> Credential {
        Credential::new(&self.client_id, &self.client_secret)
    }
}
