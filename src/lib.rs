//! Microsoft Translator client
//!
//! Exchanges client credentials for a short-lived access token and uses it to
//! translate single texts, translate batches through a write-through cache,
//! and detect languages.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod cli;
pub mod core;
pub mod provider;

// Re-export key types for convenience
pub use crate::core::{
    client::AsyncTranslator,
    clock::{Clock, ManualClock, SystemClock},
    config::{CacheBackend, TranslatorConfig},
    errors::{Result, TranslationError},
    models::{
        AccessToken, CacheKey, CacheKeyScope, Credential, TokenGrant, TranslationBatchRequest,
        TranslationRequest,
    },
    token::TokenManager,
};

pub use crate::cache::{InMemoryCache, TranslationCache};
pub use crate::provider::{Authority, TranslationProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
