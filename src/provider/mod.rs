//! Remote collaborators: the token authority and the translation provider

pub mod microsoft;

use async_trait::async_trait;

use crate::core::errors::Result;
use crate::core::models::{AccessToken, Credential, TokenGrant};

/// Exchanges client credentials for a raw token grant
#[async_trait]
pub trait Authority: Send + Sync {
    /// Fails with `AuthError` on transport failure or an unparseable grant
    async fn exchange(&self, credential: &Credential) -> Result<TokenGrant>;
}

/// The remote translation service.
///
/// Batch operations return one item per input, positionally aligned with
/// what was sent. Failures surface as `ProviderError`.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate one text; an empty `source_lang` asks the service to detect it
    async fn translate_one(
        &self,
        token: &AccessToken,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String>;

    /// Translate `texts` in a single request
    async fn translate_batch(
        &self,
        token: &AccessToken,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>>;

    /// Language code of each text, in input order
    async fn detect_batch(&self, token: &AccessToken, texts: &[String]) -> Result<Vec<String>>;
}
