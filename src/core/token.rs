//! Access token acquisition and expiry tracking

use std::sync::Arc;
use tracing::{debug, info};

use crate::core::clock::Clock;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{AccessToken, Credential};
use crate::provider::Authority;

/// Mints access tokens and answers validity queries.
///
/// There is no renewal: callers re-acquire once `is_expired` says so.
#[derive(Clone)]
pub struct TokenManager {
    authority: Arc<dyn Authority>,
    clock: Arc<dyn Clock>,
}

impl TokenManager {
    /// Create a manager minting tokens from `authority`, timed by `clock`
    pub fn new(authority: Arc<dyn Authority>, clock: Arc<dyn Clock>) -> Self {
        Self { authority, clock }
    }

    /// Exchange a credential for a token whose deadline starts now
    pub async fn acquire(&self, credential: &Credential) -> Result<AccessToken> {
        debug!("Requesting access token for client {}", credential.client_id);

        let grant = self.authority.exchange(credential).await?;
        if grant.access_token.is_empty() {
            return Err(TranslationError::auth("authority returned an empty access token"));
        }

        let token = AccessToken {
            value: grant.access_token,
            token_type: grant.token_type,
            granted_scope: grant.scope,
            issued_at: self.clock.now(),
            expires_in_secs: grant.expires_in,
        };

        info!(
            "Access token acquired, valid for {}s (until {})",
            token.expires_in_secs,
            token.deadline()
        );
        Ok(token)
    }

    /// Evaluated against the clock on every call
    pub fn is_expired(&self, token: &AccessToken) -> bool {
        token.is_expired_at(self.clock.now())
    }

    /// Fails with `TokenExpired` once the deadline has passed
    pub fn ensure_valid(&self, token: &AccessToken) -> Result<()> {
        if self.is_expired(token) {
            debug!("Rejecting call with token expired at {}", token.deadline());
            return Err(TranslationError::TokenExpired);
        }
        Ok(())
    }

    /// Clock deadlines are checked against
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
