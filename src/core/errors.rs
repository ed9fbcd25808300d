//! Custom error types for translation operations

use thiserror::Error;

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Credential exchange failed or returned something that is not a token
    #[error("Authentication failed: {message}")]
    AuthError {
        /// What went wrong
        message: String,
    },

    /// Operation attempted with a token past its deadline
    #[error("access token is invalid, please get new token")]
    TokenExpired,

    /// Transport or wire-format failure talking to the translation provider
    #[error("Provider error: {message}")]
    ProviderError {
        /// What went wrong
        message: String,
    },

    /// Cache backend failure. Never aborts a translation.
    #[error("Cache error: {message}")]
    CacheError {
        /// What went wrong
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// What went wrong
        message: String,
    },

    /// Wrapper for anyhow errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TranslationError {
    pub(crate) fn auth(message: impl Into<String>) -> Self {
        TranslationError::AuthError {
            message: message.into(),
        }
    }

    pub(crate) fn provider(message: impl Into<String>) -> Self {
        TranslationError::ProviderError {
            message: message.into(),
        }
    }

    pub(crate) fn cache(message: impl Into<String>) -> Self {
        TranslationError::CacheError {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        TranslationError::ConfigError {
            message: message.into(),
        }
    }

    /// True when the caller should mint a new token and retry
    pub fn is_token_expired(&self) -> bool {
        matches!(self, TranslationError::TokenExpired)
    }
}

impl From<anyhow::Error> for TranslationError {
    fn from(err: anyhow::Error) -> Self {
        TranslationError::InternalError(err.to_string())
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
