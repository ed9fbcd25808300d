//! Core data models for translation

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Client credentials exchanged for an access token
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Client id
    pub client_id: String,
    /// Client secret, never printed
    pub client_secret: String,
}

impl Credential {
    /// Pair a client id with its secret
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// What the authority hands back for a credential, before the clock is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Opaque bearer value
    pub access_token: String,
    /// Token type, when the authority reports one
    pub token_type: Option<String>,
    /// Scope the grant covers
    pub scope: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// Upper bound applied to granted lifetimes; keeps them inside `Duration` range
const MAX_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Short-lived bearer token. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Bearer value sent with every provider call
    pub value: String,
    /// Token type reported by the authority
    pub token_type: Option<String>,
    /// Scope the token was granted for
    pub granted_scope: String,
    /// Clock reading taken when the grant arrived
    pub issued_at: DateTime<Utc>,
    /// Granted lifetime in seconds
    pub expires_in_secs: u64,
}

impl AccessToken {
    /// Lifetime granted by the authority
    pub fn expires_after(&self) -> Duration {
        Duration::seconds(self.expires_in_secs.min(MAX_LIFETIME_SECS) as i64)
    }

    /// Instant the token stops being valid, saturating at the end of
    /// representable time
    pub fn deadline(&self) -> DateTime<Utc> {
        self.issued_at
            .checked_add_signed(self.expires_after())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// A token is valid only while `now < deadline`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline()
    }

    /// Time left before the deadline, zero once expired
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        let remaining = self.deadline() - now;
        if remaining < Duration::zero() {
            Duration::zero()
        } else {
            remaining
        }
    }
}

/// Single translation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// Text to translate
    pub text: String,
    /// Empty means "let the provider detect it"
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
}

impl TranslationRequest {
    /// Pass an empty `source_lang` to let the provider detect it
    pub fn new(
        text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }
}

/// Ordered batch of texts sharing one language pair. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationBatchRequest {
    /// Texts in output order
    pub texts: Vec<String>,
    /// Empty means "let the provider detect it"
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
}

impl TranslationBatchRequest {
    /// Collect `texts` into a batch for one language pair
    pub fn new<I, S>(texts: I, source_lang: impl Into<String>, target_lang: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }
}

/// Which request fields take part in the cache key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKeyScope {
    /// `(text, target_lang)`. The same text from two source languages shares an entry.
    #[default]
    Target,
    /// `(text, source_lang, target_lang)`
    SourceAndTarget,
}

impl fmt::Display for CacheKeyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKeyScope::Target => write!(f, "target"),
            CacheKeyScope::SourceAndTarget => write!(f, "source_and_target"),
        }
    }
}

impl FromStr for CacheKeyScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "target" => Ok(CacheKeyScope::Target),
            "source_and_target" | "source-and-target" => Ok(CacheKeyScope::SourceAndTarget),
            other => Err(format!("unknown cache key scope: {}", other)),
        }
    }
}

/// Key under which a translated value is memoized.
///
/// Laid out hash-style: the text is the hash name and the language part is
/// the field, so every target language of one text lives under one hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Original text
    pub text: String,
    /// Only set under `CacheKeyScope::SourceAndTarget`
    pub source_lang: Option<String>,
    /// Target language code
    pub target_lang: String,
}

impl CacheKey {
    /// Build the key for one text; `scope` decides whether `source_lang` is kept
    pub fn new(scope: CacheKeyScope, text: &str, source_lang: &str, target_lang: &str) -> Self {
        let source_lang = match scope {
            CacheKeyScope::Target => None,
            CacheKeyScope::SourceAndTarget => Some(source_lang.to_string()),
        };

        Self {
            text: text.to_string(),
            source_lang,
            target_lang: target_lang.to_string(),
        }
    }

    /// Hash the entry lives under
    pub fn hash_name(&self) -> &str {
        &self.text
    }

    /// Field within the hash: `target`, or `source:target` when the source is kept
    pub fn field(&self) -> String {
        match &self.source_lang {
            Some(source) => format!("{}:{}", source, self.target_lang),
            None => self.target_lang.clone(),
        }
    }
}
