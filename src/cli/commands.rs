//! CLI command definitions and handlers

use clap::Subcommand;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::client::AsyncTranslator;
use crate::core::config::{CacheBackend, TranslatorConfig};
use crate::core::models::{AccessToken, TranslationBatchRequest, TranslationRequest};

/// Commands for the translator CLI
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Exchange the configured credentials for an access token
    Token {
        /// Print the token value instead of eliding it
        #[arg(long)]
        show: bool,
    },

    /// Translate a single text
    Translate {
        /// Text to translate
        #[arg(short = 'x', long)]
        text: String,

        /// Source language (auto-detect if not specified)
        #[arg(long, default_value = "")]
        from: String,

        /// Target language
        #[arg(short, long)]
        to: String,
    },

    /// Translate many texts with one provider call
    TranslateBatch {
        /// Source language (auto-detect if not specified)
        #[arg(long, default_value = "")]
        from: String,

        /// Target language
        #[arg(short, long)]
        to: String,

        /// Read texts from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Texts to translate
        texts: Vec<String>,
    },

    /// Detect the language of each text
    Detect {
        /// Read texts from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Texts to inspect
        texts: Vec<String>,
    },
}

#[derive(Serialize)]
struct TokenReport<'a> {
    access_token: &'a str,
    token_type: Option<&'a str>,
    scope: &'a str,
    issued_at: String,
    expires_at: String,
    seconds_remaining: i64,
}

/// Filter directive for the binary's logger.
///
/// `--verbose` wins over `RUST_LOG`; without either, this crate logs at info.
pub fn log_directive(verbose: bool, rust_log: Option<&str>) -> String {
    match rust_log {
        _ if verbose => format!("{}=debug", env!("CARGO_PKG_NAME")),
        Some(directive) if !directive.trim().is_empty() => directive.to_string(),
        _ => format!("{}=info", env!("CARGO_PKG_NAME")),
    }
}

/// Note for CLI users when caching is on but nothing outlives the process
pub fn cache_notice(config: &TranslatorConfig) -> Option<&'static str> {
    if config.cache_enabled && config.cache_backend == CacheBackend::Memory {
        Some("Using the in-memory cache: entries last for this run only. Set CACHE_BACKEND=redis to reuse translations across runs")
    } else {
        None
    }
}

/// Texts from the positional arguments followed by the non-blank lines of `file`
pub fn collect_texts(texts: Vec<String>, file: Option<&Path>) -> anyhow::Result<Vec<String>> {
    let mut all = texts;

    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        all.extend(
            content
                .lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string),
        );
    }

    if all.is_empty() {
        anyhow::bail!("no texts given; pass them as arguments or with --file");
    }

    Ok(all)
}

async fn open_session(config: &TranslatorConfig) -> anyhow::Result<(AsyncTranslator, AccessToken)> {
    let translator = AsyncTranslator::new(config.clone())?;
    let token = translator.acquire_token(&config.credential()).await?;
    Ok((translator, token))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Handle token command
pub async fn handle_token(config: TranslatorConfig, show: bool) -> anyhow::Result<()> {
    let (translator, token) = open_session(&config).await?;
    let now = translator.token_manager().clock().now();

    print_json(&TokenReport {
        access_token: if show { &token.value } else { "<hidden>" },
        token_type: token.token_type.as_deref(),
        scope: &token.granted_scope,
        issued_at: token.issued_at.to_rfc3339(),
        expires_at: token.deadline().to_rfc3339(),
        seconds_remaining: token.time_remaining(now).num_seconds(),
    })
}

/// Handle single translation command
pub async fn handle_translate(
    config: TranslatorConfig,
    text: String,
    from: String,
    to: String,
) -> anyhow::Result<()> {
    let (translator, token) = open_session(&config).await?;
    let request = TranslationRequest::new(text, from, to);

    let translation = translator
        .translate(&token, &request, config.cache_enabled)
        .await?;

    println!("{}", translation);
    Ok(())
}

/// Handle batch translation command
pub async fn handle_translate_batch(
    config: TranslatorConfig,
    from: String,
    to: String,
    file: Option<PathBuf>,
    texts: Vec<String>,
) -> anyhow::Result<()> {
    let texts = collect_texts(texts, file.as_deref())?;
    let (translator, token) = open_session(&config).await?;

    info!("Translating {} texts to {}", texts.len(), to);
    let request = TranslationBatchRequest::new(texts, from, to);
    let translations = translator
        .translate_batch(&token, &request, config.cache_enabled)
        .await?;

    print_json(&translations)
}

/// Handle language detection command
pub async fn handle_detect(
    config: TranslatorConfig,
    file: Option<PathBuf>,
    texts: Vec<String>,
) -> anyhow::Result<()> {
    let texts = collect_texts(texts, file.as_deref())?;
    let (translator, token) = open_session(&config).await?;

    let languages = translator.detect_languages(&token, &texts).await?;
    print_json(&languages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_texts_from_args_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("texts.txt");
        std::fs::write(&path, "um\r\n\n  \ndois\n").unwrap();

        let texts = collect_texts(vec!["zero".to_string()], Some(&path)).unwrap();
        assert_eq!(texts, vec!["zero", "um", "dois"]);
    }

    #[test]
    fn test_log_directive_verbose_overrides_env() {
        assert_eq!(log_directive(true, Some("warn")), "mstranslator=debug");
        assert_eq!(log_directive(true, None), "mstranslator=debug");
    }

    #[test]
    fn test_log_directive_falls_back_to_env_then_info() {
        assert_eq!(log_directive(false, Some("mstranslator=trace")), "mstranslator=trace");
        assert_eq!(log_directive(false, Some("  ")), "mstranslator=info");
        assert_eq!(log_directive(false, None), "mstranslator=info");
    }

    #[test]
    fn test_cache_notice_only_for_memory_backend() {
        let config = TranslatorConfig::default();
        assert!(cache_notice(&config).unwrap().contains("this run only"));

        let uncached = TranslatorConfig {
            cache_enabled: false,
            ..Default::default()
        };
        assert!(cache_notice(&uncached).is_none());

        let shared = TranslatorConfig {
            cache_backend: CacheBackend::Redis,
            ..Default::default()
        };
        assert!(cache_notice(&shared).is_none());
    }

    #[test]
    fn test_collect_texts_requires_input() {
        assert!(collect_texts(vec![], None).is_err());
    }

    #[test]
    fn test_collect_texts_missing_file() {
        let err = collect_texts(vec![], Some(Path::new("/nonexistent/texts.txt"))).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
