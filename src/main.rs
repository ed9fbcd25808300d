//! Main entry point for the translator CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mstranslator::cli::commands::{self, Commands};
use mstranslator::TranslatorConfig;

/// Microsoft Translator client with token handling and translation cache
#[derive(Parser, Debug)]
#[command(name = "mstranslator", version, about, long_about = None)]
struct Args {
    /// JSON configuration file (defaults to MS_* environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Client id (overrides configuration)
    #[arg(long)]
    client_id: Option<String>,

    /// Client secret (overrides configuration)
    #[arg(long)]
    client_secret: Option<String>,

    /// Skip the translation cache for this run. With the default memory
    /// backend the cache only lives for one run anyway.
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn load_config(args: &Args) -> anyhow::Result<TranslatorConfig> {
    let mut config = match &args.config {
        Some(path) => TranslatorConfig::from_file(path)?,
        None if args.client_id.is_some() && args.client_secret.is_some() => {
            TranslatorConfig::default()
        }
        None => TranslatorConfig::from_env()?,
    };

    if let Some(client_id) = &args.client_id {
        config.client_id = client_id.clone();
    }
    if let Some(client_secret) = &args.client_secret {
        config.client_secret = client_secret.clone();
    }
    if args.no_cache {
        config.cache_enabled = false;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let mut args = Args::parse();

    // Initialize logging
    let directive = commands::log_directive(args.verbose, std::env::var("RUST_LOG").ok().as_deref());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(directive))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(command) = args.command.take() else {
        println!("Please specify a command. Use --help for more information.");
        return Ok(());
    };

    let config = load_config(&args)?;
    if let Some(notice) = commands::cache_notice(&config) {
        info!("{}", notice);
    }

    match command {
        Commands::Token { show } => commands::handle_token(config, show).await?,
        Commands::Translate { text, from, to } => {
            commands::handle_translate(config, text, from, to).await?
        }
        Commands::TranslateBatch {
            from,
            to,
            file,
            texts,
        } => commands::handle_translate_batch(config, from, to, file, texts).await?,
        Commands::Detect { file, texts } => commands::handle_detect(config, file, texts).await?,
    }

    Ok(())
}
