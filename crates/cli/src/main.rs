use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zanger_core::config::Settings;
use zanger_core::credentials::check_key_format;
use zanger_core::llm::AnthropicClient;
use zanger_core::market::yahoo::YahooFinanceProvider;
use zanger_core::market::{FinancialDataService, SnapshotCache};

#[derive(Debug, Parser)]
#[command(name = "zanger", about = "Dan Zanger style stock analysis on live market data")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyse a free-text question, e.g. "Is NVDA setting up for a breakout?"
    Ask {
        question: String,

        /// Overrides ANTHROPIC_API_KEY for this run.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Print the market snapshot for one symbol.
    Quote { symbol: String },

    /// Check that an Anthropic key is well-formed and accepted.
    VerifyKey {
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let outcome = match args.command {
        Command::Ask { question, api_key } => ask(&settings, &question, api_key).await,
        Command::Quote { symbol } => quote(&settings, &symbol).await,
        Command::VerifyKey { api_key } => verify_key(&settings, api_key).await,
    };

    match outcome {
        Ok(true) => Ok(ExitCode::SUCCESS),
        Ok(false) => Ok(ExitCode::FAILURE),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "command failed");
            Err(err)
        }
    }
}

async fn ask(settings: &Settings, question: &str, api_key: Option<String>) -> anyhow::Result<bool> {
    let cache = Arc::new(SnapshotCache::new(settings.snapshot_cache_ttl));
    let response = zanger_core::intent::process_intent(settings, cache, question, api_key).await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.is_success())
}

async fn quote(settings: &Settings, symbol: &str) -> anyhow::Result<bool> {
    let symbol = symbol.trim().to_uppercase();
    let provider = YahooFinanceProvider::from_settings(settings)?;
    let cache = Arc::new(SnapshotCache::new(settings.snapshot_cache_ttl));
    let data = FinancialDataService::new(Arc::new(provider), cache);

    match data.fetch(&symbol).await {
        Ok(snapshot) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({"success": true, "data": snapshot}))?
            );
            Ok(true)
        }
        Err(err) => {
            tracing::warn!(%symbol, error = %err, "quote failed");
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({"success": false, "error": err.to_string()}))?
            );
            Ok(false)
        }
    }
}

async fn verify_key(settings: &Settings, api_key: Option<String>) -> anyhow::Result<bool> {
    let candidate = api_key
        .or_else(|| settings.anthropic_api_key.clone())
        .unwrap_or_default();

    let key = match check_key_format(&candidate) {
        Ok(key) => key.to_string(),
        Err(err) => {
            println!("{}", json!({"success": false, "error": err.to_string()}));
            return Ok(false);
        }
    };

    let client = AnthropicClient::from_settings(&settings.clone().with_api_key(Some(key)))
        .context("build anthropic client")?;

    match client.verify_key().await {
        Ok(()) => {
            println!(
                "{}",
                json!({"success": true, "message": "API key validated successfully"})
            );
            Ok(true)
        }
        Err(err) => {
            tracing::warn!(error = %err, "api key rejected");
            println!(
                "{}",
                json!({"success": false, "error": "Invalid API key or authentication failed"})
            );
            Ok(false)
        }
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
