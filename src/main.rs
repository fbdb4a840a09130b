mod render;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use vana_core::Config;
use vana_events::{
    EventLoader, LoaderOptions, LumaClient, RetryPolicy, SqliteStore, SystemClock,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    vana_core::init()?;

    let config = match Config::load_validated() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {:#}", e);
            eprintln!("{}", e.user_message());
            return Ok(ExitCode::FAILURE);
        }
    };

    let loader = build_loader(&config)?;

    match loader.get_events().await {
        Ok(feed) => {
            print!("{}", render::render_feed(&feed));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!("Failed to initialize event list: {}", e);
            println!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn build_loader(config: &Config) -> Result<EventLoader> {
    let api_key = config
        .api_key()
        .context("Luma API key is not configured")?;

    let retry = RetryPolicy::new(
        config.retry.max_attempts,
        config.retry.default_wait_secs,
        config.retry.max_wait_secs,
    );
    let client = LumaClient::with_base_url(
        api_key,
        &config.luma.base_url,
        Duration::from_secs(config.luma.request_timeout_secs),
    )?
    .with_retry_policy(retry);

    let cache_path = config.cache_path();
    let store = SqliteStore::new(&cache_path)
        .with_context(|| format!("Failed to open event cache {}", cache_path.display()))?;
    tracing::debug!("Using event cache at {}", cache_path.display());

    let options = LoaderOptions {
        ttl: Duration::from_secs(config.cache.ttl_seconds),
        timezone: config
            .display
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid display.timezone: {}", e))?,
    };

    Ok(EventLoader::with_options(
        client,
        Arc::new(store),
        Arc::new(SystemClock),
        options,
    ))
}
