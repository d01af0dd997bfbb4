use std::process::ExitCode;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{Config, Error, Result};
use engine::{http::build_client, FeedJob, FuturesClient, JobConfig, TaapiClient};
use gist::GistClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // ── Logging ──────────────────────────────────────────────────────────────
    // stdout is reserved for the published URL.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(raw_url) => {
            println!("{raw_url}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", failure_line(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<String> {
    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env()?;
    info!(symbol = %cfg.symbol, exchange = %cfg.exchange, "LayerFeed starting");

    // ── Clients ───────────────────────────────────────────────────────────────
    let http = build_client(cfg.http_timeout)?;
    let source = TaapiClient::new(
        cfg.taapi_secret.clone(),
        cfg.exchange.clone(),
        cfg.taapi_url.clone(),
        http.clone(),
    );
    let store = GistClient::new(
        cfg.gist_id.clone(),
        cfg.gist_token.clone(),
        cfg.gist_api_url.clone(),
        http.clone(),
    );

    // ── Job ───────────────────────────────────────────────────────────────────
    let mut job = FeedJob::new(JobConfig::from(&cfg), Arc::new(source), Arc::new(store));
    if cfg.include_futures {
        info!(url = %cfg.futures_api_url, "Futures context enabled");
        job = job.with_futures(FuturesClient::new(cfg.futures_api_url.clone(), http));
    }

    let stored = job.run().await?;
    Ok(stored.raw_url.to_string())
}

/// The single stderr line reported for a failed run.
fn failure_line(err: &Error) -> String {
    format!("error: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ConfigError;

    #[test]
    fn failure_is_one_prefixed_line() {
        let mut missing = ConfigError::default();
        missing.missing("TAAPI_SECRET");
        missing.missing("GIST_TOKEN");

        let line = failure_line(&Error::from(missing));
        assert_eq!(
            line,
            "error: Configuration error: missing required keys: TAAPI_SECRET, GIST_TOKEN"
        );
        assert!(!line.contains('\n'));
    }
}
