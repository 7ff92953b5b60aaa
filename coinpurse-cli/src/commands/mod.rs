//! CLI command implementations

pub mod institutions;
pub mod summary;
pub mod transactions;

use anyhow::{Context, Result};
use clap::Args;
use coinpurse_core::config::{self, Config};
use coinpurse_core::{FetchStrategy, PlaidClient, TransactionAggregator};
use tracing_subscriber::EnvFilter;

/// Environment variable controlling the log filter
const LOG_ENV: &str = "COINPURSE_LOG";

/// Upstream connection flags shared by every command
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Plaid client ID
    #[arg(long, env = config::CLIENT_ID_ENV, global = true, hide_env_values = true)]
    pub client_id: Option<String>,

    /// Plaid secret
    #[arg(long, env = config::SECRET_ENV, global = true, hide_env_values = true)]
    pub secret: Option<String>,

    /// Plaid environment (sandbox, development, production)
    #[arg(long = "env", env = config::ENVIRONMENT_ENV, global = true)]
    pub environment: Option<String>,

    /// Space-separated access tokens
    #[arg(long, env = config::ACCESS_TOKENS_ENV, global = true, hide_env_values = true)]
    pub tokens: Option<String>,

    /// Override the Plaid host (e.g. a local mock)
    #[arg(long, env = config::BASE_URL_ENV, global = true)]
    pub base_url: Option<String>,
}

/// Install the stderr tracing subscriber
///
/// `COINPURSE_LOG` wins over `--verbose`; the default only shows warnings.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load settings.json, then apply command-line overrides
pub fn load_config(args: &ConnectionArgs) -> Result<Config> {
    let dir = config::default_dir()?;
    let mut config =
        Config::load(&dir).with_context(|| format!("Failed to load settings from {:?}", dir))?;

    if let Some(id) = &args.client_id {
        config.client_id = Some(id.clone());
    }
    if let Some(secret) = &args.secret {
        config.secret = Some(secret.clone());
    }
    if let Some(env) = &args.environment {
        config.environment = env.parse()?;
    }
    if let Some(tokens) = &args.tokens {
        config.access_tokens = Some(tokens.clone());
    }
    if let Some(url) = &args.base_url {
        config.base_url = Some(url.clone());
    }

    Ok(config)
}

/// Resolve every configured access token against Plaid
pub fn connect(
    args: &ConnectionArgs,
    concurrent: bool,
) -> Result<TransactionAggregator<PlaidClient>> {
    let mut config = load_config(args)?;
    if concurrent {
        config.strategy = FetchStrategy::Concurrent;
    }

    TransactionAggregator::connect(&config).context("Failed to resolve access tokens")
}
