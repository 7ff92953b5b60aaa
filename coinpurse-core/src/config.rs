//! Configuration management
//!
//! Settings live in `settings.json` inside the coinpurse directory:
//! ```json
//! {
//!   "plaid": { "clientId": "...", "secret": "...", "environment": "development",
//!              "accessTokens": "access-a access-b" },
//!   "fetch": { "pageSize": 100, "concurrent": false, "timeoutSecs": 30 }
//! }
//! ```
//! Environment variables override the file; CLI flags override both.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapters::plaid::{
    PlaidClient, PlaidCredentials, PlaidEnvironment, DEFAULT_TIMEOUT_SECS,
};
use crate::domain::result::{Error, Result};
use crate::services::{FetchOptions, FetchStrategy, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const DIR_ENV: &str = "COINPURSE_DIR";
pub const CLIENT_ID_ENV: &str = "PLAID_CLIENT_ID";
pub const SECRET_ENV: &str = "PLAID_SECRET";
pub const ENVIRONMENT_ENV: &str = "PLAID_ENV";
pub const BASE_URL_ENV: &str = "PLAID_BASE_URL";
pub const ACCESS_TOKENS_ENV: &str = "PLAID_ACCESS_TOKENS";
pub const CONCURRENT_ENV: &str = "COINPURSE_CONCURRENT";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    plaid: PlaidSettings,
    #[serde(default)]
    fetch: FetchSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaidSettings {
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    secret: Option<String>,
    #[serde(default)]
    environment: Option<PlaidEnvironment>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    access_tokens: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FetchSettings {
    #[serde(default)]
    page_size: Option<u32>,
    #[serde(default)]
    concurrent: bool,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

/// Coinpurse configuration (merged view of file and environment)
#[derive(Clone)]
pub struct Config {
    pub client_id: Option<String>,
    pub secret: Option<String>,
    pub environment: PlaidEnvironment,
    /// Overrides the environment's host when set
    pub base_url: Option<String>,
    /// Space-separated access tokens
    pub access_tokens: Option<String>,
    pub page_size: u32,
    pub strategy: FetchStrategy,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: None,
            secret: None,
            environment: PlaidEnvironment::default(),
            base_url: None,
            access_tokens: None,
            page_size: DEFAULT_PAGE_SIZE,
            strategy: FetchStrategy::Sequential,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field(
                "access_tokens",
                &self.access_tokens.as_ref().map(|t| t.split(' ').count()),
            )
            .field("page_size", &self.page_size)
            .field("strategy", &self.strategy)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Get the coinpurse directory from environment or default
pub fn default_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".coinpurse"))
        .ok_or_else(|| Error::config("Could not find home directory"))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "true" | "1" | "yes" | "TRUE" | "YES" => Some(true),
        "false" | "0" | "no" | "FALSE" | "NO" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load config from a coinpurse directory, applying process environment overrides
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_with_env(dir, |key| std::env::var(key).ok())
    }

    /// Load config with an explicit environment lookup
    pub fn load_with_env<F>(dir: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings_path = dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content)?
        } else {
            SettingsFile::default()
        };

        let environment = match env(ENVIRONMENT_ENV) {
            Some(value) => value.parse()?,
            None => raw.plaid.environment.unwrap_or_default(),
        };

        let concurrent = env(CONCURRENT_ENV)
            .as_deref()
            .and_then(parse_flag)
            .unwrap_or(raw.fetch.concurrent);

        Ok(Self {
            client_id: env(CLIENT_ID_ENV).or(raw.plaid.client_id),
            secret: env(SECRET_ENV).or(raw.plaid.secret),
            environment,
            base_url: env(BASE_URL_ENV).or(raw.plaid.base_url),
            access_tokens: env(ACCESS_TOKENS_ENV).or(raw.plaid.access_tokens),
            page_size: raw.fetch.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            strategy: if concurrent {
                FetchStrategy::Concurrent
            } else {
                FetchStrategy::Sequential
            },
            timeout_secs: raw.fetch.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Service credentials, failing if either half is missing
    pub fn credentials(&self) -> Result<PlaidCredentials> {
        match (&self.client_id, &self.secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Ok(PlaidCredentials::new(id.clone(), secret.clone()))
            }
            _ => Err(Error::config(format!(
                "Plaid client ID and secret are required (set {} and {})",
                CLIENT_ID_ENV, SECRET_ENV
            ))),
        }
    }

    /// The configured space-separated access token list
    pub fn access_tokens(&self) -> Result<&str> {
        self.access_tokens.as_deref().ok_or_else(|| {
            Error::config(format!(
                "No access tokens configured (set {})",
                ACCESS_TOKENS_ENV
            ))
        })
    }

    pub fn fetch_options(&self) -> Result<FetchOptions> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::config(format!(
                "Page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }

        Ok(FetchOptions {
            page_size: Some(self.page_size),
            strategy: self.strategy,
        })
    }

    /// Build the HTTP client described by this configuration
    pub fn plaid_client(&self) -> Result<PlaidClient> {
        if self.timeout_secs == 0 {
            return Err(Error::config("Request timeout must be at least 1 second"));
        }

        let base_url = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url());

        PlaidClient::new_with_base_url(
            self.credentials()?,
            base_url,
            Duration::from_secs(self.timeout_secs),
        )
    }
}
