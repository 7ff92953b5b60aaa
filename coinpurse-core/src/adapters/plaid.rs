//! Plaid API client
//!
//! Handles communication with the Plaid REST API for institution lookup and
//! transaction retrieval. Every endpoint is a JSON `POST` carrying the
//! client credentials in the body.
//!
//! API Documentation: https://plaid.com/docs/api/

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::result::{Error, Result};
use crate::ports::{
    AccountsGetResponse, FinancialDataApi, InstitutionsGetByIdResponse, TransactionsGetRequest,
    TransactionsGetResponse,
};

/// Default transport timeout for a single request
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Plaid error codes that mean the credentials or the access token are bad
const AUTHENTICATION_ERROR_CODES: &[&str] = &[
    "INVALID_API_KEYS",
    "INVALID_ACCESS_TOKEN",
    "UNAUTHORIZED_ENVIRONMENT",
    "ITEM_LOGIN_REQUIRED",
];

// =============================================================================
// Environment and credentials
// =============================================================================

/// Plaid host selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaidEnvironment {
    Sandbox,
    #[default]
    Development,
    Production,
}

impl PlaidEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            PlaidEnvironment::Sandbox => "https://sandbox.plaid.com",
            PlaidEnvironment::Development => "https://development.plaid.com",
            PlaidEnvironment::Production => "https://production.plaid.com",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaidEnvironment::Sandbox => "sandbox",
            PlaidEnvironment::Development => "development",
            PlaidEnvironment::Production => "production",
        }
    }
}

impl fmt::Display for PlaidEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaidEnvironment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(PlaidEnvironment::Sandbox),
            "development" | "dev" => Ok(PlaidEnvironment::Development),
            "production" | "prod" => Ok(PlaidEnvironment::Production),
            other => Err(Error::config(format!(
                "Unknown Plaid environment '{}' (expected sandbox, development or production)",
                other
            ))),
        }
    }
}

/// Service-level credentials, forwarded unchanged on every request
#[derive(Clone)]
pub struct PlaidCredentials {
    pub client_id: String,
    pub secret: String,
}

impl PlaidCredentials {
    pub fn new(client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for PlaidCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaidCredentials")
            .field("client_id", &self.client_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Serialize)]
struct Authenticated<'a, B: Serialize> {
    client_id: &'a str,
    secret: &'a str,
    #[serde(flatten)]
    body: B,
}

#[derive(Serialize)]
struct AccountsGetBody<'a> {
    access_token: &'a str,
}

#[derive(Serialize)]
struct InstitutionsGetByIdBody<'a> {
    institution_id: &'a str,
    country_codes: Vec<&'a str>,
}

#[derive(Serialize)]
struct TransactionsGetBody<'a> {
    access_token: &'a str,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<TransactionsGetOptions>,
}

#[derive(Serialize)]
struct TransactionsGetOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u32>,
}

impl<'a> From<&'a TransactionsGetRequest> for TransactionsGetBody<'a> {
    fn from(request: &'a TransactionsGetRequest) -> Self {
        let options = if request.count.is_some() || request.offset.is_some() {
            Some(TransactionsGetOptions {
                count: request.count,
                offset: request.offset,
            })
        } else {
            None
        };

        Self {
            access_token: &request.access_token,
            start_date: request.start_date,
            end_date: request.end_date,
            options,
        }
    }
}

/// Plaid error payload
#[derive(Debug, Deserialize)]
struct PlaidErrorBody {
    #[serde(default)]
    error_type: String,
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    error_message: String,
}

// =============================================================================
// Plaid HTTP Client
// =============================================================================

/// Plaid API client
#[derive(Debug)]
pub struct PlaidClient {
    client: Client,
    base_url: String,
    credentials: PlaidCredentials,
    timeout: Duration,
}

impl PlaidClient {
    /// Create a client for one of the hosted Plaid environments
    pub fn new(credentials: PlaidCredentials, environment: PlaidEnvironment) -> Result<Self> {
        Self::new_with_base_url(
            credentials,
            environment.base_url(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a client against an explicit base URL (mock servers, proxies)
    pub fn new_with_base_url(
        credentials: PlaidCredentials,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        if credentials.client_id.is_empty() || credentials.secret.is_empty() {
            return Err(Error::config("Plaid client ID and secret cannot be empty"));
        }

        let parsed = Url::parse(base_url)
            .map_err(|e| Error::config(format!("Invalid Plaid base URL '{}': {}", base_url, e)))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(Error::config("Plaid base URL must use HTTP or HTTPS"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST an authenticated JSON body and decode the response
    fn post<B, R>(&self, path: &str, body: B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let payload = Authenticated {
            client_id: &self.credentials.client_id,
            secret: &self.credentials.secret,
            body,
        };

        tracing::debug!(endpoint = path, "plaid request");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(map_error_response(status.as_u16(), &text));
        }

        let text = response
            .text()
            .map_err(|e| self.map_request_error(e))?;
        serde_json::from_str(&text).map_err(|e| {
            Error::data_shape(format!("Failed to parse Plaid {} response: {}", path, e))
        })
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::transport(format!(
                "Connection timed out after {} seconds",
                self.timeout.as_secs()
            ))
        } else if error.is_connect() {
            Error::transport(format!("Unable to connect to Plaid at {}", self.base_url))
        } else {
            Error::transport(format!("Plaid request failed: {}", error))
        }
    }
}

/// Map a non-2xx Plaid response to the error taxonomy
fn map_error_response(status: u16, body: &str) -> Error {
    let parsed: Option<PlaidErrorBody> = serde_json::from_str(body).ok();

    let Some(err) = parsed else {
        if status == 401 || status == 403 {
            return Error::authentication(format!("Plaid rejected the request (HTTP {})", status));
        }
        return Error::Api {
            status,
            error_type: "UNKNOWN".to_string(),
            error_code: "UNKNOWN".to_string(),
            message: body.trim().to_string(),
        };
    };

    if status == 401
        || status == 403
        || AUTHENTICATION_ERROR_CODES.contains(&err.error_code.as_str())
    {
        return Error::authentication(format!("{}: {}", err.error_code, err.error_message));
    }

    Error::Api {
        status,
        error_type: err.error_type,
        error_code: err.error_code,
        message: err.error_message,
    }
}

impl FinancialDataApi for PlaidClient {
    fn name(&self) -> &str {
        "plaid"
    }

    fn accounts_get(&self, access_token: &str) -> Result<AccountsGetResponse> {
        self.post("/accounts/get", AccountsGetBody { access_token })
    }

    fn institutions_get_by_id(
        &self,
        institution_id: &str,
        country_code: &str,
    ) -> Result<InstitutionsGetByIdResponse> {
        self.post(
            "/institutions/get_by_id",
            InstitutionsGetByIdBody {
                institution_id,
                country_codes: vec![country_code],
            },
        )
    }

    fn transactions_get(
        &self,
        request: &TransactionsGetRequest,
    ) -> Result<TransactionsGetResponse> {
        self.post("/transactions/get", TransactionsGetBody::from(request))
    }
}

// =============================================================================
// Tests
// =============================================================================
