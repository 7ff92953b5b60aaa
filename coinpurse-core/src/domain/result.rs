//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
///
/// Upstream failures are surfaced as-is: nothing in the core retries,
/// downgrades or swallows an error.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid client credentials or an invalid/malformed access token
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Network, connection or timeout failure talking to the upstream service
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed date input
    #[error("Parse error: {0}")]
    Parse(String),

    /// Upstream response is missing fields or cannot be decoded
    #[error("Unexpected upstream response: {0}")]
    UpstreamDataShape(String),

    /// Any other error reported by the upstream service
    #[error("Plaid API error (HTTP {status}, {error_type}/{error_code}): {message}")]
    Api {
        status: u16,
        error_type: String,
        error_code: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an upstream data shape error
    pub fn data_shape(msg: impl Into<String>) -> Self {
        Self::UpstreamDataShape(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for JSON output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a successful result with context
    pub fn ok_with_context(data: T, context: HashMap<String, serde_json::Value>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: Some(context),
        }
    }
}
