//! Result and error types for the core library

use thiserror::Error;

/// Zoho error codes that mean the OAuth token was rejected
const AUTH_ERROR_CODES: &[i64] = &[14, 57];

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// Credential issuance failed (bad secret, issuer unreachable, no token)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Ledger call returned a non-success status or an embedded error code
    #[error("Ledger API error (HTTP {status}): {body}")]
    LedgerApi { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a ledger API error
    pub fn ledger_api(status: u16, body: impl Into<String>) -> Self {
        Self::LedgerApi {
            status,
            body: body.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the ledger rejected the credential (expired or invalid token)
    ///
    /// Zoho answers with HTTP 401, and some endpoints wrap the same failure
    /// in a 200 body carrying code 14 or 57.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::LedgerApi { status: 401, .. } => true,
            Self::LedgerApi { body, .. } => serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("code").and_then(|c| c.as_i64()))
                .map(|code| AUTH_ERROR_CODES.contains(&code))
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Network(format!("request timed out: {}", error))
        } else if error.is_connect() {
            Self::Network(format!("unable to connect: {}", error))
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
