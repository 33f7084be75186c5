use thiserror::Error;

use crate::retry::AttemptFailure;

/// Failure to obtain any HTTP response (connection, DNS, timeout, body read).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Why a single request/validate/parse attempt failed.
///
/// Every variant is retried the same way; the last one is carried by
/// [`VaultError::RequestFailed`] once the retry budget is spent.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("Vault request error: {0}")]
    Transport(#[from] TransportError),

    #[error("Vault responded with HTTP status code {status}, expected {expected}")]
    UnexpectedStatus { expected: u16, status: u16 },

    #[error("Vault responded with MIME type: {0}")]
    UnexpectedContentType(String),

    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    #[error("Malformed response envelope: {0}")]
    MalformedEnvelope(String),
}

impl AttemptError {
    /// Short category name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::UnexpectedStatus { .. } => "unexpected-status",
            Self::UnexpectedContentType(_) => "unexpected-content-type",
            Self::MalformedBody(_) => "malformed-body",
            Self::MalformedEnvelope(_) => "malformed-envelope",
        }
    }
}

impl AttemptFailure for AttemptError {
    fn kind(&self) -> &'static str {
        AttemptError::kind(self)
    }
}

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault not detected: VAULT_ADDR not set")]
    VaultNotDetected,

    #[error("Vault token not configured: VAULT_TOKEN not set")]
    TokenNotConfigured,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid secret path: {0:?}")]
    InvalidPath(String),

    #[error("Vault request failed after {attempts} attempt(s): {source}")]
    RequestFailed {
        attempts: u32,
        #[source]
        source: AttemptError,
    },

    #[error("Vault operation cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VaultError {
    /// The last per-attempt failure, if the operation reached the retry loop.
    pub fn attempt_error(&self) -> Option<&AttemptError> {
        match self {
            Self::RequestFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
