//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// A credential was not supplied and could not be prompted for
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The bank portal rejected a request (bad login, expired session, ...)
    #[error("Bank error: {0}")]
    Bank(String),

    /// A ledger service answered with a non-2xx status
    #[error("Ledger error: HTTP {status} with response {body:?}")]
    Ledger { status: u16, body: String },

    /// The request never got a response
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a missing credential error
    pub fn missing_credential(field: impl Into<String>) -> Self {
        Self::MissingCredential(field.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a bank error
    pub fn bank(msg: impl Into<String>) -> Self {
        Self::Bank(msg.into())
    }

    /// Create a ledger status error
    pub fn ledger(status: u16, body: impl Into<String>) -> Self {
        Self::Ledger {
            status,
            body: body.into(),
        }
    }

    /// True for errors that an expired or wrong login typically causes
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Bank(_) | Self::Ledger { status: 401, .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Transport(format!("request timed out: {}", error))
        } else if error.is_connect() {
            Self::Transport(format!("unable to connect: {}", error))
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
