use std::io;

use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;

/// A server mode could not be resolved from the command line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModeError {
    #[error("unknown mode '{name}', expected one of {valid}")]
    Unknown { name: String, valid: String },

    #[error("no mode set, expected one of {valid}")]
    Missing { valid: String },
}

/// The process could not get as far as serving.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("can't install log subscriber: {source}")]
    Logging {
        #[from]
        source: SetGlobalDefaultError,
    },
}

/// An exchange of the echo client failed.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("server answered with status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("server closed the connection")]
    Closed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ClientError {
    pub fn invalid_url<S: ToString>(url: &str, reason: S) -> Self {
        Self::InvalidUrl { url: url.to_owned(), reason: reason.to_string() }
    }

    pub fn invalid_response<S: ToString>(reason: S) -> Self {
        Self::InvalidResponse { reason: reason.to_string() }
    }
}
