//! Error types for the sender

use std::path::PathBuf;

use lettre::transport::smtp;
use thiserror::Error;

/// Exit code for usage, validation, file and composition failures.
pub const EXIT_FAILURE: u8 = 1;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid address '{address}': {source}")]
    Address {
        address: String,
        source: lettre::address::AddressError,
    },

    #[error("Invalid envelope: {0}")]
    Envelope(#[from] lettre::error::Error),

    #[error("Failed to read {}: {source}", .path.display())]
    BodyFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read token file {}: {source}", .path.display())]
    TokenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed token file {}: {source}", .path.display())]
    TokenFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to build message: {0}")]
    Compose(String),

    #[error("Send failed: {0}")]
    Transport(#[from] smtp::Error),
}

impl SenderError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Transport(err) => TransportFailure::classify(err).exit_code(),
            _ => EXIT_FAILURE,
        }
    }
}

/// Stage at which a submission attempt failed.
///
/// Exit codes follow curl's numbering, so wrappers written against the
/// curl-based sender keep interpreting them the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    Connection,
    MalformedReply,
    Timeout,
    Tls,
    Client,
    AuthRejected,
    Rejected,
}

impl TransportFailure {
    pub fn classify(err: &smtp::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_tls() {
            Self::Tls
        } else if err.is_client() {
            Self::Client
        } else if err.is_transient() || err.is_permanent() {
            Self::from_reply_code(err.status().map(u16::from))
        } else if err.is_response() {
            Self::MalformedReply
        } else {
            Self::Connection
        }
    }

    /// Classifies a negative server reply by its three-digit code.
    pub fn from_reply_code(code: Option<u16>) -> Self {
        match code {
            Some(454) | Some(530) | Some(534) | Some(535) => Self::AuthRejected,
            _ => Self::Rejected,
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            Self::Connection => 7,
            Self::MalformedReply => 8,
            Self::Timeout => 28,
            Self::Tls => 35,
            Self::Rejected => 55,
            Self::Client => 64,
            Self::AuthRejected => 67,
        }
    }
}
