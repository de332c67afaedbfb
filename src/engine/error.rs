//! Engine error types

use serde::Serialize;
use thiserror::Error;

/// Engine call failure with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Network, message)
    }

    pub fn quota(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Quota, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Timeout, message)
    }

    pub fn malformed_output(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::MalformedOutput, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Auth, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Unknown, message)
    }
}

/// Error classification
///
/// Nothing in this crate retries on any of these; the kind is reported to the
/// caller so an outer layer can decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorKind {
    /// Connection failures, unreachable endpoint
    Network,
    /// Rate limited or quota exhausted (429)
    Quota,
    /// No answer within the configured bound
    Timeout,
    /// Response could not be interpreted as engine output
    MalformedOutput,
    /// Engine-side failure (5xx)
    ServerError,
    /// Authentication failed (401, 403)
    Auth,
    /// Anything else
    Unknown,
}

impl EngineErrorKind {
    /// Whether an outer caller could reasonably try the same turn again
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Quota | Self::Timeout | Self::ServerError
        )
    }
}
