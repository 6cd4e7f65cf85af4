//! # Errors
//!
//! Two layers of errors live here:
//!
//! - [`TransportError`]: what a collaborator (push channel, poll endpoint,
//!   provisioning service) reports. These are passed through untouched.
//! - [`WaitError`]: what callers of the waiter and the client facade see.
//!
//! Predicate rejections are never errors; they are filtered and traced.

use std::time::Duration;
use thiserror::Error;

/// Boxed error returned by a concurrently-run action.
pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

/// Failures reported by the underlying transports.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be performed at all.
    #[error("Request failed: {0}")]
    Request(String),

    /// The remote end answered with a non-success status.
    #[error("Remote returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The push channel was closed by the remote end.
    #[error("Push channel closed")]
    ChannelClosed,

    /// A frame received on the push channel could not be decoded.
    #[error("Malformed push frame: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

/// Errors surfaced by wait operations and the client facade.
#[derive(Debug, Error)]
pub enum WaitError {
    /// Credentials were not configured before an authenticated operation.
    #[error("Api key not set; configure credentials before calling {operation}")]
    Unauthenticated { operation: &'static str },

    /// Nothing matching arrived within the budget.
    #[error("Timed out after {0:?} waiting for email to arrive")]
    Timeout(Duration),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The action run alongside the wait failed.
    #[error("Concurrent action failed: {0}")]
    ActionFailure(#[source] ActionError),

    #[error("Invalid mailbox address: {0:?}")]
    InvalidAddress(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A spawned wait was torn down before it settled.
    #[error("Wait cancelled")]
    Cancelled,

    /// A spawned wait task panicked or was aborted by the runtime.
    #[error("Wait task failed: {0}")]
    TaskFailed(String),
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout(_))
    }
}

/// Configuration problems detected while building an [`EtaConfig`](crate::config::EtaConfig).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Both {key_var} and {secret_var} must be set, or neither")]
    PartialCredentials {
        key_var: &'static str,
        secret_var: &'static str,
    },

    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}
