//! Error types for dialer operations
//!
//! Every fallible operation in this crate returns [`DialerResult`]. The
//! variants map onto the way the console reacts to a failure:
//!
//! - [`DialerError::SessionExpired`] ends the module session; the operator has
//!   to authenticate again.
//! - [`DialerError::Server`] and [`DialerError::Network`] are recovered
//!   locally: the message is surfaced and cached campaigns, lists and contacts
//!   stay as they were.
//! - [`DialerError::CallFailed`] stops auto-mode. The number is *not* marked as
//!   called, so a manual retry stays possible.
//! - [`DialerError::CallInProgress`], [`DialerError::AutoModeActive`] and
//!   [`DialerError::NoCurrentContact`] reject an operator action without
//!   touching any state.

use thiserror::Error;

/// Result alias used across the crate
pub type DialerResult<T> = Result<T, DialerError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DialerError {
    #[error("Session expired: authentication required")]
    SessionExpired,

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Call to {number} failed: {reason}")]
    CallFailed { number: String, reason: String },

    #[error("A call is already in progress")]
    CallInProgress,

    #[error("Auto-dial is active; stop it before dialing manually")]
    AutoModeActive,

    #[error("No contact is currently selected")]
    NoCurrentContact,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DialerError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    pub fn call_failed(number: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CallFailed { number: number.into(), reason: reason.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the console can keep going after this error.
    ///
    /// Only an expired session and a broken configuration are fatal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SessionExpired | Self::Config(_))
    }

    /// Short category label used in log lines and CLI output
    pub fn category(&self) -> &'static str {
        match self {
            Self::SessionExpired => "session",
            Self::Server { .. } | Self::Network(_) | Self::InvalidResponse(_) => "backend",
            Self::CallFailed { .. } => "call",
            Self::CallInProgress | Self::AutoModeActive | Self::NoCurrentContact => "operator",
            Self::Config(_) => "config",
        }
    }
}

impl From<reqwest::Error> for DialerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::server(status.as_u16(), err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DialerError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

impl From<config::ConfigError> for DialerError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<url::ParseError> for DialerError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid URL: {}", err))
    }
}
