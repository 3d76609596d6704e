//! Error types for IMAP authentication.
//!
//! Two layers of errors exist:
//!
//! 1. [`AuthError`] is what callers of this crate see. Only configuration and
//!    collaborator failures are reported here; a rejected login is never an
//!    error, it is an unsuccessful [`AuthenticationAttempt`].
//!
//! 2. [`ProbeError`] describes why a single host did not accept a login. It is
//!    logged for operators and then folded into "try the next host", so callers
//!    can never tell a wrong password from an unreachable server.
//!
//! [`AuthenticationAttempt`]: crate::auth::AuthenticationAttempt

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    /// No usable IMAP client capability. Logins are denied until an operator
    /// fixes the deployment.
    #[error("IMAP authentication is unavailable: {0}")]
    ProbeUnavailable(String),

    #[error("Role assignment failed: {0}")]
    RoleAssignment(String),

    #[error("Configuration store error: {0}")]
    Store(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::InvalidConfig(err.to_string())
    }
}

/// Failure of a single host probe.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to connect to {target}: {message}")]
    Connect { target: String, message: String },

    #[error("TLS setup with {target} failed: {message}")]
    Tls { target: String, message: String },

    #[error("No answer from {target} within {timeout:?}")]
    Timeout { target: String, timeout: Duration },

    #[error("{target} sent no IMAP greeting")]
    Greeting { target: String },

    #[error("IMAP protocol error from {target}: {message}")]
    Protocol { target: String, message: String },
}

impl ProbeError {
    /// Whether the host could not be talked to at all, as opposed to a host
    /// that answered but misbehaved.
    ///
    /// Only used to pick a log level.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProbeError::Connect { .. } | ProbeError::Tls { .. } | ProbeError::Timeout { .. }
        )
    }
}
