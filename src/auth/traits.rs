//! Connection probe trait definition.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ProbeError, Result};
use crate::registry::{ProtocolVariant, ServerEntry};

/// Username and password as received from the login form.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Trait for a single authenticate-only attempt against one host.
///
/// Implementations must be thread-safe (`Send + Sync`) for use across
/// async tasks.
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    /// Attempt to log in to `entry` and close the session right away.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The server accepted the credentials
    /// * `Ok(false)` - The server rejected the credentials
    /// * `Err(error)` - The host could not be asked (network, TLS, protocol)
    async fn probe(
        &self,
        entry: &ServerEntry,
        credentials: &Credentials,
    ) -> std::result::Result<bool, ProbeError>;

    /// Get the name of this probe.
    ///
    /// Used for logging and debugging purposes.
    fn name(&self) -> &'static str;
}

/// Builds the probe used for a given server type.
///
/// Returns [`AuthError::ProbeUnavailable`] when the capability needed for
/// that server type is missing from this deployment.
///
/// [`AuthError::ProbeUnavailable`]: crate::error::AuthError::ProbeUnavailable
pub trait ProbeFactory: Send + Sync {
    fn build(&self, protocol: ProtocolVariant) -> Result<Arc<dyn ConnectionProbe>>;
}
