//! Host chain for trying configured IMAP servers in order.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::DEFAULT_PROBE_TIMEOUT_SECS;
use crate::error::{AuthError, ProbeError, Result};
use crate::registry::HostRegistry;

use super::traits::{ConnectionProbe, Credentials};

/// Outcome of one login call.
///
/// Returned by value so the matched host travels with the request that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticationAttempt {
    /// Correlates log lines of one login
    pub attempt_id: Uuid,
    pub succeeded: bool,
    /// Index of the host that accepted the credentials
    pub matched_index: Option<usize>,
    /// Number of hosts actually probed
    pub hosts_tried: usize,
    /// Role mapped to the matched host when the login ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
}

/// Authentication chain that tries registry hosts in order.
///
/// Hosts are tried in ascending index order, one at a time. The first host
/// that accepts the credentials stops the chain. A host that rejects the
/// credentials, cannot be reached, or times out is treated the same way:
/// the next host is tried. No host is tried twice in one login.
///
/// # Example
///
/// ```ignore
/// let chain = HostChain::new(settings.registry.clone(), Some(probe))
///     .with_probe_timeout(Duration::from_secs(5));
///
/// let attempt = chain.login(&Credentials::new("alice", "secret")).await?;
/// ```
pub struct HostChain {
    registry: HostRegistry,
    probe: Option<Arc<dyn ConnectionProbe>>,
    probe_timeout: Duration,
}

impl HostChain {
    /// Create a chain over `registry`.
    ///
    /// `probe` is `None` when the deployment has no working IMAP client;
    /// every login then fails with [`AuthError::ProbeUnavailable`].
    pub fn new(registry: HostRegistry, probe: Option<Arc<dyn ConnectionProbe>>) -> Self {
        Self {
            registry,
            probe,
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
        }
    }

    /// Set the time limit for each host.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Whether a probe capability is present.
    pub fn is_available(&self) -> bool {
        self.probe.is_some()
    }

    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    /// Try the credentials against each host until one accepts them.
    ///
    /// # Returns
    ///
    /// * `Ok(attempt)` - `attempt.succeeded` tells whether any host accepted
    /// * `Err(AuthError::ProbeUnavailable)` - no IMAP client capability; no
    ///   host was contacted
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthenticationAttempt> {
        let attempt_id = Uuid::new_v4();

        let Some(probe) = self.probe.as_ref() else {
            error!(
                "Login {} for {} denied: IMAP authentication is not available",
                attempt_id, credentials.username
            );
            return Err(AuthError::ProbeUnavailable(
                "no IMAP client capability is configured".to_string(),
            ));
        };

        let mut hosts_tried = 0;
        for entry in self.registry.iter() {
            if entry.is_blank() {
                continue;
            }
            hosts_tried += 1;
            let target = entry.target();
            debug!(
                "Login {}: trying host {} ({}) with probe {}",
                attempt_id,
                entry.index,
                target,
                probe.name()
            );

            let outcome = tokio::time::timeout(self.probe_timeout, probe.probe(entry, credentials))
                .await
                .unwrap_or_else(|_| {
                    Err(ProbeError::Timeout {
                        target: target.clone(),
                        timeout: self.probe_timeout,
                    })
                });

            match outcome {
                Ok(true) => {
                    info!(
                        "Login {}: {} authenticated against host {} ({})",
                        attempt_id, credentials.username, entry.index, target
                    );
                    return Ok(AuthenticationAttempt {
                        attempt_id,
                        succeeded: true,
                        matched_index: Some(entry.index),
                        hosts_tried,
                        role_id: None,
                    });
                }
                Ok(false) => {
                    debug!(
                        "Login {}: host {} rejected credentials for {}",
                        attempt_id, entry.index, credentials.username
                    );
                }
                Err(e) if e.is_transport() => {
                    warn!("Login {}: host {} unavailable: {}", attempt_id, entry.index, e);
                }
                Err(e) => {
                    debug!("Login {}: host {} failed: {}", attempt_id, entry.index, e);
                }
            }
        }

        info!(
            "Login {}: no host accepted {} ({} tried)",
            attempt_id, credentials.username, hosts_tried
        );
        Ok(AuthenticationAttempt {
            attempt_id,
            succeeded: false,
            matched_index: None,
            hosts_tried,
            role_id: None,
        })
    }
}
