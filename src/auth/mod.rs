//! Multi-host IMAP authentication.
//!
//! Credentials are checked by logging in to each configured IMAP server in
//! turn until one accepts them:
//!
//! - [`ConnectionProbe`]: one authenticate-only attempt against one host
//! - [`ImapProbe`]: `ConnectionProbe` speaking IMAP via `async-imap`
//! - [`HostChain`]: tries registry hosts in order and reports which matched
//!
//! # Example
//!
//! ```ignore
//! use imap_plus_auth::auth::{Credentials, HostChain, ImapProbeFactory, ProbeFactory};
//!
//! let probe = ImapProbeFactory.build(settings.protocol).ok();
//! let chain = HostChain::new(settings.registry.clone(), probe);
//!
//! let attempt = chain.login(&Credentials::new("alice", "secret")).await?;
//! ```

mod chain;
mod imap;
mod tls;
mod traits;

pub use chain::{AuthenticationAttempt, HostChain};
pub use imap::{ImapProbe, ImapProbeFactory};
pub use traits::{ConnectionProbe, Credentials, ProbeFactory};

#[cfg(test)]
pub(crate) use chain::testing;
