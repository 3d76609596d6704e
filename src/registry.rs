//! Configured IMAP hosts and the roles mapped to them.
//!
//! - [`HostRegistry`]: hosts in trial order, keyed by their configured index
//! - [`RoleMap`]: index -> system role granted to users who authenticate there

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Role value meaning "authenticated here, but assign no role".
pub const NO_ROLE: &str = "0";

/// How a probe talks to the IMAP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProtocolVariant {
    /// Cleartext IMAP
    #[default]
    #[serde(rename = "imap")]
    Plain,
    /// Implicit TLS with certificate validation
    #[serde(rename = "imapssl")]
    Ssl,
    /// Implicit TLS accepting any certificate
    #[serde(rename = "imapcert")]
    SslNoVerify,
    /// STARTTLS upgrade of a cleartext connection
    #[serde(rename = "imaptls")]
    Tls,
}

impl ProtocolVariant {
    /// The value stored in the configuration store.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVariant::Plain => "imap",
            ProtocolVariant::Ssl => "imapssl",
            ProtocolVariant::SslNoVerify => "imapcert",
            ProtocolVariant::Tls => "imaptls",
        }
    }

    /// Suffix used in connection target strings, e.g. `/imap/ssl`.
    fn target_suffix(&self) -> &'static str {
        match self {
            ProtocolVariant::Plain => "/imap",
            ProtocolVariant::Ssl => "/imap/ssl",
            ProtocolVariant::SslNoVerify => "/imap/ssl/novalidate-cert",
            ProtocolVariant::Tls => "/imap/tls",
        }
    }

    /// Whether the server certificate must chain to a trusted root.
    pub fn verifies_certificate(&self) -> bool {
        matches!(self, ProtocolVariant::Ssl | ProtocolVariant::Tls)
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolVariant {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "imap" => Ok(ProtocolVariant::Plain),
            "imapssl" => Ok(ProtocolVariant::Ssl),
            "imapcert" => Ok(ProtocolVariant::SslNoVerify),
            "imaptls" => Ok(ProtocolVariant::Tls),
            other => Err(AuthError::InvalidConfig(format!(
                "Unknown IMAP server type: {other:?}"
            ))),
        }
    }
}

/// One configured IMAP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub index: usize,
    pub address: String,
    pub protocol: ProtocolVariant,
    pub port: u16,
}

impl ServerEntry {
    /// Connection target, e.g. `mail.example.org:993/imap/ssl`.
    ///
    /// Used to identify the host in logs and probe errors.
    pub fn target(&self) -> String {
        format!(
            "{}:{}{}",
            self.address,
            self.port,
            self.protocol.target_suffix()
        )
    }

    /// Blank entries are never probed.
    pub fn is_blank(&self) -> bool {
        self.address.trim().is_empty()
    }
}

/// Hosts in the order they are tried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostRegistry {
    entries: Vec<ServerEntry>,
}

impl HostRegistry {
    /// Build a registry from arbitrary entries, ordered by index.
    ///
    /// Later entries with a duplicate index replace earlier ones.
    pub fn new(entries: impl IntoIterator<Item = ServerEntry>) -> Self {
        let by_index: BTreeMap<usize, ServerEntry> =
            entries.into_iter().map(|e| (e.index, e)).collect();
        Self {
            entries: by_index.into_values().collect(),
        }
    }

    /// Build a registry from indexed addresses sharing one protocol and port.
    ///
    /// Addresses that are blank after trimming are dropped; indices are kept
    /// so that role lookups still line up.
    pub fn from_hosts(
        hosts: &BTreeMap<usize, String>,
        protocol: ProtocolVariant,
        port: u16,
    ) -> Self {
        Self::new(hosts.iter().filter_map(|(&index, address)| {
            let address = address.trim();
            (!address.is_empty()).then(|| ServerEntry {
                index,
                address: address.to_string(),
                protocol,
                port,
            })
        }))
    }

    pub fn entries(&self) -> &[ServerEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServerEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_index(&self, index: usize) -> bool {
        self.entries.iter().any(|e| e.index == index)
    }
}

/// Host index -> role identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMap(BTreeMap<usize, String>);

impl RoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, role_id: impl Into<String>) {
        self.0.insert(index, role_id.into());
    }

    /// Raw configured role for an index, including the sentinel.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(&index).map(String::as_str)
    }

    /// Role that should actually be assigned for an index.
    ///
    /// Returns `None` when no role is configured or it is [`NO_ROLE`]. An
    /// empty value counts as [`NO_ROLE`].
    pub fn assignable(&self, index: usize) -> Option<&str> {
        self.get(index)
            .map(str::trim)
            .filter(|role| !role.is_empty() && *role != NO_ROLE)
    }

    /// Drop roles whose host is not in the registry.
    pub fn retain_hosts(&mut self, registry: &HostRegistry) {
        self.0.retain(|index, _| registry.contains_index(*index));
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().map(|(i, r)| (*i, r.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(usize, String)> for RoleMap {
    fn from_iter<T: IntoIterator<Item = (usize, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
