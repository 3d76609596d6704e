//! Configuration store trait definition.
//!
//! The host system owns settings persistence; this crate only needs flat
//! key/value access inside one namespace.

use crate::error::Result;

/// Namespace holding this plugin's settings.
pub const NAMESPACE: &str = "auth/imap_plus";

/// Trait for flat key/value settings storage.
///
/// Implementations must be thread-safe (`Send + Sync`) since settings can be
/// saved from an admin request while logins are running.
pub trait ConfigStore: Send + Sync {
    /// All keys currently set in a namespace.
    fn keys(&self, namespace: &str) -> Result<Vec<String>>;

    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>>;

    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn unset(&self, namespace: &str, key: &str) -> Result<()>;
}
