//! Settings reconciliation and runtime tunables.
//!
//! Plugin settings live in a flat key/value namespace (see [`ConfigStore`])
//! where hosts and roles are stored under numbered keys:
//!
//! | Key | Example | Description |
//! |-----|---------|-------------|
//! | `host<N>` | `host0 = mail.example.org` | IMAP server address, tried in ascending `N` |
//! | `role<N>` | `role0 = 5` | Role granted to users matched by `host<N>` (`0` = none) |
//! | `type` | `imapssl` | One of `imap`, `imapssl`, `imapcert`, `imaptls` |
//! | `port` | `993` | Port shared by all hosts |
//! | `changepasswordurl` | `https://...` | External password change page |
//!
//! Reconciliation turns that sparse form into [`AuthSettings`] at load time
//! and turns submitted form data back into a dense numbered set at save time.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `IMAP_AUTH_PROBE_TIMEOUT` | 10s | Per-host probe timeout in seconds |

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::Result;
use crate::form::FormSubmission;
use crate::registry::{HostRegistry, NO_ROLE, ProtocolVariant, RoleMap};
use crate::storage::{ConfigStore, NAMESPACE};

/// Default IMAP port (cleartext / STARTTLS)
pub const DEFAULT_PORT: u16 = 143;

/// Placeholder host used when no host is configured at all
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Highest numbered key always cleared before saving
pub const MAX_LEGACY_INDEX: usize = 9;

/// Default per-host probe timeout in seconds
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Environment variable name for the per-host probe timeout
pub const PROBE_TIMEOUT_ENV_VAR: &str = "IMAP_AUTH_PROBE_TIMEOUT";

const HOST_PREFIX: &str = "host";
const ROLE_PREFIX: &str = "role";
const TYPE_KEY: &str = "type";
const PORT_KEY: &str = "port";
const CHANGE_PASSWORD_URL_KEY: &str = "changepasswordurl";

/// Settings exactly as read from the store.
pub type RawConfiguration = BTreeMap<String, String>;

/// Raw settings split into indexed hosts, indexed roles and everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedConfig {
    pub hosts: BTreeMap<usize, String>,
    pub roles: BTreeMap<usize, String>,
    pub scalars: BTreeMap<String, String>,
}

/// Fully reconciled plugin settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub registry: HostRegistry,
    pub roles: RoleMap,
    pub protocol: ProtocolVariant,
    pub port: u16,
    /// Empty means "use the host system's own password change flow".
    pub change_password_url: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        apply_defaults(ParsedConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexedKey {
    Host(usize),
    Role(usize),
}

/// Parse `host<N>` / `role<N>`. Anything else is a scalar key.
fn parse_indexed_key(key: &str) -> Option<IndexedKey> {
    fn index_suffix(key: &str, prefix: &str) -> Option<usize> {
        let digits = key.strip_prefix(prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // "host01" would otherwise collide with "host1"
        if digits.len() > 1 && digits.starts_with('0') {
            return None;
        }
        digits.parse().ok()
    }

    index_suffix(key, HOST_PREFIX)
        .map(IndexedKey::Host)
        .or_else(|| index_suffix(key, ROLE_PREFIX).map(IndexedKey::Role))
}

fn host_key(index: usize) -> String {
    format!("{HOST_PREFIX}{index}")
}

fn role_key(index: usize) -> String {
    format!("{ROLE_PREFIX}{index}")
}

/// Read every key of the plugin namespace.
pub fn read_raw(store: &dyn ConfigStore) -> Result<RawConfiguration> {
    let mut raw = RawConfiguration::new();
    for key in store.keys(NAMESPACE)? {
        if let Some(value) = store.get(NAMESPACE, &key)? {
            raw.insert(key, value);
        }
    }
    Ok(raw)
}

/// Split raw settings into indexed hosts and roles plus remaining scalars.
pub fn parse_raw(raw: RawConfiguration) -> ParsedConfig {
    let mut parsed = ParsedConfig::default();
    for (key, value) in raw {
        match parse_indexed_key(&key) {
            Some(IndexedKey::Host(index)) => {
                parsed.hosts.insert(index, value);
            }
            Some(IndexedKey::Role(index)) => {
                parsed.roles.insert(index, value);
            }
            None => {
                parsed.scalars.insert(key, value);
            }
        }
    }
    parsed
}

/// Fill unset values with defaults and build typed settings.
///
/// Blank hosts are dropped and roles without a surviving host are discarded.
/// If no host remains, a single loopback placeholder is used. Unparsable
/// `type` or `port` values fall back to their defaults.
pub fn apply_defaults(parsed: ParsedConfig) -> AuthSettings {
    let protocol = match parsed.scalars.get(TYPE_KEY) {
        Some(value) if !value.trim().is_empty() => match value.parse::<ProtocolVariant>() {
            Ok(protocol) => protocol,
            Err(e) => {
                warn!("{}; using {}", e, ProtocolVariant::default());
                ProtocolVariant::default()
            }
        },
        _ => ProtocolVariant::default(),
    };

    let port = match parsed.scalars.get(PORT_KEY) {
        Some(value) if !value.trim().is_empty() => match value.trim().parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ => {
                warn!("Invalid IMAP port {:?}; using {}", value, DEFAULT_PORT);
                DEFAULT_PORT
            }
        },
        _ => DEFAULT_PORT,
    };

    let change_password_url = parsed
        .scalars
        .get(CHANGE_PASSWORD_URL_KEY)
        .map(|url| url.trim().to_string())
        .unwrap_or_default();

    let mut registry = HostRegistry::from_hosts(&parsed.hosts, protocol, port);
    if registry.is_empty() {
        debug!("No IMAP hosts configured, using {}", DEFAULT_HOST);
        registry = HostRegistry::from_hosts(
            &BTreeMap::from([(0, DEFAULT_HOST.to_string())]),
            protocol,
            port,
        );
    }

    let mut roles: RoleMap = parsed
        .roles
        .into_iter()
        .map(|(index, role)| (index, role.trim().to_string()))
        .collect();
    roles.retain_hosts(&registry);

    AuthSettings {
        registry,
        roles,
        protocol,
        port,
        change_password_url,
    }
}

/// Load and reconcile settings from the store.
pub fn load_settings(store: &dyn ConfigStore) -> Result<AuthSettings> {
    Ok(apply_defaults(parse_raw(read_raw(store)?)))
}

/// Clean submitted settings before they are saved.
///
/// Hosts are trimmed and empty ones dropped; each surviving host keeps the
/// role submitted on its row. Both are then renumbered densely from 0.
pub fn normalize_for_persistence(submission: FormSubmission) -> AuthSettings {
    let FormSubmission {
        hosts,
        roles,
        protocol,
        port,
        change_password_url,
    } = submission;

    let mut parsed = ParsedConfig::default();
    let surviving = hosts
        .iter()
        .enumerate()
        .map(|(row, host)| (row, host.trim()))
        .filter(|(_, host)| !host.is_empty());

    for (index, (row, host)) in surviving.enumerate() {
        parsed.hosts.insert(index, host.to_string());
        if let Some(role) = roles.get(row) {
            parsed.roles.insert(index, role.trim().to_string());
        }
    }

    for (key, value) in [
        (TYPE_KEY, protocol),
        (PORT_KEY, port),
        (CHANGE_PASSWORD_URL_KEY, change_password_url),
    ] {
        if let Some(value) = value {
            parsed.scalars.insert(key.to_string(), value);
        }
    }

    apply_defaults(parsed)
}

/// Write settings to the store as a dense numbered set.
///
/// Every numbered key up to [`MAX_LEGACY_INDEX`], and any other numbered key
/// present, is cleared first so a shorter host list leaves nothing behind.
/// Hosts without a role are stored with [`NO_ROLE`].
pub fn persist(store: &dyn ConfigStore, settings: &AuthSettings) -> Result<()> {
    let mut stale: BTreeSet<String> = (0..=MAX_LEGACY_INDEX)
        .flat_map(|i| [host_key(i), role_key(i)])
        .collect();
    stale.extend(
        store
            .keys(NAMESPACE)?
            .into_iter()
            .filter(|key| parse_indexed_key(key).is_some()),
    );
    for key in &stale {
        store.unset(NAMESPACE, key)?;
    }

    for entry in settings.registry.iter() {
        let role = settings.roles.get(entry.index).unwrap_or(NO_ROLE);
        store.set(NAMESPACE, &host_key(entry.index), &entry.address)?;
        store.set(NAMESPACE, &role_key(entry.index), role)?;
    }

    store.set(NAMESPACE, TYPE_KEY, settings.protocol.as_str())?;
    store.set(NAMESPACE, PORT_KEY, &settings.port.to_string())?;
    store.set(
        NAMESPACE,
        CHANGE_PASSWORD_URL_KEY,
        &settings.change_password_url,
    )?;

    debug!(
        "Saved {} IMAP host(s), type={}, port={}",
        settings.registry.len(),
        settings.protocol,
        settings.port
    );
    Ok(())
}

/// Resolve the probe timeout with priority: parameter -> env var -> default
///
/// Zero is rejected at every level, since it would fail every host at once.
pub fn resolve_probe_timeout(timeout_param: Option<u64>) -> Duration {
    // Priority 1: Use parameter if provided
    if let Some(timeout) = timeout_param {
        if timeout > 0 {
            return Duration::from_secs(timeout);
        }
        warn!("Probe timeout of 0s ignored; using {}s", DEFAULT_PROBE_TIMEOUT_SECS);
        return Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS);
    }

    // Priority 2: Use environment variable if set
    if let Ok(env_timeout) = env::var(PROBE_TIMEOUT_ENV_VAR)
        && let Ok(timeout) = env_timeout.parse::<u64>()
    {
        if timeout > 0 {
            return Duration::from_secs(timeout);
        }
        warn!(
            "{}=0 ignored; using {}s",
            PROBE_TIMEOUT_ENV_VAR, DEFAULT_PROBE_TIMEOUT_SECS
        );
    }

    // Priority 3: Default value
    Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::SettingsForm;
    use crate::storage::MemoryConfigStore;
    use std::sync::Mutex as StdMutex;

    // Use a mutex to serialize env var tests to avoid race conditions
    static ENV_TEST_MUTEX: once_cell::sync::Lazy<StdMutex<()>> =
        once_cell::sync::Lazy::new(|| StdMutex::new(()));

    /// SAFETY: Must be called while holding ENV_TEST_MUTEX to prevent data races.
    unsafe fn set_env(key: &str, value: &str) {
        // SAFETY: Caller ensures ENV_TEST_MUTEX is held
        unsafe { env::set_var(key, value) };
    }

    /// SAFETY: Must be called while holding ENV_TEST_MUTEX to prevent data races.
    unsafe fn remove_env(key: &str) {
        // SAFETY: Caller ensures ENV_TEST_MUTEX is held
        unsafe { env::remove_var(key) };
    }

    fn raw(pairs: &[(&str, &str)]) -> RawConfiguration {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn submission(hosts: &[&str], roles: &[&str]) -> FormSubmission {
        FormSubmission {
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    fn addresses(settings: &AuthSettings) -> Vec<&str> {
        settings
            .registry
            .iter()
            .map(|e| e.address.as_str())
            .collect()
    }

    mod parse {
        use super::*;

        #[test]
        fn test_indexed_keys() {
            assert_eq!(parse_indexed_key("host0"), Some(IndexedKey::Host(0)));
            assert_eq!(parse_indexed_key("role12"), Some(IndexedKey::Role(12)));
            assert_eq!(parse_indexed_key("host"), None);
            assert_eq!(parse_indexed_key("hostname"), None);
            assert_eq!(parse_indexed_key("host1a"), None);
            assert_eq!(parse_indexed_key("port"), None);
            assert_eq!(parse_indexed_key("host00"), None);
            assert_eq!(parse_indexed_key("host01"), None);
            assert_eq!(parse_indexed_key("role007"), None);
            assert_eq!(parse_indexed_key("role10"), Some(IndexedKey::Role(10)));
        }

        #[test]
        fn test_parse_raw_groups_by_suffix() {
            let parsed = parse_raw(raw(&[
                ("host3", "mail.c.org"),
                ("host0", "mail.a.org"),
                ("role3", "7"),
                ("type", "imapssl"),
                ("port", "993"),
            ]));

            assert_eq!(parsed.hosts.keys().copied().collect::<Vec<_>>(), vec![0, 3]);
            assert_eq!(parsed.roles.get(&3).map(String::as_str), Some("7"));
            assert_eq!(parsed.scalars.len(), 2);
            assert!(!parsed.scalars.contains_key("host0"));
        }

        #[test]
        fn test_load_keeps_sparse_indices_for_role_lookup() {
            let settings = apply_defaults(parse_raw(raw(&[
                ("host1", "mail.a.org"),
                ("host4", "mail.b.org"),
                ("role1", "5"),
                ("role4", "6"),
            ])));

            let indices: Vec<_> = settings.registry.iter().map(|e| e.index).collect();
            assert_eq!(indices, vec![1, 4]);
            assert_eq!(settings.roles.assignable(4), Some("6"));
        }

        #[test]
        fn test_load_discards_roles_of_missing_hosts() {
            let settings = apply_defaults(parse_raw(raw(&[
                ("host0", "mail.a.org"),
                ("host1", "   "),
                ("role0", "5"),
                ("role1", "6"),
                ("role2", "7"),
            ])));

            assert_eq!(settings.registry.len(), 1);
            assert_eq!(settings.roles.len(), 1);
            assert_eq!(settings.roles.get(0), Some("5"));
        }
    }

    mod defaults {
        use super::*;

        #[test]
        fn test_empty_config_gets_defaults() {
            let settings = apply_defaults(ParsedConfig::default());
            assert_eq!(settings.protocol, ProtocolVariant::Plain);
            assert_eq!(settings.port, DEFAULT_PORT);
            assert_eq!(settings.change_password_url, "");
            assert_eq!(addresses(&settings), vec![DEFAULT_HOST]);
            assert!(settings.roles.is_empty());
        }

        #[test]
        fn test_explicit_values_are_kept() {
            let settings = apply_defaults(parse_raw(raw(&[
                ("host0", "mail.a.org"),
                ("type", "imaptls"),
                ("port", "10143"),
                ("changepasswordurl", " https://id.example.org/pw "),
            ])));

            assert_eq!(settings.protocol, ProtocolVariant::Tls);
            assert_eq!(settings.port, 10143);
            assert_eq!(settings.change_password_url, "https://id.example.org/pw");
            assert!(settings.registry.iter().all(|e| e.port == 10143));
        }

        #[test]
        fn test_invalid_scalars_fall_back() {
            let settings = apply_defaults(parse_raw(raw(&[
                ("type", "pop3"),
                ("port", "not-a-port"),
            ])));
            assert_eq!(settings.protocol, ProtocolVariant::Plain);
            assert_eq!(settings.port, DEFAULT_PORT);
        }

        #[test]
        fn test_port_zero_falls_back() {
            let settings = apply_defaults(parse_raw(raw(&[("port", "0")])));
            assert_eq!(settings.port, DEFAULT_PORT);
        }
    }

    mod normalize {
        use super::*;

        #[test]
        fn test_blank_first_host_is_removed_and_reindexed() {
            let settings = normalize_for_persistence(submission(
                &["", "mail.a.org", "mail.b.org"],
                &["5", "6", "7"],
            ));

            assert_eq!(addresses(&settings), vec!["mail.a.org", "mail.b.org"]);
            let indices: Vec<_> = settings.registry.iter().map(|e| e.index).collect();
            assert_eq!(indices, vec![0, 1]);
            assert_eq!(settings.roles.get(0), Some("6"));
            assert_eq!(settings.roles.get(1), Some("7"));
            assert_eq!(settings.roles.len(), 2);
        }

        #[test]
        fn test_role_of_whitespace_host_is_dropped() {
            let settings = normalize_for_persistence(submission(
                &["mail.a.org", "   ", "mail.c.org"],
                &["5", "6", "7"],
            ));

            let roles: Vec<_> = settings.roles.iter().map(|(_, r)| r).collect();
            assert_eq!(roles, vec!["5", "7"]);
            assert!(!roles.contains(&"6"));
        }

        #[test]
        fn test_trims_hosts_and_roles() {
            let settings =
                normalize_for_persistence(submission(&["  mail.a.org\t"], &[" 9 "]));
            assert_eq!(addresses(&settings), vec!["mail.a.org"]);
            assert_eq!(settings.roles.get(0), Some("9"));
        }

        #[test]
        fn test_missing_role_rows() {
            let settings =
                normalize_for_persistence(submission(&["mail.a.org", "mail.b.org"], &["5"]));
            assert_eq!(settings.roles.get(0), Some("5"));
            assert_eq!(settings.roles.get(1), None);
        }

        #[test]
        fn test_all_blank_hosts_get_placeholder() {
            let settings = normalize_for_persistence(submission(&["", " "], &["5", "6"]));
            assert_eq!(addresses(&settings), vec![DEFAULT_HOST]);
            assert!(settings.roles.is_empty());
        }

        #[test]
        fn test_scalars_pass_through() {
            let settings = normalize_for_persistence(FormSubmission {
                hosts: vec!["mail.a.org".to_string()],
                roles: vec![],
                protocol: Some("imapcert".to_string()),
                port: Some("993".to_string()),
                change_password_url: Some("https://id.example.org".to_string()),
            });
            assert_eq!(settings.protocol, ProtocolVariant::SslNoVerify);
            assert_eq!(settings.port, 993);
            assert_eq!(settings.change_password_url, "https://id.example.org");
        }

        #[test]
        fn test_idempotent_on_dense_settings() {
            let first = normalize_for_persistence(FormSubmission {
                hosts: vec!["mail.a.org".to_string(), "mail.b.org".to_string()],
                roles: vec!["5".to_string(), "0".to_string()],
                protocol: Some("imapssl".to_string()),
                port: Some("993".to_string()),
                change_password_url: None,
            });

            let resubmitted = SettingsForm::from_settings(&first).into_submission();
            let second = normalize_for_persistence(resubmitted);

            assert_eq!(first, second);
        }
    }

    mod persistence {
        use super::*;

        #[test]
        fn test_persist_writes_dense_keys() {
            let store = MemoryConfigStore::new();
            let settings = normalize_for_persistence(submission(
                &["", "mail.a.org", "mail.b.org"],
                &["5", "6", "7"],
            ));

            persist(&store, &settings).unwrap();

            let stored = read_raw(&store).unwrap();
            assert_eq!(stored.get("host0").map(String::as_str), Some("mail.a.org"));
            assert_eq!(stored.get("host1").map(String::as_str), Some("mail.b.org"));
            assert_eq!(stored.get("role0").map(String::as_str), Some("6"));
            assert_eq!(stored.get("role1").map(String::as_str), Some("7"));
            assert_eq!(stored.get("type").map(String::as_str), Some("imap"));
            assert_eq!(stored.get("port").map(String::as_str), Some("143"));
            assert!(!stored.contains_key("host2"));
        }

        #[test]
        fn test_persist_clears_orphans_from_longer_list() {
            let store = MemoryConfigStore::new();
            for i in 0..5 {
                store.set(NAMESPACE, &host_key(i), "old.example.org").unwrap();
                store.set(NAMESPACE, &role_key(i), "3").unwrap();
            }
            store.set(NAMESPACE, "host14", "beyond.example.org").unwrap();

            let settings = normalize_for_persistence(submission(&["mail.a.org"], &["5"]));
            persist(&store, &settings).unwrap();

            let stored = read_raw(&store).unwrap();
            let indexed: Vec<_> = stored
                .keys()
                .filter(|k| parse_indexed_key(k).is_some())
                .cloned()
                .collect();
            assert_eq!(indexed, vec!["host0", "role0"]);
        }

        #[test]
        fn test_persist_stores_sentinel_for_missing_role() {
            let store = MemoryConfigStore::new();
            let settings = normalize_for_persistence(submission(&["mail.a.org"], &[]));
            persist(&store, &settings).unwrap();
            assert_eq!(store.get(NAMESPACE, "role0").unwrap().as_deref(), Some(NO_ROLE));
        }

        #[test]
        fn test_persist_then_load_matches() {
            let store = MemoryConfigStore::new();
            let settings = normalize_for_persistence(FormSubmission {
                hosts: vec!["mail.a.org".to_string(), "mail.b.org".to_string()],
                roles: vec!["5".to_string(), "6".to_string()],
                protocol: Some("imaptls".to_string()),
                port: Some("143".to_string()),
                change_password_url: Some("https://id.example.org".to_string()),
            });

            persist(&store, &settings).unwrap();
            let loaded = load_settings(&store).unwrap();

            assert_eq!(loaded, settings);
        }

        #[test]
        fn test_other_namespaces_untouched() {
            let store = MemoryConfigStore::new();
            store.set("auth/other", "host0", "keep.example.org").unwrap();

            persist(&store, &AuthSettings::default()).unwrap();

            assert_eq!(
                store.get("auth/other", "host0").unwrap().as_deref(),
                Some("keep.example.org")
            );
        }
    }

    mod probe_timeout {
        use super::*;

        #[test]
        fn test_uses_param_when_provided() {
            assert_eq!(resolve_probe_timeout(Some(3)), Duration::from_secs(3));
        }

        #[test]
        fn test_param_takes_priority_over_env() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(PROBE_TIMEOUT_ENV_VAR, "60");
            }
            let result = resolve_probe_timeout(Some(5));
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(PROBE_TIMEOUT_ENV_VAR);
            }
            assert_eq!(result, Duration::from_secs(5));
        }

        #[test]
        fn test_uses_env_var_when_no_param() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(PROBE_TIMEOUT_ENV_VAR, "25");
            }
            let result = resolve_probe_timeout(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(PROBE_TIMEOUT_ENV_VAR);
            }
            assert_eq!(result, Duration::from_secs(25));
        }

        #[test]
        fn test_ignores_invalid_env_var() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(PROBE_TIMEOUT_ENV_VAR, "soon");
            }
            let result = resolve_probe_timeout(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(PROBE_TIMEOUT_ENV_VAR);
            }
            assert_eq!(result, Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS));
        }

        #[test]
        fn test_zero_timeout_falls_back_to_default() {
            let default = Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS);
            assert_eq!(resolve_probe_timeout(Some(0)), default);

            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(PROBE_TIMEOUT_ENV_VAR, "0");
            }
            let result = resolve_probe_timeout(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(PROBE_TIMEOUT_ENV_VAR);
            }
            assert_eq!(result, default);
        }
    }
}
