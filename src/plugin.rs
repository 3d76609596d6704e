//! Authentication plugin facade.
//!
//! [`ImapPlusAuth`] is what the host identity system talks to. It owns the
//! reconciled settings and the [`HostChain`] built from them, and swaps both
//! atomically when settings are reloaded or saved.
//!
//! # Thread Safety
//!
//! The current state is an `Arc<PluginState>` behind an `RwLock`. A login
//! clones the `Arc` and releases the lock before contacting any host, so a
//! reload never changes the host list under a running scan.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{error, info};

use crate::auth::{AuthenticationAttempt, Credentials, HostChain, ProbeFactory};
use crate::config::{AuthSettings, load_settings, normalize_for_persistence, persist};
use crate::error::Result;
use crate::form::{FormSubmission, SettingsForm};
use crate::registry::RoleMap;
use crate::roles::{RoleAssigner, RoleResolver};
use crate::storage::ConfigStore;

struct PluginState {
    settings: AuthSettings,
    chain: HostChain,
}

/// IMAP authentication with per-host role assignment.
pub struct ImapPlusAuth {
    state: RwLock<Arc<PluginState>>,
    factory: Arc<dyn ProbeFactory>,
    resolver: RoleResolver,
    probe_timeout: Duration,
}

impl ImapPlusAuth {
    /// Load settings from `store` and build the host chain.
    ///
    /// A missing IMAP capability does not fail loading: it is logged and
    /// every login is then refused with
    /// [`AuthError::ProbeUnavailable`](crate::error::AuthError::ProbeUnavailable).
    pub fn load(
        store: &dyn ConfigStore,
        factory: Arc<dyn ProbeFactory>,
        assigner: Arc<dyn RoleAssigner>,
        probe_timeout: Duration,
    ) -> Result<Self> {
        let settings = load_settings(store)?;
        let state = build_state(settings, factory.as_ref(), probe_timeout);
        Ok(Self {
            state: RwLock::new(Arc::new(state)),
            factory,
            resolver: RoleResolver::new(assigner),
            probe_timeout,
        })
    }

    /// Re-read settings from `store`.
    pub fn reload(&self, store: &dyn ConfigStore) -> Result<()> {
        let settings = load_settings(store)?;
        self.install(settings);
        Ok(())
    }

    fn install(&self, settings: AuthSettings) {
        let state = build_state(settings, self.factory.as_ref(), self.probe_timeout);
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(state);
    }

    fn snapshot(&self) -> Arc<PluginState> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current reconciled settings.
    pub fn settings(&self) -> AuthSettings {
        self.snapshot().settings.clone()
    }

    /// Check a username and password against the configured hosts.
    ///
    /// The caller establishes the session on success and must pass the
    /// returned attempt to [`sync_roles`](Self::sync_roles). The attempt
    /// carries the role mapped to the matched host at login time, so a save
    /// in between cannot change which role is assigned.
    pub async fn user_login(&self, username: &str, password: &str) -> Result<AuthenticationAttempt> {
        let state = self.snapshot();
        let mut attempt = state
            .chain
            .login(&Credentials::new(username, password))
            .await?;
        attempt.role_id = attempt
            .matched_index
            .and_then(|index| state.settings.roles.get(index))
            .map(str::to_string);
        Ok(attempt)
    }

    /// Assign the role mapped to the host that authenticated `user_id`.
    ///
    /// Does nothing for unsuccessful attempts.
    pub async fn sync_roles(
        &self,
        attempt: &AuthenticationAttempt,
        user_id: &str,
    ) -> Result<Option<String>> {
        let Some(index) = attempt.matched_index.filter(|_| attempt.succeeded) else {
            return Ok(None);
        };
        let roles: RoleMap = attempt
            .role_id
            .iter()
            .map(|role_id| (index, role_id.clone()))
            .collect();
        self.resolver
            .resolve_and_assign(&roles, index, user_id)
            .await
    }

    /// Form data for the settings page.
    pub fn settings_form(&self) -> SettingsForm {
        SettingsForm::from_settings(&self.snapshot().settings)
    }

    /// Clean, save, and activate submitted settings.
    pub fn process_config(
        &self,
        store: &dyn ConfigStore,
        submission: FormSubmission,
    ) -> Result<AuthSettings> {
        let settings = normalize_for_persistence(submission);
        persist(store, &settings)?;
        info!(
            "IMAP settings saved: {} host(s), type={}, port={}",
            settings.registry.len(),
            settings.protocol,
            settings.port
        );
        self.install(settings.clone());
        Ok(settings)
    }

    /// Users can change their password only through an external page.
    pub fn can_change_password(&self) -> bool {
        !self.snapshot().settings.change_password_url.is_empty()
    }

    /// External password change page, or `None` for the host default.
    pub fn change_password_url(&self) -> Option<String> {
        let state = self.snapshot();
        let url = &state.settings.change_password_url;
        (!url.is_empty()).then(|| url.clone())
    }

    /// Local passwords are never stored for IMAP users.
    pub fn prevent_local_passwords(&self) -> bool {
        true
    }

    /// Credentials are checked by external servers.
    pub fn is_internal(&self) -> bool {
        false
    }
}

fn build_state(
    settings: AuthSettings,
    factory: &dyn ProbeFactory,
    probe_timeout: Duration,
) -> PluginState {
    let probe = match factory.build(settings.protocol) {
        Ok(probe) => Some(probe),
        Err(e) => {
            error!("Cannot use IMAP authentication: {}", e);
            None
        }
    };
    let chain =
        HostChain::new(settings.registry.clone(), probe).with_probe_timeout(probe_timeout);
    PluginState { settings, chain }
}
