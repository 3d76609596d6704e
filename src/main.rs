#![deny(warnings)]
#![deny(clippy::unwrap_used)]

//! `imap-auth-check`: try one login against a settings file.
//!
//! ```text
//! IMAP_AUTH_CONFIG=settings.json IMAP_AUTH_PASSWORD=secret imap-auth-check alice
//! ```
//!
//! The settings file is a flat JSON object using the stored key names
//! (`host0`, `role0`, `type`, `port`, `changepasswordurl`). Roles are only
//! reported, never assigned.

use std::process::ExitCode;
use std::sync::Arc;

use async_trait::async_trait;
use dotenv::dotenv;
use imap_plus_auth::auth::ImapProbeFactory;
use imap_plus_auth::config::resolve_probe_timeout;
use imap_plus_auth::roles::{RoleAssigner, RoleScope};
use imap_plus_auth::storage::{MemoryConfigStore, NAMESPACE};
use imap_plus_auth::{AuthError, ImapPlusAuth};
use tracing::{error, info};

const CONFIG_ENV_VAR: &str = "IMAP_AUTH_CONFIG";
const PASSWORD_ENV_VAR: &str = "IMAP_AUTH_PASSWORD";

/// Logs the role that would be assigned instead of assigning it.
struct DryRunAssigner;

#[async_trait]
impl RoleAssigner for DryRunAssigner {
    async fn assign_role(
        &self,
        role_id: &str,
        user_id: &str,
        scope: RoleScope,
    ) -> Result<(), String> {
        info!(
            "Would assign role {} to {} in {} scope",
            role_id, user_id, scope
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    // Initialize logging with proper tracing default
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().expect("valid directive")),
        )
        .init();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}

async fn run() -> Result<bool, AuthError> {
    let username = std::env::args().nth(1).ok_or_else(|| {
        AuthError::InvalidConfig("usage: imap-auth-check <username>".to_string())
    })?;
    let password = std::env::var(PASSWORD_ENV_VAR)
        .map_err(|_| AuthError::InvalidConfig(format!("{PASSWORD_ENV_VAR} is not set")))?;
    let config_path = std::env::var(CONFIG_ENV_VAR)
        .map_err(|_| AuthError::InvalidConfig(format!("{CONFIG_ENV_VAR} is not set")))?;

    let json = tokio::fs::read_to_string(&config_path)
        .await
        .map_err(|e| AuthError::Store(format!("Cannot read {config_path}: {e}")))?;
    let store = MemoryConfigStore::from_json(NAMESPACE, &json)?;

    let auth = ImapPlusAuth::load(
        &store,
        Arc::new(ImapProbeFactory),
        Arc::new(DryRunAssigner),
        resolve_probe_timeout(None),
    )?;
    let settings = auth.settings();
    info!(
        "Checking {} against {} host(s), type={}, port={}",
        username,
        settings.registry.len(),
        settings.protocol,
        settings.port
    );

    let attempt = auth.user_login(&username, &password).await?;
    if !attempt.succeeded {
        info!("Login rejected after {} host(s)", attempt.hosts_tried);
        return Ok(false);
    }

    let role = auth.sync_roles(&attempt, &username).await?;
    println!("{}", serde_json::to_string_pretty(&attempt)?);
    match role {
        Some(role) => info!("Matched host {:?}, role {}", attempt.matched_index, role),
        None => info!("Matched host {:?}, no role", attempt.matched_index),
    }
    Ok(true)
}
