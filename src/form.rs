//! Settings form data.
//!
//! The host system renders the form; this module only decides what goes in
//! it and what shape the submitted data has.

use serde::{Deserialize, Serialize};

use crate::config::AuthSettings;
use crate::registry::{NO_ROLE, ProtocolVariant};

/// One editable host row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRow {
    pub host: String,
    pub role: String,
}

/// Everything needed to render the settings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsForm {
    pub protocol: ProtocolVariant,
    pub port: u16,
    pub change_password_url: String,
    /// One row per configured host, then one blank row for adding a host
    pub rows: Vec<FormRow>,
}

impl SettingsForm {
    pub fn from_settings(settings: &AuthSettings) -> Self {
        let mut rows: Vec<FormRow> = settings
            .registry
            .iter()
            .map(|entry| FormRow {
                host: entry.address.clone(),
                role: settings
                    .roles
                    .get(entry.index)
                    .unwrap_or(NO_ROLE)
                    .to_string(),
            })
            .collect();
        rows.push(FormRow {
            host: String::new(),
            role: NO_ROLE.to_string(),
        });

        Self {
            protocol: settings.protocol,
            port: settings.port,
            change_password_url: settings.change_password_url.clone(),
            rows,
        }
    }

    /// Choices for the server type field.
    pub fn protocol_options() -> [ProtocolVariant; 4] {
        [
            ProtocolVariant::Plain,
            ProtocolVariant::Ssl,
            ProtocolVariant::SslNoVerify,
            ProtocolVariant::Tls,
        ]
    }

    /// The submission produced by saving the form without edits.
    pub fn into_submission(self) -> FormSubmission {
        let (hosts, roles) = self.rows.into_iter().map(|row| (row.host, row.role)).unzip();
        FormSubmission {
            hosts,
            roles,
            protocol: Some(self.protocol.as_str().to_string()),
            port: Some(self.port.to_string()),
            change_password_url: Some(self.change_password_url),
        }
    }
}

/// Data posted back from the settings form.
///
/// `roles[i]` belongs to `hosts[i]`. Scalars left as `None` get defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSubmission {
    pub hosts: Vec<String>,
    pub roles: Vec<String>,
    #[serde(rename = "type")]
    pub protocol: Option<String>,
    pub port: Option<String>,
    #[serde(rename = "changepasswordurl")]
    pub change_password_url: Option<String>,
}
