//! IMAP LOGIN probe.
//!
//! Opens a connection for one host, logs in, and logs out again without
//! selecting a mailbox. The transport depends on the server type:
//!
//! | Type | Transport |
//! |------|-----------|
//! | `imap` | cleartext |
//! | `imapssl` | implicit TLS, certificate verified |
//! | `imapcert` | implicit TLS, any certificate |
//! | `imaptls` | cleartext upgraded with STARTTLS, certificate verified |
//!
//! Server errors are reported as [`ProbeError`] and never shown to users.

use std::fmt;
use std::sync::Arc;

use async_imap::Client;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::error::{ProbeError, Result};
use crate::registry::{ProtocolVariant, ServerEntry};

use super::tls::{insecure_connector, server_name, verifying_connector};
use super::traits::{ConnectionProbe, Credentials, ProbeFactory};

/// Probe that logs in with the IMAP `LOGIN` command.
pub struct ImapProbe {
    protocol: ProtocolVariant,
    connector: Option<TlsConnector>,
}

impl ImapProbe {
    /// Create a probe for one server type, setting up TLS if it needs it.
    pub fn new(protocol: ProtocolVariant) -> Result<Self> {
        let connector = match protocol {
            ProtocolVariant::Plain => None,
            ProtocolVariant::SslNoVerify => Some(insecure_connector()?),
            ProtocolVariant::Ssl | ProtocolVariant::Tls => Some(verifying_connector()?),
        };
        Ok(Self {
            protocol,
            connector,
        })
    }

    fn tls_connector(&self, target: &str) -> std::result::Result<&TlsConnector, ProbeError> {
        self.connector.as_ref().ok_or_else(|| ProbeError::Tls {
            target: target.to_string(),
            message: format!("probe was built for {} without TLS", self.protocol),
        })
    }

    async fn tls_handshake(
        &self,
        target: &str,
        address: &str,
        tcp: TcpStream,
    ) -> std::result::Result<tokio_rustls::client::TlsStream<TcpStream>, ProbeError> {
        let name = server_name(address).map_err(|message| ProbeError::Tls {
            target: target.to_string(),
            message,
        })?;
        self.tls_connector(target)?
            .connect(name, tcp)
            .await
            .map_err(|e| ProbeError::Tls {
                target: target.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl ConnectionProbe for ImapProbe {
    async fn probe(
        &self,
        entry: &ServerEntry,
        credentials: &Credentials,
    ) -> std::result::Result<bool, ProbeError> {
        let target = entry.target();
        if entry.protocol != self.protocol {
            return Err(ProbeError::Tls {
                target,
                message: format!("probe was built for {}", self.protocol),
            });
        }

        let tcp = TcpStream::connect((entry.address.as_str(), entry.port))
            .await
            .map_err(|e| ProbeError::Connect {
                target: target.clone(),
                message: e.to_string(),
            })?;

        match entry.protocol {
            ProtocolVariant::Plain => {
                let client = greet(Client::new(tcp), &target).await?;
                login(client, &target, credentials).await
            }
            ProtocolVariant::Ssl | ProtocolVariant::SslNoVerify => {
                let tls = self.tls_handshake(&target, &entry.address, tcp).await?;
                let client = greet(Client::new(tls), &target).await?;
                login(client, &target, credentials).await
            }
            ProtocolVariant::Tls => {
                let mut client = greet(Client::new(tcp), &target).await?;
                client
                    .run_command_and_check_ok("STARTTLS", None)
                    .await
                    .map_err(|e| ProbeError::Tls {
                        target: target.clone(),
                        message: format!("STARTTLS refused: {e}"),
                    })?;
                let tls = self
                    .tls_handshake(&target, &entry.address, client.into_inner())
                    .await?;
                login(Client::new(tls), &target, credentials).await
            }
        }
    }

    fn name(&self) -> &'static str {
        "imap"
    }
}

/// Read the server greeting.
async fn greet<T>(
    mut client: Client<T>,
    target: &str,
) -> std::result::Result<Client<T>, ProbeError>
where
    T: AsyncRead + AsyncWrite + Unpin + fmt::Debug + Send,
{
    client
        .read_response()
        .await
        .ok_or_else(|| ProbeError::Greeting {
            target: target.to_string(),
        })?
        .map_err(|e| ProbeError::Protocol {
            target: target.to_string(),
            message: e.to_string(),
        })?;
    Ok(client)
}

/// Log in and immediately log out again.
async fn login<T>(
    client: Client<T>,
    target: &str,
    credentials: &Credentials,
) -> std::result::Result<bool, ProbeError>
where
    T: AsyncRead + AsyncWrite + Unpin + fmt::Debug + Send,
{
    match client
        .login(&credentials.username, &credentials.password)
        .await
    {
        Ok(mut session) => {
            if let Err(e) = session.logout().await {
                debug!("LOGOUT from {} failed after successful login: {}", target, e);
            }
            Ok(true)
        }
        Err((async_imap::error::Error::No(_), _)) => Ok(false),
        Err((e, _)) => Err(ProbeError::Protocol {
            target: target.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Factory producing [`ImapProbe`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImapProbeFactory;

impl ProbeFactory for ImapProbeFactory {
    fn build(&self, protocol: ProtocolVariant) -> Result<Arc<dyn ConnectionProbe>> {
        Ok(Arc::new(ImapProbe::new(protocol)?))
    }
}
