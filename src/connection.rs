//! IMAP-over-TLS implementation of the transport seam
//!
//! Provides [`ImapConnector`], which performs the TCP connect, implicit
//! TLS handshake and LOGIN, and [`ImapSession`], which maps the
//! [`MailSession`] operations onto EXAMINE, NOOP, FETCH, CLOSE and
//! LOGOUT. Every network step is bounded by the configured timeouts.

use crate::account::Account;
use crate::config::{ClientConfig, Timeouts};
use crate::error::{Error, Result};
use crate::session::{Connector, FetchedMessage, MailSession};
use async_imap::Session;
use async_imap::types::UnsolicitedResponse;
use async_trait::async_trait;
use futures::StreamExt;
use rustls::RootCertStore;
use rustls::pki_types::{CertificateDer, ServerName};
use std::future::Future;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info};

/// The stream type underneath an IMAP session.
pub type ImapStream = Compat<tokio_rustls::client::TlsStream<TcpStream>>;

/// Run `fut`, failing with [`Error::Timeout`] once `limit` elapses.
async fn within<T: Send>(
    limit: Duration,
    fut: impl Future<Output = Result<T>> + Send,
) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Error::Timeout(limit))?
}

/// Build a TLS connector trusting the webpki roots plus `extra_roots`.
fn tls_connector(extra_roots: Vec<CertificateDer<'static>>) -> Result<TlsConnector> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    for cert in extra_roots {
        roots
            .add(cert)
            .map_err(|e| Error::Tls(format!("Invalid trust anchor: {e}")))?;
    }

    let config = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| Error::Tls(e.to_string()))?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Read every certificate from a PEM file.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be read or holds no
/// certificate.
pub fn load_pem_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::Config(format!("Cannot open {}: {e}", path.display())))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Config(format!("Cannot parse {}: {e}", path.display())))?;

    if certs.is_empty() {
        return Err(Error::Config(format!(
            "No certificate found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

/// Opens implicit-TLS IMAP sessions.
#[derive(Clone)]
pub struct ImapConnector {
    tls: TlsConnector,
    timeouts: Timeouts,
}

impl ImapConnector {
    /// Connector trusting the standard web PKI roots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tls`] if the TLS configuration cannot be built.
    pub fn new(timeouts: Timeouts) -> Result<Self> {
        Self::with_extra_roots(timeouts, Vec::new())
    }

    /// Connector that additionally trusts `extra_roots`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tls`] if a certificate is not a usable trust
    /// anchor.
    pub fn with_extra_roots(
        timeouts: Timeouts,
        extra_roots: Vec<CertificateDer<'static>>,
    ) -> Result<Self> {
        Ok(Self {
            tls: tls_connector(extra_roots)?,
            timeouts,
        })
    }

    /// Connector set up from the client configuration, including the
    /// optional extra CA file.
    ///
    /// # Errors
    ///
    /// Returns an error if the CA file is unreadable or invalid.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let extra = match &config.ca_file {
            Some(path) => load_pem_certificates(path)?,
            None => Vec::new(),
        };
        Self::with_extra_roots(config.timeouts, extra)
    }

    async fn handshake(&self, account: &Account) -> Result<Session<ImapStream>> {
        let addr = format!("{}:{}", account.host, account.port);
        debug!("Connecting to IMAP server at {}", addr);

        let tcp_stream = TcpStream::connect(&addr).await?;

        let server_name = ServerName::try_from(account.host.clone())
            .map_err(|e| Error::Tls(format!("Invalid server name: {e}")))?;
        let tls_stream = self
            .tls
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| Error::Tls(e.to_string()))?;

        let client = async_imap::Client::new(tls_stream.compat());
        let session = client
            .login(&account.user, &account.password)
            .await
            .map_err(|(e, _)| Error::Imap(format!("Login failed: {e}")))?;

        info!("Connected to IMAP server {}", addr);
        Ok(session)
    }
}

#[async_trait]
impl Connector for ImapConnector {
    type Session = ImapSession;

    async fn connect(&self, account: &Account) -> Result<ImapSession> {
        let session = within(self.timeouts.connect, self.handshake(account)).await?;
        Ok(ImapSession {
            session,
            io_timeout: self.timeouts.io,
            folder: None,
            exists: 0,
        })
    }
}

/// An authenticated IMAP session.
pub struct ImapSession {
    session: Session<ImapStream>,
    io_timeout: Duration,
    folder: Option<String>,
    /// Last known EXISTS count for the open folder.
    exists: u32,
}

impl ImapSession {
    /// Apply queued EXISTS/EXPUNGE announcements to the cached count.
    fn drain_unsolicited_responses(&mut self) {
        while let Ok(response) = self.session.unsolicited_responses.try_recv() {
            match response {
                UnsolicitedResponse::Exists(count) => self.exists = count,
                UnsolicitedResponse::Expunge(_) => self.exists = self.exists.saturating_sub(1),
                _ => {}
            }
        }
    }
}

#[async_trait]
impl MailSession for ImapSession {
    async fn open_folder(&mut self, name: &str) -> Result<()> {
        let limit = self.io_timeout;
        let mailbox = within(limit, async {
            self.session
                .examine(name)
                .await
                .map_err(|e| Error::Imap(format!("Failed to open {name}: {e}")))
        })
        .await?;

        // Anything queued before EXAMINE refers to an older state.
        while self.session.unsolicited_responses.try_recv().is_ok() {}

        debug!("Opened {} read-only ({} messages)", name, mailbox.exists);
        self.exists = mailbox.exists;
        self.folder = Some(name.to_string());
        Ok(())
    }

    async fn message_count(&mut self) -> Result<u32> {
        let limit = self.io_timeout;
        within(limit, async {
            self.session
                .noop()
                .await
                .map_err(|e| Error::Imap(format!("NOOP failed: {e}")))
        })
        .await?;

        self.drain_unsolicited_responses();
        Ok(self.exists)
    }

    async fn fetch_message(&mut self, position: u32) -> Result<FetchedMessage> {
        let limit = self.io_timeout;
        let raw = within(limit, async {
            let mut messages = self
                .session
                .fetch(position.to_string(), "(BODY.PEEK[])")
                .await
                .map_err(|e| Error::Imap(format!("Fetch failed: {e}")))?;

            // Drain the whole response so the next command starts clean.
            let mut raw = None;
            while let Some(item) = messages.next().await {
                let fetch = item.map_err(|e| Error::Imap(format!("Fetch error: {e}")))?;
                if fetch.message == position
                    && let Some(body) = fetch.body()
                {
                    raw = Some(body.to_vec());
                }
            }

            raw.ok_or_else(|| Error::Imap(format!("No body found for message {position}")))
        })
        .await?;

        Ok(FetchedMessage::new(position, raw))
    }

    async fn close_folder(&mut self) -> Result<()> {
        let limit = self.io_timeout;
        let folder = self.folder.take().unwrap_or_default();
        within(limit, async {
            self.session
                .close()
                .await
                .map_err(|e| Error::Imap(format!("Failed to close {folder}: {e}")))
        })
        .await?;
        self.exists = 0;
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        let limit = self.io_timeout;
        within(limit, async {
            self.session
                .logout()
                .await
                .map_err(|e| Error::Imap(format!("Logout failed: {e}")))
        })
        .await
    }
}
