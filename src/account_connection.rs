//! Lazy, reusable connection to one account's inbox

use crate::account::Account;
use crate::error::{Error, Result};
use crate::session::{Connector, FetchedMessage, MailSession};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Connection lifecycle.
///
/// A connected session always has the account's inbox open, so a
/// session without a folder cannot be represented.
#[derive(Debug)]
pub enum ConnectionState<S> {
    Unconnected,
    Connected(S),
}

// Manual impl: deriving would require `S: Default`.
impl<S> Default for ConnectionState<S> {
    fn default() -> Self {
        Self::Unconnected
    }
}

/// Owns the session to one account's server and opens it on demand.
pub struct AccountConnection<C: Connector> {
    account: Account,
    connector: Arc<C>,
    state: ConnectionState<C::Session>,
    handshakes: usize,
}

impl<C: Connector> AccountConnection<C> {
    /// Create an unconnected handle. No network I/O happens here.
    #[must_use]
    pub const fn new(account: Account, connector: Arc<C>) -> Self {
        Self {
            account,
            connector,
            state: ConnectionState::Unconnected,
            handshakes: 0,
        }
    }

    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Number of successful connect + folder-open handshakes so far.
    #[must_use]
    pub const fn handshakes(&self) -> usize {
        self.handshakes
    }

    /// Fetch up to `max_count` of the most recent messages, newest first.
    ///
    /// Connects and opens the inbox read-only on first use; later calls
    /// reuse the open session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the handshake fails and
    /// [`Error::Fetch`] if reading the folder fails. Either way the
    /// connection is left unconnected and the next call starts over.
    pub async fn fetch_latest(&mut self, max_count: usize) -> Result<Vec<FetchedMessage>> {
        let label = self.account.label();

        let mut session = match std::mem::take(&mut self.state) {
            ConnectionState::Connected(session) => session,
            ConnectionState::Unconnected => {
                let session = establish(self.connector.as_ref(), &self.account)
                    .await
                    .map_err(|e| Error::connection(label.clone(), e))?;
                self.handshakes += 1;
                session
            }
        };

        match read_latest(&mut session, max_count).await {
            Ok(messages) => {
                debug!("Fetched {} message(s) from {}", messages.len(), label);
                self.state = ConnectionState::Connected(session);
                Ok(messages)
            }
            Err(e) => {
                warn!("Dropping connection to {} after failed fetch: {}", label, e);
                session.logout().await.ok();
                Err(Error::fetch(label, e))
            }
        }
    }

    /// Close the folder, then the session.
    ///
    /// A no-op when not connected. Both steps are attempted even if the
    /// first fails, and the connection is unconnected afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Close`] carrying the first release failure.
    pub async fn close(&mut self) -> Result<()> {
        let ConnectionState::Connected(mut session) = std::mem::take(&mut self.state) else {
            return Ok(());
        };

        info!("Closing connection to {}", self.account.host);
        let folder = session.close_folder().await;
        let logout = session.logout().await;

        folder
            .and(logout)
            .map_err(|e| Error::close(self.account.label(), e))
    }
}

/// Connect and open the account's inbox. A session whose folder cannot
/// be opened is logged out again.
async fn establish<C: Connector>(connector: &C, account: &Account) -> Result<C::Session> {
    let mut session = connector.connect(account).await?;

    if let Err(e) = session.open_folder(&account.inbox_name).await {
        session.logout().await.ok();
        return Err(e);
    }

    Ok(session)
}

/// Read the newest `max_count` messages, walking positions downwards
/// from the current folder size.
async fn read_latest<S: MailSession>(session: &mut S, max_count: usize) -> Result<Vec<FetchedMessage>> {
    let count = session.message_count().await?;

    let mut messages = Vec::with_capacity(max_count.min(usize::try_from(count).unwrap_or(usize::MAX)));
    let mut position = count;
    while position > 0 && messages.len() < max_count {
        messages.push(session.fetch_message(position).await?);
        position -= 1;
    }

    Ok(messages)
}
