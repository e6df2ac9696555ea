//! Transport seam between account connections and the mail protocol
//!
//! [`Connector`] opens authenticated sessions and [`MailSession`]
//! exposes the handful of mailbox operations the client needs. The
//! IMAP implementations live in [`crate::connection`]; tests plug in
//! counting doubles.

use crate::account::Account;
use crate::error::Result;
use async_trait::async_trait;

/// Opens authenticated sessions to an account's server.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: MailSession;

    /// Connect to `account.host:account.port` over TLS and log in.
    ///
    /// # Errors
    ///
    /// Fails if the host is unreachable, the TLS handshake fails or
    /// the credentials are rejected.
    async fn connect(&self, account: &Account) -> Result<Self::Session>;
}

/// An authenticated session with at most one open folder.
#[async_trait]
pub trait MailSession: Send {
    /// Open `name` read-only. Becomes the target of later calls.
    ///
    /// # Errors
    ///
    /// Fails if the folder does not exist or cannot be opened.
    async fn open_folder(&mut self, name: &str) -> Result<()>;

    /// Current number of messages in the open folder.
    ///
    /// # Errors
    ///
    /// Fails if the server cannot be reached.
    async fn message_count(&mut self) -> Result<u32>;

    /// Retrieve the message at 1-based `position` in the open folder.
    ///
    /// # Errors
    ///
    /// Fails if the message cannot be read.
    async fn fetch_message(&mut self, position: u32) -> Result<FetchedMessage>;

    /// Release the open folder.
    ///
    /// # Errors
    ///
    /// Fails if the server rejects the request.
    async fn close_folder(&mut self) -> Result<()>;

    /// End the session.
    ///
    /// # Errors
    ///
    /// Fails if the server rejects the request.
    async fn logout(&mut self) -> Result<()>;
}

/// One message retrieved from a remote folder.
///
/// Holds the complete RFC 5322 bytes as the server returned them.
/// Nothing is persisted; the value lives for one reload cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    position: u32,
    raw: Vec<u8>,
}

impl FetchedMessage {
    #[must_use]
    pub const fn new(position: u32, raw: Vec<u8>) -> Self {
        Self { position, raw }
    }

    /// 1-based sequence number in the folder at fetch time.
    #[must_use]
    pub const fn position(&self) -> u32 {
        self.position
    }

    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}
