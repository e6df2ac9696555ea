//! Multi-account IMAP inbox reader
//!
//! Reads the most recent messages from several IMAP accounts over
//! implicit TLS and renders them as plain text. Each account keeps one
//! lazily opened, read-only session that is reused across reloads.
//!
//! - [`AccountRegistry`] loads the accounts file.
//! - [`ConnectionManager`] fans a reload out over every account.
//! - [`extract`] turns fetched bytes into display fields, sanitizing
//!   HTML bodies with [`html_to_text`].
//!
//! Nothing is ever written to a mailbox.

mod account;
mod account_connection;
mod config;
mod connection;
mod error;
pub mod extract;
mod manager;
mod sanitize;
mod session;


pub use account::{ACCOUNTS_TEMPLATE, Account, AccountRegistry};
pub use account_connection::{AccountConnection, ConnectionState};
pub use config::{ClientConfig, DEFAULT_ACCOUNTS_PATH, DEFAULT_MAX_FETCH, Timeouts};
pub use connection::{ImapConnector, ImapSession, ImapStream, load_pem_certificates};
pub use error::{Error, ErrorKind, Result};
pub use extract::{ContentKind, MessageDetail, MessageSummary};
pub use manager::{
    AccountFailure, AccountMessages, ConnectionManager, FailurePolicy, FetchOutcome,
    ManagerOptions,
};
pub use sanitize::html_to_text;
pub use session::{Connector, FetchedMessage, MailSession};
