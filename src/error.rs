//! Error types for mmclient

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IMAP error: {0}")]
    Imap(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection to {account} failed: {source}")]
    Connection {
        account: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Fetching from {account} failed: {source}")]
    Fetch {
        account: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Closing {account} failed: {source}")]
    Close {
        account: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Content error: {0}")]
    Content(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Host unreachable, TLS failure, rejected login or folder-open failure.
    Connection,
    /// Reading folder state or a message failed on an open connection.
    Fetch,
    /// Releasing the folder or session failed.
    Close,
    /// Malformed MIME structure or markup.
    Content,
    /// Malformed or missing configuration.
    Configuration,
}

impl Error {
    /// Which category this error belongs to.
    ///
    /// Bare transport errors (not yet wrapped with account context)
    /// count as connection failures.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Imap(_) | Self::Tls(_) | Self::Io(_) | Self::Timeout(_) | Self::Connection { .. } => {
                ErrorKind::Connection
            }
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Close { .. } => ErrorKind::Close,
            Self::Content(_) => ErrorKind::Content,
            Self::Config(_) => ErrorKind::Configuration,
        }
    }

    pub(crate) fn connection(account: impl Into<String>, source: Self) -> Self {
        Self::Connection {
            account: account.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn fetch(account: impl Into<String>, source: Self) -> Self {
        Self::Fetch {
            account: account.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn close(account: impl Into<String>, source: Self) -> Self {
        Self::Close {
            account: account.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
